//! # Specs Over Data
//!
//! Operations that read array shapes or slice arrays. They all start by
//! conforming the spec to the data, so the spec and the data line up leaf
//! for leaf.

use std::collections::BTreeMap;

use tracing::trace;

use crate::array::Array;
use crate::error::SpecError;
use crate::key::display_path;
use crate::spec::Spec;
use crate::tree::Tree;

impl Spec {
    /// Extent of `dim` in `data`, read from the first leaf that carries it.
    pub fn size<A: Array>(&self, data: &Tree<A>, dim: &str) -> Result<usize, SpecError> {
        self.require(dim)?;
        let indices = self.conform(data)?.index_for(dim);
        for (visit, axis) in data.leaves().zip(indices.leaf_values()) {
            let (Some(value), Some(axis)) = (visit.node.as_leaf(), axis) else {
                continue;
            };
            let shape = value.shape();
            return shape.get(*axis).copied().ok_or_else(|| SpecError::RankTooSmall {
                path: display_path(&visit.path),
                rank: shape.len(),
                dimension: dim.to_string(),
                axis: *axis,
            });
        }
        Err(SpecError::DimensionNotInData {
            dimension: dim.to_string(),
        })
    }

    /// Size of every dimension that some data leaf carries.
    pub fn sizes<A: Array>(&self, data: &Tree<A>) -> Result<BTreeMap<String, usize>, SpecError> {
        let mut sizes = BTreeMap::new();
        for dim in self.dimensions() {
            match self.size(data, &dim) {
                Ok(size) => {
                    sizes.insert(dim, size);
                }
                Err(SpecError::DimensionNotInData { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(sizes)
    }

    /// Select `index` along `dim` in every leaf that carries it. Other
    /// leaves pass through unchanged.
    pub fn index_data<A: Array>(&self, data: &Tree<A>, index: usize, dim: &str) -> Result<Tree<A>, SpecError> {
        self.require(dim)?;
        let indices = self.conform(data)?.index_for(dim);
        trace!(dimension = dim, index, "indexing data");
        data.traverse_zip(
            &[&indices],
            |_, _| false,
            |node, others| match (node, others[0]) {
                (Tree::Leaf(value), Tree::Leaf(Some(axis))) => Ok(Tree::Leaf(value.index_axis(*axis, index)?)),
                (node, _) => Ok(node),
            },
        )
    }

    /// Slice `data` at `index` along `dim`, returning the slice and the
    /// spec that describes it.
    pub fn select<A: Array>(&self, data: &Tree<A>, dim: &str, index: usize) -> Result<(Tree<A>, Spec), SpecError> {
        let sliced = self.index_data(data, index, dim)?;
        Ok((sliced, self.remove_dimension(dim)))
    }

    fn require(&self, dim: &str) -> Result<(), SpecError> {
        if self.has_dimension(dim) {
            Ok(())
        } else {
            Err(SpecError::DimensionAbsent {
                dimension: dim.to_string(),
                spec: self.to_string(),
            })
        }
    }
}
