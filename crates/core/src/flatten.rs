//! # Flatten, Unflatten and Merge
//!
//! `flatten` splits a tree into an ordered list of leaves and an
//! [`Unflatten`] that puts a same-length list back into the original
//! structure. What counts as a leaf is up to the caller: by default it is
//! anything not decomposable, but a predicate can stop early and treat whole
//! subtrees as leaves.
//!
//! `merge` lines several congruent trees up leaf by leaf.

use crate::error::TreeError;
use crate::key::{display_path, Path};
use crate::tree::{treedef, Tree};

/// Rebuilds a tree from the leaves produced by [`flatten`].
#[derive(Debug, Clone)]
pub struct Unflatten<T> {
    template: Tree<T>,
    paths: Vec<Path>,
}

impl<T: Clone> Unflatten<T> {
    /// Number of leaves expected.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths of the flattened leaves, in order.
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn unflatten(&self, leaves: Vec<Tree<T>>) -> Result<Tree<T>, TreeError> {
        if leaves.len() != self.paths.len() {
            return Err(TreeError::LeafCount {
                expected: self.paths.len(),
                got: leaves.len(),
            });
        }
        let mut leaves = leaves.into_iter();
        let mut cursor = 0;
        let mut path = Vec::new();
        self.fill(&self.template, &mut path, &mut cursor, &mut leaves)
    }

    /// Unflatten plain values (each becomes a `Tree::Leaf`).
    pub fn unflatten_values(&self, values: Vec<T>) -> Result<Tree<T>, TreeError> {
        self.unflatten(values.into_iter().map(Tree::Leaf).collect())
    }

    fn fill(
        &self,
        node: &Tree<T>,
        path: &mut Path,
        cursor: &mut usize,
        leaves: &mut impl Iterator<Item = Tree<T>>,
    ) -> Result<Tree<T>, TreeError> {
        if self.paths.get(*cursor).map(Vec::as_slice) == Some(path.as_slice()) {
            *cursor += 1;
            return leaves.next().ok_or(TreeError::LeafCount {
                expected: self.paths.len(),
                got: *cursor - 1,
            });
        }
        let Ok(def) = treedef(node) else {
            return Ok(node.clone());
        };
        let mut keys = Vec::new();
        let mut children = Vec::new();
        for (key, child) in def.children() {
            path.push(key.clone());
            children.push(self.fill(child, path, cursor, leaves)?);
            path.pop();
            keys.push(key);
        }
        def.create(keys, children)
    }
}

/// Split `tree` into leaves and a way back. `is_leaf` may stop early.
pub fn flatten<T: Clone>(
    tree: &Tree<T>,
    is_leaf: impl Fn(&Tree<T>) -> bool,
) -> (Vec<Tree<T>>, Unflatten<T>) {
    let mut leaves = Vec::new();
    let mut paths = Vec::new();
    for visit in tree.traverse_iter(is_leaf).filter(|v| v.is_leaf) {
        leaves.push(visit.node.clone());
        paths.push(visit.path);
    }
    (
        leaves,
        Unflatten {
            template: tree.clone(),
            paths,
        },
    )
}

/// Flatten down to plain leaf values.
pub fn flatten_values<T: Clone>(tree: &Tree<T>) -> (Vec<T>, Unflatten<T>) {
    let (leaves, unflatten) = flatten(tree, |_| false);
    let values = leaves.into_iter().filter_map(Tree::into_leaf).collect();
    (values, unflatten)
}

fn columns<T: Clone>(trees: &[Tree<T>]) -> Result<(Vec<Vec<T>>, Unflatten<T>), TreeError> {
    let Some(main) = trees.first() else {
        return Err(TreeError::EmptyMerge);
    };
    let (main_values, unflatten) = flatten_values(main);
    let mut columns: Vec<Vec<T>> = main_values.into_iter().map(|v| vec![v]).collect();
    for other in &trees[1..] {
        let (values, other_unflatten) = flatten_values(other);
        if let Some((expected, got)) = unflatten
            .paths()
            .iter()
            .zip(other_unflatten.paths())
            .find(|(a, b)| a != b)
        {
            return Err(TreeError::Incongruent {
                path: display_path(expected),
                reason: format!("other tree has a leaf at {} instead", display_path(got)),
            });
        }
        if values.len() != columns.len() {
            return Err(TreeError::LeafCount {
                expected: columns.len(),
                got: values.len(),
            });
        }
        for (column, value) in columns.iter_mut().zip(values) {
            column.push(value);
        }
    }
    Ok((columns, unflatten))
}

/// Merge congruent trees by collecting matching leaves into a `Vec`.
///
/// The result follows the structure of the first tree.
pub fn merge<T: Clone>(trees: &[Tree<T>]) -> Result<Tree<Vec<T>>, TreeError> {
    let (columns, _) = columns(trees)?;
    let mut columns = columns.into_iter();
    Ok(trees[0].map_leaves(|_| columns.next().unwrap_or_default()))
}

/// Merge congruent trees, combining matching leaves with `by`.
///
/// Unlike [`merge`], the leaf type is unchanged, so custom nodes of the
/// first tree are preserved.
pub fn merge_by<T, E>(trees: &[Tree<T>], mut by: impl FnMut(Vec<T>) -> Result<T, E>) -> Result<Tree<T>, E>
where
    T: Clone,
    E: From<TreeError>,
{
    let (columns, unflatten) = columns(trees)?;
    let merged = columns.into_iter().map(&mut by).collect::<Result<Vec<T>, E>>()?;
    Ok(unflatten.unflatten_values(merged)?)
}
