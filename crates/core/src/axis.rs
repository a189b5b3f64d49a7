//! # Axes and Arguments
//!
//! An [`Axis`] refers to a dimension by name where a function expects an
//! integer axis. It stays symbolic while a pipeline is being composed and is
//! resolved ("concretized") against a spec right before the function runs.
//! Because the same dimension may sit at different positions in different
//! leaves, an axis concretizes to a whole tree of indices.
//!
//! An `Axis` also says what happens to its dimension in the function's
//! output: it is removed (the default), kept, or replaced by a list of new
//! dimensions spliced in at its position.
//!
//! [`Args`] carries the extra arguments of a function: positional and named
//! entries, each a tree of [`Param`]s.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dims::Dims;
use crate::error::SpecError;
use crate::spec::Spec;
use crate::tree::Tree;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Axis {
    pub dimension: String,
    /// The dimension survives the function unchanged.
    pub keep: bool,
    /// Dimensions spliced in place of this one. Takes precedence over `keep`.
    pub becomes: Vec<String>,
}

impl Axis {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            keep: false,
            becomes: Vec::new(),
        }
    }

    pub fn keeping(mut self) -> Self {
        self.keep = true;
        self
    }

    pub fn becoming<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.becomes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Dimensions of one output leaf, given the dimensions of the input.
    pub fn new_dimensions(&self, dims: &Dims) -> Dims {
        if !self.becomes.is_empty() {
            dims.spliced(&self.dimension, &self.becomes)
        } else if self.keep {
            dims.clone()
        } else {
            dims.without(&self.dimension)
        }
    }

    /// Apply [`new_dimensions`](Self::new_dimensions) to every leaf.
    pub fn apply_to(&self, spec: &Spec) -> Spec {
        spec.update_leaves(|dims| self.new_dimensions(dims))
    }

    /// Index tree of this axis' dimension in `spec`.
    pub fn concretize(&self, spec: &Spec) -> Result<Tree<Param>, SpecError> {
        if !spec.has_dimension(&self.dimension) {
            return Err(SpecError::AxisConcretization {
                dimension: self.dimension.clone(),
                spec: spec.to_string(),
            });
        }
        Ok(spec.index_for(&self.dimension).map_leaves(|index| Param::Index(*index)))
    }
}

/// One extra-argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Param {
    /// A symbolic axis, before concretization.
    Axis(Axis),
    /// A resolved axis index; `None` where the dimension does not occur.
    Index(Option<usize>),
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl From<Axis> for Param {
    fn from(axis: Axis) -> Self {
        Param::Axis(axis)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Float(value)
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Str(value.to_string())
    }
}

/// Extra arguments: positional entries then named entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<Tree<Param>>,
    named: IndexMap<String, Tree<Param>>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional value.
    pub fn with(self, value: impl Into<Param>) -> Self {
        self.with_tree(Tree::Leaf(value.into()))
    }

    pub fn with_tree(mut self, tree: Tree<Param>) -> Self {
        self.positional.push(tree);
        self
    }

    pub fn named(self, name: impl Into<String>, value: impl Into<Param>) -> Self {
        self.named_tree(name, Tree::Leaf(value.into()))
    }

    pub fn named_tree(mut self, name: impl Into<String>, tree: Tree<Param>) -> Self {
        self.named.insert(name.into(), tree);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Tree<Param>> {
        self.positional.get(position)
    }

    pub fn get_named(&self, name: &str) -> Option<&Tree<Param>> {
        self.named.get(name)
    }

    pub fn positional(&self) -> &[Tree<Param>] {
        &self.positional
    }

    /// A resolved axis that is the same in every leaf, as a plain index.
    pub fn index(&self, position: usize) -> Option<usize> {
        self.get(position).and_then(single_index)
    }

    pub fn index_named(&self, name: &str) -> Option<usize> {
        self.get_named(name).and_then(single_index)
    }

    /// A resolved axis as a tree of per-leaf indices.
    pub fn index_tree(&self, position: usize) -> Option<Tree<Option<usize>>> {
        self.get(position).map(|tree| {
            tree.map_leaves(|param| match param {
                Param::Index(index) => *index,
                _ => None,
            })
        })
    }

    pub fn float(&self, position: usize) -> Option<f64> {
        match self.get(position)?.as_leaf()? {
            Param::Float(value) => Some(*value),
            Param::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn int(&self, position: usize) -> Option<i64> {
        match self.get(position)?.as_leaf()? {
            Param::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Every symbolic axis, positional first.
    pub fn axes(&self) -> Vec<&Axis> {
        self.trees()
            .flat_map(|tree| tree.leaf_values())
            .filter_map(|param| match param {
                Param::Axis(axis) => Some(axis),
                _ => None,
            })
            .collect()
    }

    pub fn has_axes(&self) -> bool {
        !self.axes().is_empty()
    }

    /// Apply the output rule of every axis to `spec`, in order.
    pub fn apply_axes(&self, spec: &Spec) -> Spec {
        self.axes().into_iter().fold(spec.clone(), |acc, axis| axis.apply_to(&acc))
    }

    fn trees(&self) -> impl Iterator<Item = &Tree<Param>> {
        self.positional.iter().chain(self.named.values())
    }
}

fn single_index(tree: &Tree<Param>) -> Option<usize> {
    let mut found = None;
    for param in tree.leaf_values() {
        match (param, found) {
            (Param::Index(Some(index)), None) => found = Some(*index),
            (Param::Index(Some(index)), Some(seen)) if *index == seen => {}
            (Param::Index(None), _) => {}
            _ => return None,
        }
    }
    found
}

/// Replace every symbolic [`Axis`] in `args` by its index tree in `spec`.
pub fn concretize_axes(spec: &Spec, args: &Args) -> Result<Args, SpecError> {
    let concretize = |tree: &Tree<Param>| {
        tree.traverse(
            |_| false,
            |node| match node {
                Tree::Leaf(Param::Axis(axis)) => axis.concretize(spec),
                other => Ok(other),
            },
        )
    };
    let positional = args.positional.iter().map(&concretize).collect::<Result<Vec<_>, SpecError>>()?;
    let mut named = IndexMap::new();
    for (name, tree) in &args.named {
        named.insert(name.clone(), concretize(tree)?);
    }
    Ok(Args { positional, named })
}
