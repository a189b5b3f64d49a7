//! # Error Types
//!
//! Every failure in the tree and spec layers is a value. Trees fail when a
//! path does not exist or when two trees that should line up do not. Specs
//! fail when they name a dimension that is not there, or when they cannot be
//! laid over a piece of data.
//!
//! Paths are stored pre-rendered (see [`display_path`](crate::key::display_path))
//! so every error stays `Clone + PartialEq` and cheap to compare in tests.

use thiserror::Error;

use crate::key::Key;

/// Errors raised by tree operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    /// The value is a leaf; no decomposition strategy applies to it.
    #[error("Value of kind `{kind}` is not decomposable into a tree node")]
    NotDecomposable { kind: String },

    /// A path step named a child that does not exist.
    #[error("Key `{key}` not found at {path}")]
    KeyNotFound { key: Key, path: String },

    /// A key of the wrong flavour for the node (a name on a sequence, or an
    /// index past the end).
    #[error("Key `{key}` is not valid for a {node} node")]
    InvalidKey { key: Key, node: String },

    /// The root itself cannot be removed.
    #[error("Cannot remove the root of a tree")]
    EmptyPath,

    /// Trees traversed together do not branch the same way.
    #[error("Trees are not congruent at {path}: {reason}")]
    Incongruent { path: String, reason: String },

    /// An unflatten or merge received the wrong number of leaves.
    #[error("Expected {expected} leaves, got {got}")]
    LeafCount { expected: usize, got: usize },

    /// `merge` was given no trees at all.
    #[error("Cannot merge an empty list of trees")]
    EmptyMerge,

    /// A custom node refused to rebuild itself from the given children.
    #[error("Could not rebuild `{node}`: {reason}")]
    Rebuild { node: String, reason: String },
}

/// Errors raised by an [`Array`](crate::array::Array) backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ArrayError {
    #[error("Axis {axis} out of range for array of rank {rank}")]
    AxisOutOfRange { axis: usize, rank: usize },

    #[error("Index {index} out of range for axis {axis} of length {len}")]
    IndexOutOfRange { index: usize, axis: usize, len: usize },

    #[error("Cannot stack an empty list of arrays")]
    EmptyStack,

    #[error("Cannot stack arrays of shapes {first:?} and {other:?}")]
    StackShapeMismatch { first: Vec<usize>, other: Vec<usize> },

    #[error("Data length {len} does not match shape {shape:?}")]
    DataLength { len: usize, shape: Vec<usize> },

    #[error("Shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },
}

/// Errors raised by the [`Spec`](crate::spec::Spec) algebra.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpecError {
    /// An operation referenced a dimension the spec does not have.
    #[error("Dimension `{dimension}` is not present in {spec}")]
    DimensionAbsent { dimension: String, spec: String },

    /// The spec names the dimension but no data leaf carries it.
    #[error("Dimension `{dimension}` is named by the spec but no data leaf carries it")]
    DimensionNotInData { dimension: String },

    /// The location is a branch, not a dimension list.
    #[error("Location {path} of {spec} is not a dimension list")]
    NotADimsLeaf { path: String, spec: String },

    /// The spec describes more structure than the data has.
    #[error("Spec cannot be conformed to data at {path}: {reason}")]
    Conform { path: String, reason: String },

    /// An `Axis` referenced a dimension that is not in the spec it was
    /// resolved against.
    #[error("Cannot concretize Axis(\"{dimension}\"): dimension not present in {spec}")]
    AxisConcretization { dimension: String, spec: String },

    /// A dimension maps to an axis the data leaf does not have.
    #[error("Leaf at {path} has rank {rank}, but dimension `{dimension}` maps to axis {axis}")]
    RankTooSmall {
        path: String,
        rank: usize,
        dimension: String,
        axis: usize,
    },

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Array(#[from] ArrayError),
}

/// Errors raised when data does not match the spec describing it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Spec refers to {path}, which is missing from the data")]
    MissingPath { path: String },

    #[error("Leaf at {path} has {rank} axes but the spec names dimensions {dims:?}")]
    TooFewAxes {
        path: String,
        rank: usize,
        dims: Vec<String>,
    },

    #[error(
        "Dimension `{dimension}` has size {first} at {first_path} but size {other} at {other_path}"
    )]
    InconsistentSize {
        dimension: String,
        first: usize,
        first_path: String,
        other: usize,
        other_path: String,
    },

    #[error(transparent)]
    Spec(#[from] SpecError),
}
