//! # dimflow core - Trees, Specs and Axes
//!
//! This crate provides the data-description layer that transformations are
//! built on:
//!
//! - **Trees**: nested data with pluggable branch kinds, path access,
//!   traversal, flatten/unflatten and merge
//! - **Lenses**: functional, path-addressed views for rebuilding trees
//! - **Specs**: trees of named dimensions mirroring data, with an algebra
//!   for adding, removing and replacing dimensions
//! - **Axes**: symbolic dimension references resolved against a spec
//! - **Arrays**: the minimal backend boundary, plus a reference tensor
//! - **Validation**: checking data against the spec that describes it
//!
//! ## Design Philosophy
//!
//! Data carries its meaning in its structure. A function written for one
//! element should not need to know how many batch, time or receiver
//! dimensions surround it; the spec says where those dimensions are, and the
//! transformation layer uses that to lift the function.

pub mod array;
pub mod axis;
pub mod data;
pub mod dims;
pub mod error;
pub mod flatten;
pub mod iter;
pub mod key;
pub mod lens;
pub mod ops;
pub mod spec;
pub mod tensor;
pub mod tree;
pub mod validate;

// Re-export key types at crate root for convenience
pub use array::{Array, Elementwise};
pub use axis::{concretize_axes, Args, Axis, Param};
pub use dims::Dims;
pub use error::{ArrayError, SpecError, TreeError, ValidationError};
pub use flatten::{flatten, flatten_values, merge, merge_by, Unflatten};
pub use iter::{TraverseIter, Visit};
pub use key::{display_path, Key, Path};
pub use lens::TreeLens;
pub use spec::{Spec, SpecLeaf};
pub use tensor::Tensor;
pub use tree::{is_tree_like, treedef, Tree, TreeDef, TreeNode};
pub use validate::validate;
