//! # Array Backend Boundary
//!
//! The spec layer never does arithmetic. All it needs from a numeric array
//! is its shape, a way to pick one index along an axis, and a way to stack
//! arrays along a new leading axis. Any backend that provides these three
//! operations can flow through specs and transformations.
//!
//! [`Tensor`](crate::tensor::Tensor) is the reference backend.

use std::fmt;

use crate::error::ArrayError;

/// A dense, n-dimensional array.
pub trait Array: Clone + fmt::Debug + Send + Sync + 'static {
    fn shape(&self) -> Vec<usize>;

    fn rank(&self) -> usize {
        self.shape().len()
    }

    /// The sub-array at `index` along `axis`; the result has one axis fewer.
    fn index_axis(&self, axis: usize, index: usize) -> Result<Self, ArrayError>;

    /// Stack equally-shaped arrays along a new leading axis.
    fn stack(items: &[Self]) -> Result<Self, ArrayError>;
}

/// Element-wise arithmetic, used by the built-in sum and product
/// reductions.
pub trait Elementwise: Array {
    fn add(&self, other: &Self) -> Result<Self, ArrayError>;

    fn mul(&self, other: &Self) -> Result<Self, ArrayError>;
}
