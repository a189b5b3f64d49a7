//! # Vectorization Strategies
//!
//! `ForAll` reduces every call to "run `f` once per index along an axis, then
//! stack the results". How those calls are scheduled is a [`Vmap`] strategy:
//!
//! ```text
//!    args ──┬── slice 0 ──── f ────┐
//!           ├── slice 1 ──── f ────┼──── stack ──── result
//!           └── slice n-1 ── f ────┘
//! ```
//!
//! [`SequentialVmap`] is a plain loop. With the `parallel` feature,
//! [`ParallelVmap`] runs the slices on the rayon pool; results are stacked
//! in index order either way.

use std::fmt;

use dimflow_core::{Array, ArrayError, TreeError};
use tracing::trace;

use crate::error::{BoxError, TransformError};

/// `f` receives one slice of every mapped argument and returns the flat list
/// of output leaves.
pub type SliceFn<'a, A> = dyn Fn(Vec<A>) -> Result<Vec<A>, BoxError> + Send + Sync + 'a;

pub trait Vmap<A: Array>: fmt::Debug + Send + Sync {
    /// Call `f` for every index along `in_axes` and stack each output along a
    /// new leading axis.
    fn vmap(&self, dimension: &str, f: &SliceFn<'_, A>, args: Vec<A>, in_axes: &[usize]) -> Result<Vec<A>, BoxError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialVmap;

impl<A: Array> Vmap<A> for SequentialVmap {
    fn vmap(&self, dimension: &str, f: &SliceFn<'_, A>, args: Vec<A>, in_axes: &[usize]) -> Result<Vec<A>, BoxError> {
        let size = axis_size(dimension, &args, in_axes)?;
        trace!(dimension, size, mapped = args.len(), "sequential vmap");
        let results = (0..size)
            .map(|index| f(slice_args(&args, in_axes, index)?))
            .collect::<Result<Vec<_>, BoxError>>()?;
        stack_results(results)
    }
}

#[cfg(feature = "parallel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelVmap;

#[cfg(feature = "parallel")]
impl<A: Array> Vmap<A> for ParallelVmap {
    fn vmap(&self, dimension: &str, f: &SliceFn<'_, A>, args: Vec<A>, in_axes: &[usize]) -> Result<Vec<A>, BoxError> {
        use rayon::prelude::*;

        let size = axis_size(dimension, &args, in_axes)?;
        trace!(dimension, size, mapped = args.len(), "parallel vmap");
        let results = (0..size)
            .into_par_iter()
            .map(|index| f(slice_args(&args, in_axes, index)?))
            .collect::<Result<Vec<_>, BoxError>>()?;
        stack_results(results)
    }
}

/// The common extent of every argument along its mapped axis.
pub fn axis_size<A: Array>(dimension: &str, args: &[A], in_axes: &[usize]) -> Result<usize, BoxError> {
    if args.is_empty() {
        return Err(TransformError::NothingToMap {
            dimension: dimension.to_string(),
        }
        .into());
    }
    let sizes = args
        .iter()
        .zip(in_axes)
        .map(|(arg, &axis)| {
            let shape = arg.shape();
            shape.get(axis).copied().ok_or(ArrayError::AxisOutOfRange {
                axis,
                rank: shape.len(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let Some(&size) = sizes.first() else {
        return Err(TransformError::NothingToMap {
            dimension: dimension.to_string(),
        }
        .into());
    };
    if sizes.iter().any(|&s| s != size) {
        return Err(TransformError::InconsistentSizes {
            dimension: dimension.to_string(),
            sizes,
        }
        .into());
    }
    if size == 0 {
        return Err(TransformError::EmptyDimension {
            dimension: dimension.to_string(),
        }
        .into());
    }
    Ok(size)
}

pub fn slice_args<A: Array>(args: &[A], in_axes: &[usize], index: usize) -> Result<Vec<A>, ArrayError> {
    args.iter()
        .zip(in_axes)
        .map(|(arg, &axis)| arg.index_axis(axis, index))
        .collect()
}

/// Stack the i-th output of every call into the i-th result.
pub fn stack_results<A: Array>(results: Vec<Vec<A>>) -> Result<Vec<A>, BoxError> {
    let width = results.first().map_or(0, Vec::len);
    let mut columns: Vec<Vec<A>> = (0..width).map(|_| Vec::with_capacity(results.len())).collect();
    for outputs in results {
        if outputs.len() != width {
            return Err(TreeError::LeafCount {
                expected: width,
                got: outputs.len(),
            }
            .into());
        }
        for (column, output) in columns.iter_mut().zip(outputs) {
            column.push(output);
        }
    }
    Ok(columns
        .iter()
        .map(|column| A::stack(column))
        .collect::<Result<Vec<_>, ArrayError>>()?)
}
