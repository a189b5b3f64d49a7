//! # Reduce
//!
//! Fold the wrapped function's results over a dimension without keeping
//! them all around: index `i` is mapped, then immediately combined with the
//! running accumulator.
//!
//! - A zero-length dimension returns the initial value, or fails if there
//!   is none.
//! - The first mapped value seeds the accumulator, combined with the initial
//!   value if one was given.

use std::fmt;
use std::sync::Arc;

use dimflow_core::{concretize_axes, merge_by, Args, Array, Elementwise, Spec, SpecError, Tree};
use tracing::trace;

use crate::error::{BoxError, TransformError};
use crate::transformation::{Callable, Deferred, Transformation};

/// Context handed to a reduction step.
#[derive(Debug, Clone, Copy)]
pub struct ReduceStep<'a> {
    /// Index of the value being folded in, when the reduction enumerates.
    pub index: Option<usize>,
    /// Extra arguments, with axes resolved against the returned spec.
    pub args: &'a Args,
}

pub type ReduceFn<A> = Arc<dyn Fn(Tree<A>, Tree<A>, &ReduceStep<'_>) -> Result<Tree<A>, BoxError> + Send + Sync>;

#[derive(Clone)]
pub struct Reduce<A: Array> {
    dimension: String,
    name: String,
    reduce: ReduceFn<A>,
    initial: Option<Tree<A>>,
    enumerate: bool,
    args: Args,
}

impl<A: Array> Reduce<A> {
    pub fn new<F>(dimension: impl Into<String>, name: impl Into<String>, reduce: F) -> Self
    where
        F: Fn(Tree<A>, Tree<A>, &ReduceStep<'_>) -> Result<Tree<A>, BoxError> + Send + Sync + 'static,
    {
        Self {
            dimension: dimension.into(),
            name: name.into(),
            reduce: Arc::new(reduce),
            initial: None,
            enumerate: false,
            args: Args::new(),
        }
    }

    pub fn with_initial(mut self, initial: Tree<A>) -> Self {
        self.initial = Some(initial);
        self
    }

    /// Pass the index of each folded value to the reduction.
    pub fn enumerate(mut self) -> Self {
        self.enumerate = true;
        self
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    fn require(&self, spec: &Spec) -> Result<(), SpecError> {
        if spec.has_dimension(&self.dimension) {
            Ok(())
        } else {
            Err(SpecError::DimensionAbsent {
                dimension: self.dimension.clone(),
                spec: spec.to_string(),
            })
        }
    }
}

impl<A: Elementwise> Reduce<A> {
    /// Leaf-wise sum of the mapped values.
    pub fn sum(dimension: impl Into<String>) -> Self {
        Self::new(dimension, "sum", |acc, value, _| combine(&acc, &value, A::add))
    }

    /// Leaf-wise product of the mapped values.
    pub fn product(dimension: impl Into<String>) -> Self {
        Self::new(dimension, "product", |acc, value, _| combine(&acc, &value, A::mul))
    }
}

fn combine<A: Array>(
    acc: &Tree<A>,
    value: &Tree<A>,
    op: fn(&A, &A) -> Result<A, dimflow_core::ArrayError>,
) -> Result<Tree<A>, BoxError> {
    merge_by(&[acc.clone(), value.clone()], |pair: Vec<A>| match pair.as_slice() {
        [left, right] => Ok(op(left, right)?),
        _ => Err(BoxError::from(dimflow_core::TreeError::LeafCount {
            expected: 2,
            got: pair.len(),
        })),
    })
}

impl<A: Array> Transformation<A> for Reduce<A> {
    fn transform_function(
        &self,
        wrapped: Callable<A>,
        input_spec: Deferred,
        returned_spec: Deferred,
    ) -> Result<Callable<A>, BoxError> {
        let spec = input_spec.get()?.clone();
        self.require(&spec)?;
        let args = if self.args.has_axes() {
            concretize_axes(returned_spec.get()?, &self.args)?
        } else {
            self.args.clone()
        };
        let dimension = self.dimension.clone();
        let reduce = self.reduce.clone();
        let initial = self.initial.clone();
        let enumerate = self.enumerate;

        Ok(Arc::new(move |data: &Tree<A>| -> Result<Tree<A>, BoxError> {
            let size = match spec.size(data, &dimension) {
                Ok(size) => size,
                Err(SpecError::DimensionNotInData { .. }) => {
                    return Err(TransformError::NothingToMap {
                        dimension: dimension.clone(),
                    }
                    .into())
                }
                Err(err) => return Err(err.into()),
            };
            trace!(dimension = %dimension, size, "reducing");

            let step = |index: usize| ReduceStep {
                index: enumerate.then_some(index),
                args: &args,
            };
            let map_one = |index: usize| -> Result<Tree<A>, BoxError> { wrapped(&spec.index_data(data, index, &dimension)?) };

            if size == 0 {
                return initial.clone().ok_or_else(|| {
                    TransformError::EmptyReduction {
                        dimension: dimension.clone(),
                    }
                    .into()
                });
            }
            let first = map_one(0)?;
            let mut acc = match &initial {
                Some(initial) => reduce(initial.clone(), first, &step(0))?,
                None => first,
            };
            for index in 1..size {
                trace!(dimension = %dimension, index, "reduction step");
                acc = reduce(acc, map_one(index)?, &step(index))?;
            }
            Ok(acc)
        }))
    }

    fn transform_input_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        self.require(spec)?;
        Ok(spec.remove_dimension(&self.dimension))
    }

    fn transform_output_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        Ok(self.args.apply_axes(spec))
    }
}

impl<A: Array> fmt::Display for Reduce<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reduce({:?}, {})", self.dimension, self.name)
    }
}
