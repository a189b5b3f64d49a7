//! Post-process the wrapped function's result.
//!
//! `Apply` calls `f(result, args)`. Any [`Axis`](dimflow_core::Axis) in
//! `args` is resolved against the spec the wrapped stage returned, right
//! before `f` runs, so `f` receives plain axis indices. The output spec is
//! the returned spec with every axis rule applied.

use std::fmt;
use std::sync::Arc;

use dimflow_core::{concretize_axes, Args, Array, Spec, Tree};

use crate::error::BoxError;
use crate::kernel::SpecFn;
use crate::transformation::{Callable, Deferred, Transformation};

pub type ApplyFn<A> = Arc<dyn Fn(Tree<A>, &Args) -> Result<Tree<A>, BoxError> + Send + Sync>;

#[derive(Clone)]
pub struct Apply<A: Array> {
    name: String,
    f: ApplyFn<A>,
    args: Args,
    output_spec: Option<SpecFn>,
}

impl<A: Array> Apply<A> {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Tree<A>, &Args) -> Result<Tree<A>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
            args: Args::new(),
            output_spec: None,
        }
    }

    /// Apply `f` to every leaf of the result.
    pub fn leafwise<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&A) -> Result<A, BoxError> + Send + Sync + 'static,
    {
        Self::new(name, move |tree: Tree<A>, _: &Args| tree.try_map_leaves(|_, leaf| f(leaf)))
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    /// Rewrite the output spec further, after the axis rules.
    pub fn with_output_spec<F>(mut self, f: F) -> Self
    where
        F: Fn(&Spec) -> Result<Spec, BoxError> + Send + Sync + 'static,
    {
        self.output_spec = Some(Arc::new(f));
        self
    }
}

impl<A: Array> Transformation<A> for Apply<A> {
    fn transform_function(
        &self,
        wrapped: Callable<A>,
        _input_spec: Deferred,
        returned_spec: Deferred,
    ) -> Result<Callable<A>, BoxError> {
        let f = self.f.clone();
        let args = self.args.clone();
        Ok(Arc::new(move |data: &Tree<A>| -> Result<Tree<A>, BoxError> {
            let result = wrapped(data)?;
            if args.has_axes() {
                let resolved = concretize_axes(returned_spec.get()?, &args)?;
                f(result, &resolved)
            } else {
                f(result, &args)
            }
        }))
    }

    fn transform_output_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        let spec = self.args.apply_axes(spec);
        match &self.output_spec {
            Some(f) => f(&spec),
            None => Ok(spec),
        }
    }
}

impl<A: Array> fmt::Display for Apply<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Apply({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;
    use crate::TransformedFunction;
    use dimflow_core::{Axis, Param, Tensor};

    fn sum_over_axis() -> Apply<Tensor> {
        Apply::new("sum", |tree: Tree<Tensor>, args: &Args| {
            let axes = args.index_tree(0).ok_or("axis argument was not resolved")?;
            let mut axes = axes.leaf_values().copied().collect::<Vec<_>>().into_iter();
            Ok(tree.try_map_leaves(|_, leaf: &Tensor| match axes.next().flatten() {
                Some(axis) => leaf.sum_axis(axis),
                None => Ok(leaf.clone()),
            })?)
        })
        .with_args(Args::new().with(Axis::new("a")))
    }

    #[test]
    fn test_axis_resolved_against_returned_spec() {
        let spec = Spec::map([("x", Spec::dims(["b", "a"]))]);
        let f = TransformedFunction::new(Kernel::<Tensor>::identity(), sum_over_axis())
            .build(&spec)
            .unwrap();
        let data = Tree::map([("x", Tree::leaf(Tensor::arange(vec![2, 3])))]);
        assert_eq!(
            f.call(&data).unwrap(),
            Tree::map([("x", Tree::leaf(Tensor::vector(vec![3.0, 12.0])))])
        );
        assert_eq!(f.output_spec().unwrap(), &Spec::map([("x", Spec::dims(["b"]))]));
    }

    #[test]
    fn test_output_spec_rules() {
        let keep = Apply::<Tensor>::new("noop", |tree, _| Ok(tree))
            .with_args(Args::new().named("axis", Axis::new("a").becoming(["z"])))
            .with_output_spec(|spec| Ok(spec.update_leaves(|dims| dims.inserted("extra", 0))));
        assert_eq!(
            keep.transform_output_spec(&Spec::dims(["a", "b"])).unwrap(),
            Spec::dims(["extra", "z", "b"])
        );
        assert_eq!(keep.transform_input_spec(&Spec::dims(["a"])).unwrap(), Spec::dims(["a"]));
    }

    #[test]
    fn test_works_unbuilt_without_axes() {
        let f = TransformedFunction::new(
            Kernel::<Tensor>::identity(),
            Apply::leafwise("double", |t: &Tensor| Ok(t.scale(2.0))).with_args(Args::new().with(Param::Bool(true))),
        );
        let data = Tree::leaf(Tensor::scalar(3.0));
        assert_eq!(f.call(&data).unwrap(), Tree::leaf(Tensor::scalar(6.0)));
    }
}
