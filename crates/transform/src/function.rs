//! # TransformedFunction
//!
//! A kernel wrapped in a chain of transformations. Running one is a two-pass
//! affair:
//!
//! 1. [`build`](TransformedFunction::build) walks the chain from the outside
//!    in, computing for every stage
//!    `input_spec -> passed_spec -> (inner stages) -> returned_spec -> output_spec`,
//!    and returns a new, populated copy. The template is left as it was.
//! 2. [`call`](TransformedFunction::call) walks the chain again with real
//!    data, asking every transformation for its callable.
//!
//! ```text
//! compose!(kernel, ForAll::new("a"), ForAll::new("b"))
//!
//!   ForAll("b")   input [a, b]  ->  passed [a]
//!     ForAll("a")   input [a]   ->  passed []
//!       kernel                      returns []
//!     ForAll("a")   returned [] ->  output [a]
//!   ForAll("b")   returned [a]  ->  output [b, a]
//! ```
//!
//! Any error escaping either pass is a [`TransformedFunctionError`] pointing
//! at the step that raised it.

use std::fmt;
use std::sync::Arc;

use dimflow_core::{Array, Spec, Tree};
use tracing::debug;

use crate::error::{render_chain, BoxError, Phase, TransformError, TransformedFunctionError};
use crate::kernel::Kernel;
use crate::transformation::{Callable, Deferred, Transformation};

/// What a transformation wraps: the kernel, or an inner stage.
#[derive(Clone)]
pub enum Wrapped<A: Array> {
    Kernel(Arc<Kernel<A>>),
    Transformed(Arc<TransformedFunction<A>>),
}

impl<A: Array> Wrapped<A> {
    fn steps(&self) -> Vec<String> {
        match self {
            Wrapped::Kernel(kernel) => vec![kernel.name().to_string()],
            Wrapped::Transformed(inner) => inner.steps(),
        }
    }

    fn depth(&self) -> usize {
        match self {
            Wrapped::Kernel(_) => 0,
            Wrapped::Transformed(inner) => inner.depth(),
        }
    }

    // Errors leave as TransformedFunctionError so outer levels can re-raise
    // them instead of claiming them.
    fn callable(&self) -> Callable<A> {
        match self {
            Wrapped::Kernel(kernel) => {
                let name = kernel.name().to_string();
                let f = kernel.callable();
                Arc::new(move |data: &Tree<A>| {
                    f(data).map_err(|err| {
                        let attributed = TransformedFunctionError::new(Phase::Call, err, 0, vec![name.clone()]);
                        Box::new(attributed) as BoxError
                    })
                })
            }
            Wrapped::Transformed(inner) => {
                let inner = inner.clone();
                Arc::new(move |data: &Tree<A>| inner.call(data).map_err(|err| Box::new(err) as BoxError))
            }
        }
    }
}

impl<A: Array> From<Kernel<A>> for Wrapped<A> {
    fn from(kernel: Kernel<A>) -> Self {
        Wrapped::Kernel(Arc::new(kernel))
    }
}

impl<A: Array> From<Arc<Kernel<A>>> for Wrapped<A> {
    fn from(kernel: Arc<Kernel<A>>) -> Self {
        Wrapped::Kernel(kernel)
    }
}

impl<A: Array> From<TransformedFunction<A>> for Wrapped<A> {
    fn from(function: TransformedFunction<A>) -> Self {
        Wrapped::Transformed(Arc::new(function))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BuiltSpecs {
    input: Spec,
    passed: Spec,
    returned: Spec,
    output: Spec,
}

#[derive(Clone)]
pub struct TransformedFunction<A: Array> {
    wrapped: Wrapped<A>,
    transformation: Arc<dyn Transformation<A>>,
    built: Option<BuiltSpecs>,
}

impl<A: Array> TransformedFunction<A> {
    pub fn new(target: impl Into<Wrapped<A>>, t: impl Transformation<A> + 'static) -> Self {
        Self::from_arc(target, Arc::new(t))
    }

    /// Wrap `target` in `t`. A transformation made of members is unfolded
    /// into one stage per member, innermost first.
    pub fn from_arc(target: impl Into<Wrapped<A>>, t: Arc<dyn Transformation<A>>) -> Self {
        let target = target.into();
        if let Some((last, rest)) = t.members().and_then(<[_]>::split_last) {
            let mut wrapped = target;
            for member in rest {
                wrapped = Self::from_arc(wrapped, member.clone()).into();
            }
            return Self::from_arc(wrapped, last.clone());
        }
        Self {
            wrapped: target,
            transformation: t,
            built: None,
        }
    }

    /// Wrap this function in one more transformation.
    pub fn then(self, t: impl Transformation<A> + 'static) -> Self {
        Self::new(self, t)
    }

    pub fn wrapped(&self) -> &Wrapped<A> {
        &self.wrapped
    }

    pub fn transformation(&self) -> &dyn Transformation<A> {
        self.transformation.as_ref()
    }

    /// Number of transformations between the caller and the kernel.
    pub fn depth(&self) -> usize {
        self.wrapped.depth() + 1
    }

    /// Kernel name first, then every transformation from the inside out.
    pub fn steps(&self) -> Vec<String> {
        let mut steps = self.wrapped.steps();
        steps.push(self.transformation.to_string());
        steps
    }

    pub fn is_built(&self) -> bool {
        self.built.is_some()
    }

    fn specs(&self) -> Result<&BuiltSpecs, TransformError> {
        self.built.as_ref().ok_or(TransformError::NotBuilt { field: "spec" })
    }

    pub fn input_spec(&self) -> Result<&Spec, TransformError> {
        self.built
            .as_ref()
            .map(|b| &b.input)
            .ok_or(TransformError::NotBuilt { field: "input_spec" })
    }

    pub fn passed_spec(&self) -> Result<&Spec, TransformError> {
        self.built
            .as_ref()
            .map(|b| &b.passed)
            .ok_or(TransformError::NotBuilt { field: "passed_spec" })
    }

    pub fn returned_spec(&self) -> Result<&Spec, TransformError> {
        self.built
            .as_ref()
            .map(|b| &b.returned)
            .ok_or(TransformError::NotBuilt { field: "returned_spec" })
    }

    pub fn output_spec(&self) -> Result<&Spec, TransformError> {
        self.built
            .as_ref()
            .map(|b| &b.output)
            .ok_or(TransformError::NotBuilt { field: "output_spec" })
    }

    /// A copy of this pipeline with every stage's specs computed from
    /// `input_spec`.
    pub fn build(&self, input_spec: &Spec) -> Result<Self, TransformedFunctionError> {
        let passed = self
            .transformation
            .transform_input_spec(input_spec)
            .map_err(|err| self.attribute(Phase::Build, err))?;

        let (wrapped, returned) = match &self.wrapped {
            Wrapped::Kernel(kernel) => {
                let returned = kernel
                    .check_input(&passed)
                    .map_err(BoxError::from)
                    .and_then(|()| kernel.output_spec(&passed))
                    .map_err(|err| {
                        debug!(step = 0, kernel = kernel.name(), error = %err, "kernel rejected spec");
                        TransformedFunctionError::new(Phase::Build, err, 0, self.steps())
                    })?;
                (self.wrapped.clone(), returned)
            }
            Wrapped::Transformed(inner) => {
                let built = inner.build(&passed).map_err(|err| err.reraised(self.steps()))?;
                let returned = built.specs().map_err(|err| self.attribute(Phase::Build, err.into()))?.output.clone();
                (Wrapped::from(built), returned)
            }
        };

        let output = self
            .transformation
            .transform_output_spec(&returned)
            .map_err(|err| self.attribute(Phase::Build, err))?;

        debug!(
            step = self.depth(),
            transformation = %self.transformation,
            input = %input_spec,
            output = %output,
            "built stage"
        );

        Ok(Self {
            wrapped,
            transformation: self.transformation.clone(),
            built: Some(BuiltSpecs {
                input: input_spec.clone(),
                passed,
                returned,
                output,
            }),
        })
    }

    /// Run the pipeline on `data`.
    ///
    /// An unbuilt pipeline still runs as long as no transformation reads a
    /// spec; one that does fails with [`TransformError::NotBuilt`].
    pub fn call(&self, data: &Tree<A>) -> Result<Tree<A>, TransformedFunctionError> {
        let (input, returned) = match &self.built {
            Some(specs) => (
                Deferred::ready("input_spec", specs.input.clone()),
                Deferred::ready("returned_spec", specs.returned.clone()),
            ),
            None => (Deferred::missing("input_spec"), Deferred::missing("returned_spec")),
        };
        self.transformation
            .transform_function(self.wrapped.callable(), input, returned)
            .and_then(|f| f(data))
            .map_err(|err| self.attribute(Phase::Call, err))
    }

    /// Attribute an error surfacing at this level. Errors already attributed
    /// further in keep their cause and step.
    fn attribute(&self, phase: Phase, err: BoxError) -> TransformedFunctionError {
        match err.downcast::<TransformedFunctionError>() {
            Ok(inner) => inner.reraised(self.steps()),
            Err(err) => {
                debug!(
                    step = self.depth(),
                    transformation = %self.transformation,
                    %phase,
                    error = %err,
                    "stage raised"
                );
                TransformedFunctionError::new(phase, err, self.depth(), self.steps())
            }
        }
    }
}

impl<A: Array> fmt::Display for TransformedFunction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", render_chain(&self.steps(), None))
    }
}

impl<A: Array> fmt::Debug for TransformedFunction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformedFunction")
            .field("steps", &self.steps())
            .field("built", &self.built)
            .finish()
    }
}

/// Compose `target` with `transformations`, innermost first.
pub fn compose<A: Array>(
    target: impl Into<Wrapped<A>>,
    transformations: Vec<Arc<dyn Transformation<A>>>,
) -> Result<TransformedFunction<A>, TransformError> {
    let mut transformations = transformations.into_iter();
    let Some(first) = transformations.next() else {
        return Err(TransformError::EmptyComposition);
    };
    let mut function = TransformedFunction::from_arc(target, first);
    for t in transformations {
        function = TransformedFunction::from_arc(function, t);
    }
    Ok(function)
}

/// `compose!(kernel, t1, t2, ...)` wraps `kernel` in `t1`, then `t2`, and so
/// on. The last transformation is the outermost.
#[macro_export]
macro_rules! compose {
    ($target:expr, $first:expr $(, $rest:expr)* $(,)?) => {
        $crate::TransformedFunction::new($target, $first)$(.then($rest))*
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::Apply;
    use crate::wrap::Wrap;
    use dimflow_core::Tensor;

    fn add(name: &str, amount: f32) -> Apply<Tensor> {
        Apply::leafwise(name, move |t: &Tensor| Ok(t.map(|v| v + amount)))
    }

    fn data() -> Tree<Tensor> {
        Tree::map([("x", Tree::leaf(Tensor::scalar(1.0)))])
    }

    #[test]
    fn test_steps_and_depth() {
        let f = compose!(Kernel::<Tensor>::identity(), add("one", 1.0), add("two", 2.0));
        assert_eq!(f.depth(), 2);
        assert_eq!(f.steps(), vec!["identity", "Apply(one)", "Apply(two)"]);
    }

    #[test]
    fn test_build_leaves_template_untouched() {
        let template = compose!(Kernel::<Tensor>::identity(), add("one", 1.0));
        let spec = Spec::map([("x", Spec::scalar())]);
        let built = template.build(&spec).unwrap();
        assert!(!template.is_built());
        assert!(template.output_spec().is_err());
        assert_eq!(built.input_spec().unwrap(), &spec);
        assert_eq!(built.output_spec().unwrap(), &spec);
    }

    #[test]
    fn test_unbuilt_call_without_spec_use() {
        let f = compose!(Kernel::<Tensor>::identity(), add("one", 1.0), Wrap::identity());
        let out = f.call(&data()).unwrap();
        assert_eq!(out, Tree::map([("x", Tree::leaf(Tensor::scalar(2.0)))]));
    }

    #[test]
    fn test_compose_fn() {
        let t: Arc<dyn Transformation<Tensor>> = Arc::new(add("one", 1.0));
        let f = compose(Kernel::<Tensor>::identity(), vec![t.clone(), t]).unwrap();
        assert_eq!(f.depth(), 2);
        assert_eq!(
            compose::<Tensor>(Kernel::identity(), Vec::new()).unwrap_err(),
            TransformError::EmptyComposition
        );
    }

    #[test]
    fn test_display_lists_chain() {
        let f = compose!(Kernel::<Tensor>::identity(), add("one", 1.0));
        assert_eq!(
            f.to_string(),
            "TransformedFunction(\n  <compose(\n      identity,\n      Apply(one),\n  )>\n)"
        );
    }
}
