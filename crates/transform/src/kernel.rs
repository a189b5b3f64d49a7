//! The terminal callable of a pipeline.
//!
//! A [`Kernel`] only ever sees what the transformations above it hand down:
//! with `ForAll("time")` outside it, one time step at a time. It may declare
//! the spec it expects, which turns "forgot to vectorize" mistakes into a
//! build error, and it says what spec it returns. The default is the empty
//! dimension list: an unnamed value with no tracked axes.

use std::fmt;
use std::sync::Arc;

use dimflow_core::{Array, Spec, Tree};

use crate::error::{BoxError, TransformError};
use crate::function::TransformedFunction;
use crate::transformation::{Callable, Transformation};

pub type SpecFn = Arc<dyn Fn(&Spec) -> Result<Spec, BoxError> + Send + Sync>;

#[derive(Clone)]
enum Returns {
    Scalar,
    Fixed(Spec),
    Input,
    With(SpecFn),
}

#[derive(Clone)]
pub struct Kernel<A: Array> {
    name: String,
    f: Callable<A>,
    expects: Option<Spec>,
    returns: Returns,
}

impl<A: Array> Kernel<A> {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Tree<A>) -> Result<Tree<A>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
            expects: None,
            returns: Returns::Scalar,
        }
    }

    /// A kernel named after the type of `f`.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Tree<A>) -> Result<Tree<A>, BoxError> + Send + Sync + 'static,
    {
        let name = std::any::type_name::<F>();
        let name = name.rsplit("::").next().unwrap_or(name).to_string();
        Self::new(name, f)
    }

    /// The identity kernel; it returns whatever spec it was given.
    pub fn identity() -> Self {
        Self::new("identity", |data: &Tree<A>| Ok(data.clone())).returns_input_spec()
    }

    /// Declare the spec this kernel must receive.
    pub fn expects(mut self, spec: Spec) -> Self {
        self.expects = Some(spec);
        self
    }

    pub fn returns(mut self, spec: Spec) -> Self {
        self.returns = Returns::Fixed(spec);
        self
    }

    /// Derive the returned spec from the spec handed to the kernel.
    pub fn returns_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Spec) -> Result<Spec, BoxError> + Send + Sync + 'static,
    {
        self.returns = Returns::With(Arc::new(f));
        self
    }

    pub fn returns_input_spec(mut self) -> Self {
        self.returns = Returns::Input;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, data: &Tree<A>) -> Result<Tree<A>, BoxError> {
        (self.f)(data)
    }

    pub(crate) fn callable(&self) -> Callable<A> {
        self.f.clone()
    }

    pub fn check_input(&self, spec: &Spec) -> Result<(), TransformError> {
        match &self.expects {
            Some(expected) if expected != spec => Err(TransformError::KernelSpecMismatch {
                kernel: self.name.clone(),
                expected: expected.to_string(),
                got: spec.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Spec of the value returned when the kernel receives `input`.
    pub fn output_spec(&self, input: &Spec) -> Result<Spec, BoxError> {
        match &self.returns {
            Returns::Scalar => Ok(Spec::scalar()),
            Returns::Fixed(spec) => Ok(spec.clone()),
            Returns::Input => Ok(input.clone()),
            Returns::With(f) => f(input),
        }
    }

    /// Apply a first transformation.
    pub fn then(self, t: impl Transformation<A> + 'static) -> TransformedFunction<A> {
        TransformedFunction::new(self, t)
    }
}

impl<A: Array> fmt::Debug for Kernel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.name)
            .field("expects", &self.expects)
            .finish_non_exhaustive()
    }
}

impl<A: Array> fmt::Display for Kernel<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
