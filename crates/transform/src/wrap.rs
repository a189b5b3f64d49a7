//! Wrap the inner callable in an arbitrary higher-order function.
//!
//! A memoizer, a retry loop, a batching decorator: anything that takes a
//! callable and returns one. Specs pass through untouched.

use std::fmt;
use std::sync::Arc;

use dimflow_core::{Args, Array};

use crate::error::BoxError;
use crate::transformation::{Callable, Deferred, Transformation};

pub type WrapFn<A> = Arc<dyn Fn(Callable<A>, &Args) -> Result<Callable<A>, BoxError> + Send + Sync>;

#[derive(Clone)]
pub struct Wrap<A: Array> {
    name: String,
    f: WrapFn<A>,
    args: Args,
}

impl<A: Array> Wrap<A> {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Callable<A>, &Args) -> Result<Callable<A>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
            args: Args::new(),
        }
    }

    pub fn identity() -> Self {
        Self::new("identity", |f, _| Ok(f))
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }
}

impl<A: Array> Transformation<A> for Wrap<A> {
    fn transform_function(
        &self,
        wrapped: Callable<A>,
        _input_spec: Deferred,
        _returned_spec: Deferred,
    ) -> Result<Callable<A>, BoxError> {
        (self.f)(wrapped, &self.args)
    }
}

impl<A: Array> fmt::Display for Wrap<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wrap({})", self.name)
    }
}
