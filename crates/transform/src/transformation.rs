//! # The Transformation Contract
//!
//! A transformation takes a callable and returns a new one. Alongside the
//! callable it describes how data specs change as they pass through:
//!
//! - `transform_input_spec`: the spec the caller hands in, rewritten into
//!   the spec handed to the wrapped callable (inward),
//! - `transform_output_spec`: the spec the wrapped callable returns,
//!   rewritten into the spec this layer returns (outward).
//!
//! Both default to the identity. `transform_function` receives the input and
//! returned specs as [`Deferred`] values: they exist only once the pipeline
//! has been built, and reading one before that fails with a clear
//! "did you forget to call build()?" error instead of a silent default.

use std::fmt;
use std::sync::Arc;

use dimflow_core::{Array, Spec, Tree};

use crate::error::{BoxError, TransformError};
use crate::function::{TransformedFunction, Wrapped};
use crate::partial::PartialTransformation;

/// A stage callable: data tree in, data tree out.
pub type Callable<A> = Arc<dyn Fn(&Tree<A>) -> Result<Tree<A>, BoxError> + Send + Sync>;

/// A spec that may not have been computed yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred {
    field: &'static str,
    spec: Option<Spec>,
}

impl Deferred {
    pub fn ready(field: &'static str, spec: Spec) -> Self {
        Self {
            field,
            spec: Some(spec),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self { field, spec: None }
    }

    pub fn is_ready(&self) -> bool {
        self.spec.is_some()
    }

    /// The spec, or `NotBuilt` naming the field.
    pub fn get(&self) -> Result<&Spec, TransformError> {
        self.spec
            .as_ref()
            .ok_or(TransformError::NotBuilt { field: self.field })
    }

    /// Rewrite the spec if present; a missing spec stays missing.
    pub fn try_map(&self, f: impl FnOnce(&Spec) -> Result<Spec, BoxError>) -> Result<Deferred, BoxError> {
        Ok(Deferred {
            field: self.field,
            spec: self.spec.as_ref().map(f).transpose()?,
        })
    }
}

pub trait Transformation<A: Array>: fmt::Display + Send + Sync {
    /// Wrap `wrapped` into a new callable.
    fn transform_function(
        &self,
        wrapped: Callable<A>,
        input_spec: Deferred,
        returned_spec: Deferred,
    ) -> Result<Callable<A>, BoxError>;

    fn transform_input_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        Ok(spec.clone())
    }

    fn transform_output_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        Ok(spec.clone())
    }

    /// Members, for transformations that are a list of others.
    fn members(&self) -> Option<&[Arc<dyn Transformation<A>>]> {
        None
    }
}

/// Composition helpers available on every transformation.
pub trait TransformationExt<A: Array>: Transformation<A> + Sized + 'static {
    /// Apply this transformation to a kernel or to an already transformed
    /// function.
    fn apply(self, target: impl Into<Wrapped<A>>) -> TransformedFunction<A> {
        TransformedFunction::new(target, self)
    }

    /// Chain another transformation outside this one, without a target yet.
    fn then(self, outer: impl Transformation<A> + 'static) -> PartialTransformation<A> {
        PartialTransformation::new().then(self).then(outer)
    }
}

impl<A: Array, T: Transformation<A> + Sized + 'static> TransformationExt<A> for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deferred_missing_names_field() {
        let deferred = Deferred::missing("input_spec");
        assert_eq!(
            deferred.get().unwrap_err(),
            TransformError::NotBuilt { field: "input_spec" }
        );
        assert!(deferred.get().unwrap_err().to_string().contains("did you forget to call build()?"));
    }

    #[test]
    fn test_deferred_try_map() {
        let ready = Deferred::ready("returned_spec", Spec::dims(["a", "b"]));
        let mapped = ready.try_map(|s| Ok(s.remove_dimension("a"))).unwrap();
        assert_eq!(mapped.get().unwrap(), &Spec::dims(["b"]));

        let missing = Deferred::missing("returned_spec");
        let still_missing = missing.try_map(|s| Ok(s.clone())).unwrap();
        assert!(!still_missing.is_ready());
    }
}
