//! Transformations composed without a target yet.
//!
//! A [`PartialTransformation`] is a reusable building block: a list of
//! transformations, innermost first, that can later be applied to a kernel
//! or placed inside a longer chain. Applied to a target it unfolds into one
//! stage per member, so it is interchangeable with writing the members out.

use std::fmt;
use std::sync::Arc;

use dimflow_core::{Array, Spec};

use crate::error::BoxError;
use crate::transformation::{Callable, Deferred, Transformation};

pub struct PartialTransformation<A: Array> {
    members: Vec<Arc<dyn Transformation<A>>>,
}

impl<A: Array> PartialTransformation<A> {
    pub fn new() -> Self {
        Self { members: Vec::new() }
    }

    pub fn from_members(members: Vec<Arc<dyn Transformation<A>>>) -> Self {
        Self { members }
    }

    /// Add `t` outside the current members.
    pub fn then(mut self, t: impl Transformation<A> + 'static) -> Self {
        self.members.push(Arc::new(t));
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<A: Array> Default for PartialTransformation<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Array> Clone for PartialTransformation<A> {
    fn clone(&self) -> Self {
        Self {
            members: self.members.clone(),
        }
    }
}

impl<A: Array> Transformation<A> for PartialTransformation<A> {
    fn transform_function(
        &self,
        wrapped: Callable<A>,
        input_spec: Deferred,
        returned_spec: Deferred,
    ) -> Result<Callable<A>, BoxError> {
        // Input specs flow inward, so the outermost member sees `input_spec`.
        let mut inputs = Vec::with_capacity(self.members.len());
        let mut input = input_spec;
        for member in self.members.iter().rev() {
            let next = input.try_map(|spec| member.transform_input_spec(spec))?;
            inputs.push(input);
            input = next;
        }
        inputs.reverse();

        let mut f = wrapped;
        let mut returned = returned_spec;
        for (member, input) in self.members.iter().zip(inputs) {
            f = member.transform_function(f, input, returned.clone())?;
            returned = returned.try_map(|spec| member.transform_output_spec(spec))?;
        }
        Ok(f)
    }

    fn transform_input_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        self.members
            .iter()
            .rev()
            .try_fold(spec.clone(), |spec, member| member.transform_input_spec(&spec))
    }

    fn transform_output_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        self.members
            .iter()
            .try_fold(spec.clone(), |spec, member| member.transform_output_spec(&spec))
    }

    fn members(&self) -> Option<&[Arc<dyn Transformation<A>>]> {
        Some(&self.members)
    }
}

impl<A: Array> fmt::Display for PartialTransformation<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartialTransformation(")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", member)?;
        }
        write!(f, ")")
    }
}
