//! # Error Types
//!
//! A pipeline is many layers deep, and a bare error from the middle of it
//! says little about where it came from. Every failure that escapes a
//! [`TransformedFunction`](crate::TransformedFunction) is therefore a
//! [`TransformedFunctionError`]: the original error, untouched, plus the
//! step of the chain that raised it.
//!
//! When an inner layer's error passes through an outer layer, the outer layer
//! re-raises it with its own (longer) view of the chain. The cause and the
//! failing step never change.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use dimflow_core::{ArrayError, SpecError, TreeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any error a kernel or transformation may raise.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Failures raised by the engine itself.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// A spec was read before the pipeline was built.
    #[error("`{field}` is not available; did you forget to call build()?")]
    NotBuilt { field: &'static str },

    #[error("Kernel `{kernel}` expects {expected} but received {got}; did you forget to vectorize a dimension?")]
    KernelSpecMismatch {
        kernel: String,
        expected: String,
        got: String,
    },

    #[error("Dimension `{dimension}` has size 0; there is nothing to vectorize over")]
    EmptyDimension { dimension: String },

    #[error("Dimension `{dimension}` has inconsistent sizes across arguments: {sizes:?}")]
    InconsistentSizes { dimension: String, sizes: Vec<usize> },

    #[error("Calls vectorized over `{dimension}` returned differently shaped trees: {expected} vs {got}")]
    InconsistentOutputStructure {
        dimension: String,
        expected: String,
        got: String,
    },

    #[error("Dimension `{dimension}` is named by the spec but no argument carries it")]
    NothingToMap { dimension: String },

    #[error("Cannot reduce over empty dimension `{dimension}` without an initial value")]
    EmptyReduction { dimension: String },

    #[error("compose() needs at least one transformation")]
    EmptyComposition,

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Array(#[from] ArrayError),
}

/// Which pass over the chain failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Build,
    Call,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Build => write!(f, "build"),
            Phase::Call => write!(f, "call"),
        }
    }
}

/// An error attributed to one step of a transformation chain.
///
/// Steps are numbered from the inside out: step 0 is the kernel, step `k`
/// is the `k`-th transformation applied to it.
#[derive(Debug, Clone)]
pub struct TransformedFunctionError {
    cause: Arc<dyn Error + Send + Sync + 'static>,
    failed_step: usize,
    steps: Vec<String>,
    phase: Phase,
}

impl TransformedFunctionError {
    pub fn new(phase: Phase, cause: BoxError, failed_step: usize, steps: Vec<String>) -> Self {
        Self {
            cause: Arc::from(cause),
            failed_step,
            steps,
            phase,
        }
    }

    /// Same cause and failing step, seen from an enclosing level.
    pub fn reraised(mut self, steps: Vec<String>) -> Self {
        self.steps = steps;
        self
    }

    /// The error exactly as it was raised.
    pub fn original_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.cause.downcast_ref::<E>()
    }

    pub fn failed_step(&self) -> usize {
        self.failed_step
    }

    /// Description of the failing step.
    pub fn failed_step_name(&self) -> Option<&str> {
        self.steps.get(self.failed_step).map(String::as_str)
    }

    /// Step descriptions, kernel first.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The whole chain, with the failing step flagged.
    pub fn render_chain(&self) -> String {
        render_chain(&self.steps, Some((self.failed_step, &self.cause.to_string())))
    }

    pub fn report(&self) -> ChainReport {
        ChainReport {
            phase: self.phase,
            failed_step: self.failed_step,
            cause: self.cause.to_string(),
            steps: self
                .steps
                .iter()
                .enumerate()
                .map(|(index, description)| StepReport {
                    index,
                    description: description.clone(),
                    failed: index == self.failed_step,
                })
                .collect(),
        }
    }
}

impl fmt::Display for TransformedFunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.cause)?;
        writeln!(f)?;
        write!(f, "{}", self.render_chain())
    }
}

impl Error for TransformedFunctionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Serializable summary of a [`TransformedFunctionError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainReport {
    pub phase: Phase,
    pub failed_step: usize,
    pub cause: String,
    pub steps: Vec<StepReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub description: String,
    pub failed: bool,
}

impl ChainReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

const FLAG: &str = "⚠";

/// Render steps (kernel first) as a `compose(...)` listing.
pub(crate) fn render_chain(steps: &[String], failed: Option<(usize, &str)>) -> String {
    let mut out = String::from("TransformedFunction(\n  <compose(\n");
    for (index, step) in steps.iter().enumerate() {
        match failed {
            Some((failed_step, cause)) if failed_step == index => {
                out.push_str(&format!("{}     {},\n", FLAG, step));
                out.push_str(&format!("      ↳ This step raised {}\n", cause));
            }
            _ => out.push_str(&format!("      {},\n", step)),
        }
    }
    out.push_str("  )>\n)");
    out
}
