//! # dimflow transform - Composable Function Transformations
//!
//! Write a kernel for one element, then lift it with transformations that
//! know where the surrounding dimensions are:
//!
//! - **Kernel**: the terminal callable, with the spec it expects and returns
//! - **ForAll**: vectorize over named dimensions
//! - **Reduce**: fold over a dimension without materializing every result
//! - **Apply**: post-process a result, with axes resolved by name
//! - **Wrap**: insert any higher-order function
//! - **PartialTransformation**: reusable chains without a target
//!
//! ## Two passes
//!
//! ```text
//!          build(spec)                       call(data)
//!   ┌──────────────────────┐          ┌──────────────────────┐
//!   │ input → passed  ──┐  │          │ transform_function   │
//!   │                   ▼  │          │   wraps the callable │
//!   │   inner stages       │   ───▶   │   of the inner stage │
//!   │                   │  │          │                      │
//!   │ output ← returned ◀┘ │          │ then runs the data   │
//!   └──────────────────────┘          └──────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dimflow_core::{Spec, Tensor, Tree};
//! use dimflow_transform::{compose, ForAll, Kernel, Reduce};
//!
//! let kernel = Kernel::new("x", |data: &Tree<Tensor>| Ok(data.get(&dimflow_core::path!["x"])?.clone()));
//! let spec = Spec::map([("x", Spec::dims(["a", "b"]))]);
//! let f = compose!(kernel, ForAll::new("b"), Reduce::sum("a")).build(&spec).unwrap();
//!
//! let data = Tree::map([("x", Tree::leaf(Tensor::arange(vec![2, 3])))]);
//! let out = f.call(&data).unwrap();
//! assert_eq!(out, Tree::leaf(Tensor::vector(vec![3.0, 5.0, 7.0])));
//! assert_eq!(f.output_spec().unwrap(), &Spec::dims(["b"]));
//! ```
//!
//! Errors from either pass are [`TransformedFunctionError`]s naming the step
//! of the chain that raised them.

pub mod apply;
pub mod error;
pub mod for_all;
pub mod function;
pub mod kernel;
pub mod partial;
pub mod reduce;
pub mod transformation;
pub mod vmap;
pub mod wrap;

pub use apply::{Apply, ApplyFn};
pub use error::{BoxError, ChainReport, Phase, StepReport, TransformError, TransformedFunctionError};
pub use for_all::ForAll;
pub use function::{compose, TransformedFunction, Wrapped};
pub use kernel::{Kernel, SpecFn};
pub use partial::PartialTransformation;
pub use reduce::{Reduce, ReduceFn, ReduceStep};
pub use transformation::{Callable, Deferred, Transformation, TransformationExt};
#[cfg(feature = "parallel")]
pub use vmap::ParallelVmap;
pub use vmap::{SequentialVmap, SliceFn, Vmap};
pub use wrap::{Wrap, WrapFn};
