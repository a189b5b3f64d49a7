//! # ForAll
//!
//! Vectorize a function over a named dimension. The wrapped function sees
//! one index of the dimension at a time; the results are stacked back
//! along a new leading axis.
//!
//! ```text
//! spec   {x: [a, b], w: [b]}
//! data   {x: f32[2, 3], w: f32[3]}
//!
//! ForAll("a"):  call i = 0, 1 with {x: x[i, :], w: w}
//!               output leaves gain a leading `a` axis
//! ```
//!
//! Leaves that do not carry the dimension are passed whole to every call.
//! Several dimensions at once behave like one `ForAll` per dimension, the
//! last-listed being the outermost loop.

use std::fmt;
use std::sync::{Arc, OnceLock};

use dimflow_core::{display_path, flatten_values, Array, Path, Spec, SpecError, Tree, Unflatten};
use tracing::trace;

use crate::error::{BoxError, TransformError};
use crate::transformation::{Callable, Deferred, Transformation};
use crate::vmap::{SequentialVmap, Vmap};

#[derive(Clone)]
pub struct ForAll<A: Array> {
    dimensions: Vec<String>,
    vmap: Arc<dyn Vmap<A>>,
}

impl<A: Array> ForAll<A> {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self::over([dimension])
    }

    /// Vectorize over several dimensions; the last one is the outermost.
    pub fn over<S: Into<String>>(dimensions: impl IntoIterator<Item = S>) -> Self {
        Self {
            dimensions: dimensions.into_iter().map(Into::into).collect(),
            vmap: Arc::new(SequentialVmap),
        }
    }

    pub fn with_vmap(mut self, vmap: impl Vmap<A> + 'static) -> Self {
        self.vmap = Arc::new(vmap);
        self
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    fn require(&self, spec: &Spec) -> Result<(), SpecError> {
        match self.dimensions.iter().find(|d| !spec.has_dimension(d)) {
            Some(missing) => Err(SpecError::DimensionAbsent {
                dimension: missing.clone(),
                spec: spec.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl<A: Array> Transformation<A> for ForAll<A> {
    fn transform_function(
        &self,
        wrapped: Callable<A>,
        input_spec: Deferred,
        _returned_spec: Deferred,
    ) -> Result<Callable<A>, BoxError> {
        let spec = input_spec.get()?;
        self.require(spec)?;
        let mut f = wrapped;
        for (i, dimension) in self.dimensions.iter().enumerate() {
            let outer: Vec<&str> = self.dimensions[i + 1..].iter().map(String::as_str).collect();
            f = vectorize(f, spec.remove_dimensions(&outer), dimension.clone(), self.vmap.clone());
        }
        Ok(f)
    }

    fn transform_input_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        self.require(spec)?;
        let dimensions: Vec<&str> = self.dimensions.iter().map(String::as_str).collect();
        Ok(spec.remove_dimensions(&dimensions))
    }

    fn transform_output_spec(&self, spec: &Spec) -> Result<Spec, BoxError> {
        Ok(self
            .dimensions
            .iter()
            .fold(spec.clone(), |spec, dimension| spec.update_leaves(|dims| dims.inserted(dimension, 0))))
    }
}

fn vectorize<A: Array>(wrapped: Callable<A>, spec: Spec, dimension: String, vmap: Arc<dyn Vmap<A>>) -> Callable<A> {
    Arc::new(move |data: &Tree<A>| -> Result<Tree<A>, BoxError> {
        let axes: Vec<Option<usize>> = spec.conform(data)?.index_for(&dimension).leaf_values().copied().collect();
        let (values, unflatten) = flatten_values(data);
        if axes.len() != values.len() {
            return Err(dimflow_core::TreeError::LeafCount {
                expected: values.len(),
                got: axes.len(),
            }
            .into());
        }

        let mut mapped = Vec::new();
        let mut in_axes = Vec::new();
        let mut positions = Vec::new();
        for (position, (value, axis)) in values.iter().zip(&axes).enumerate() {
            if let Some(axis) = axis {
                mapped.push(value.clone());
                in_axes.push(*axis);
                positions.push(position);
            }
        }
        trace!(
            dimension = %dimension,
            mapped = mapped.len(),
            fixed = values.len() - mapped.len(),
            "vectorizing"
        );

        let output_structure: OnceLock<Unflatten<A>> = OnceLock::new();
        let call_slice = |slices: Vec<A>| -> Result<Vec<A>, BoxError> {
            let mut leaves = values.clone();
            for (&position, slice) in positions.iter().zip(slices) {
                leaves[position] = slice;
            }
            let output = wrapped(&unflatten.unflatten_values(leaves)?)?;
            let (outputs, structure) = flatten_values(&output);
            if let Err(structure) = output_structure.set(structure) {
                let expected = output_structure.get().map(|first| first.paths()).unwrap_or_default();
                if structure.paths() != expected {
                    return Err(TransformError::InconsistentOutputStructure {
                        dimension: dimension.clone(),
                        expected: render_paths(expected),
                        got: render_paths(structure.paths()),
                    }
                    .into());
                }
            }
            Ok(outputs)
        };

        let stacked = vmap.vmap(&dimension, &call_slice, mapped, &in_axes)?;
        let structure = output_structure.into_inner().ok_or_else(|| TransformError::EmptyDimension {
            dimension: dimension.clone(),
        })?;
        Ok(structure.unflatten_values(stacked)?)
    })
}

fn render_paths(paths: &[Path]) -> String {
    let rendered: Vec<String> = paths.iter().map(|path| display_path(path)).collect();
    format!("[{}]", rendered.join(", "))
}

impl<A: Array> fmt::Display for ForAll<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ForAll(")?;
        for (i, dimension) in self.dimensions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", dimension)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;
    use crate::TransformedFunction;
    use dimflow_core::{path, Tensor};

    fn sum_kernel() -> Kernel<Tensor> {
        Kernel::new("sum", |data: &Tree<Tensor>| {
            let x = data.get(&path!["x"])?.as_leaf().cloned().unwrap_or_else(|| Tensor::scalar(0.0));
            Ok(Tree::leaf(x.sum_all()))
        })
    }

    #[test]
    fn test_display() {
        assert_eq!(ForAll::<Tensor>::new("a").to_string(), "ForAll(\"a\")");
        assert_eq!(ForAll::<Tensor>::over(["a", "b"]).to_string(), "ForAll(\"a\", \"b\")");
    }

    #[test]
    fn test_specs() {
        let t = ForAll::<Tensor>::new("a");
        let spec = Spec::map([("x", Spec::dims(["a", "b"]))]);
        assert_eq!(t.transform_input_spec(&spec).unwrap(), Spec::map([("x", Spec::dims(["b"]))]));
        assert_eq!(
            t.transform_output_spec(&Spec::dims(["b"])).unwrap(),
            Spec::dims(["a", "b"])
        );
        assert!(t.transform_input_spec(&Spec::dims(["b"])).is_err());
    }

    #[test]
    fn test_vectorizes_over_second_axis() {
        let spec = Spec::map([("x", Spec::dims(["a", "b"]))]);
        let f = TransformedFunction::new(sum_kernel(), ForAll::new("b")).build(&spec).unwrap();
        let data = Tree::map([("x", Tree::leaf(Tensor::arange(vec![2, 3])))]);
        assert_eq!(f.call(&data).unwrap(), Tree::leaf(Tensor::vector(vec![3.0, 5.0, 7.0])));
        assert_eq!(f.output_spec().unwrap(), &Spec::dims(["b"]));
    }

    #[test]
    fn test_static_leaves_pass_whole() {
        let spec = Spec::map([("x", Spec::dims(["a"])), ("w", Spec::scalar())]);
        let kernel = Kernel::new("mul", |data: &Tree<Tensor>| {
            let x = data.get(&path!["x"])?.as_leaf().cloned();
            let w = data.get(&path!["w"])?.as_leaf().cloned();
            match (x, w) {
                (Some(x), Some(w)) => Ok(Tree::leaf(dimflow_core::Elementwise::mul(&x, &w)?)),
                _ => Err("missing argument".into()),
            }
        });
        let f = TransformedFunction::new(kernel, ForAll::new("a")).build(&spec).unwrap();
        let data = Tree::map([
            ("x", Tree::leaf(Tensor::vector(vec![1.0, 2.0, 3.0]))),
            ("w", Tree::leaf(Tensor::scalar(10.0))),
        ]);
        assert_eq!(f.call(&data).unwrap(), Tree::leaf(Tensor::vector(vec![10.0, 20.0, 30.0])));
    }

    #[test]
    fn test_unbuilt_for_all_fails() {
        let f = TransformedFunction::new(sum_kernel(), ForAll::new("a"));
        let data = Tree::map([("x", Tree::leaf(Tensor::arange(vec![2])))]);
        let err = f.call(&data).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TransformError>(),
            Some(&TransformError::NotBuilt { field: "input_spec" })
        );
        assert_eq!(err.failed_step(), 1);
    }

    #[test]
    fn test_slices_returning_different_keys_fail() {
        let spec = Spec::map([("x", Spec::dims(["a"]))]);
        let kernel = Kernel::new("branch", |data: &Tree<Tensor>| {
            let x = data.get(&path!["x"])?.as_leaf().and_then(Tensor::as_scalar).unwrap_or(0.0);
            let key = if x < 0.5 { "low" } else { "high" };
            Ok(Tree::map([(key, Tree::leaf(Tensor::scalar(x)))]))
        });
        let f = TransformedFunction::new(kernel, ForAll::new("a")).build(&spec).unwrap();
        let data = Tree::map([("x", Tree::leaf(Tensor::vector(vec![0.0, 1.0])))]);
        let err = f.call(&data).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransformError>(),
            Some(TransformError::InconsistentOutputStructure { dimension, .. }) if dimension == "a"
        ));
        assert_eq!(err.failed_step(), 1);
    }

    #[test]
    fn test_slices_returning_same_keys_stack() {
        let spec = Spec::map([("x", Spec::dims(["a"]))]);
        let kernel = Kernel::new("wrap", |data: &Tree<Tensor>| {
            let x = data.get(&path!["x"])?.as_leaf().cloned().ok_or("`x` is not a leaf")?;
            Ok(Tree::map([("y", Tree::leaf(x))]))
        });
        let f = TransformedFunction::new(kernel, ForAll::new("a")).build(&spec).unwrap();
        let data = Tree::map([("x", Tree::leaf(Tensor::vector(vec![0.0, 1.0])))]);
        assert_eq!(
            f.call(&data).unwrap(),
            Tree::map([("y", Tree::leaf(Tensor::vector(vec![0.0, 1.0])))])
        );
    }

    #[test]
    fn test_zero_length_dimension() {
        let spec = Spec::map([("x", Spec::dims(["a"]))]);
        let f = TransformedFunction::new(sum_kernel(), ForAll::new("a")).build(&spec).unwrap();
        let data = Tree::map([("x", Tree::leaf(Tensor::zeros(vec![0])))]);
        let err = f.call(&data).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransformError>(),
            Some(TransformError::EmptyDimension { .. })
        ));
    }
}
