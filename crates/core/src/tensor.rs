//! # Reference Tensor
//!
//! A small row-major runtime tensor implementing [`Array`] and
//! [`Elementwise`]. Good enough for demos and tests; real workloads plug in
//! their own backend through the same traits.

use std::fmt;

use crate::array::{Array, Elementwise};
use crate::error::ArrayError;

/// A runtime tensor with dynamic shape.
///
/// Fields are private so that `data.len()` always equals the product of
/// `shape`; build one through the constructors.
#[derive(Clone, PartialEq)]
pub struct Tensor {
    /// Shape of the tensor; empty for a scalar.
    shape: Vec<usize>,
    /// Flattened data in row-major order.
    data: Vec<f32>,
}

impl Tensor {
    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::full(shape, 0.0)
    }

    pub fn full(shape: Vec<usize>, value: f32) -> Self {
        let size: usize = shape.iter().product();
        Self {
            shape,
            data: vec![value; size],
        }
    }

    /// Create a tensor from data with given shape.
    pub fn from_data(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, ArrayError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(ArrayError::DataLength {
                len: data.len(),
                shape,
            });
        }
        Ok(Self { shape, data })
    }

    /// Flattened values in row-major order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn scalar(value: f32) -> Self {
        Self {
            shape: vec![],
            data: vec![value],
        }
    }

    pub fn vector(data: Vec<f32>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn matrix(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self, ArrayError> {
        Self::from_data(vec![rows, cols], data)
    }

    /// Values `0, 1, 2, ...` laid out in `shape`.
    pub fn arange(shape: Vec<usize>) -> Self {
        let size: usize = shape.iter().product();
        Self {
            shape,
            data: (0..size).map(|i| i as f32).collect(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// The value of a single-element tensor.
    pub fn as_scalar(&self) -> Option<f32> {
        match self.data.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Element at a full multi-index.
    pub fn get(&self, index: &[usize]) -> Option<f32> {
        if index.len() != self.shape.len() {
            return None;
        }
        let mut offset = 0;
        for (&i, &dim) in index.iter().zip(&self.shape) {
            if i >= dim {
                return None;
            }
            offset = offset * dim + i;
        }
        self.data.get(offset).copied()
    }

    /// Apply a function to each element.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Tensor {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    pub fn scale(&self, scalar: f32) -> Tensor {
        self.map(|x| x * scalar)
    }

    /// Sum all elements to a scalar.
    pub fn sum_all(&self) -> Tensor {
        Tensor::scalar(self.data.iter().sum())
    }

    /// Sum along one axis, removing it.
    pub fn sum_axis(&self, axis: usize) -> Result<Tensor, ArrayError> {
        let (outer, len, inner) = self.split_at_axis(axis)?;
        let mut data = vec![0.0; outer * inner];
        for o in 0..outer {
            for j in 0..len {
                for i in 0..inner {
                    data[o * inner + i] += self.data[(o * len + j) * inner + i];
                }
            }
        }
        let mut shape = self.shape.clone();
        shape.remove(axis);
        Ok(Tensor { shape, data })
    }

    /// Transpose a 2D matrix.
    pub fn transpose(&self) -> Result<Tensor, ArrayError> {
        let &[rows, cols] = self.shape.as_slice() else {
            return Err(ArrayError::AxisOutOfRange {
                axis: 1,
                rank: self.shape.len(),
            });
        };
        let mut data = vec![0.0; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                data[c * rows + r] = self.data[r * cols + c];
            }
        }
        Ok(Tensor {
            shape: vec![cols, rows],
            data,
        })
    }

    // (product of leading dims, length of `axis`, product of trailing dims)
    fn split_at_axis(&self, axis: usize) -> Result<(usize, usize, usize), ArrayError> {
        if axis >= self.shape.len() {
            return Err(ArrayError::AxisOutOfRange {
                axis,
                rank: self.shape.len(),
            });
        }
        let outer = self.shape[..axis].iter().product();
        let inner = self.shape[axis + 1..].iter().product();
        Ok((outer, self.shape[axis], inner))
    }

    fn zip_with(&self, other: &Tensor, f: impl Fn(f32, f32) -> f32) -> Result<Tensor, ArrayError> {
        if self.shape != other.shape {
            return Err(ArrayError::ShapeMismatch {
                left: self.shape.clone(),
                right: other.shape.clone(),
            });
        }
        Ok(Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().zip(&other.data).map(|(&a, &b)| f(a, b)).collect(),
        })
    }
}

impl Array for Tensor {
    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn index_axis(&self, axis: usize, index: usize) -> Result<Self, ArrayError> {
        let (outer, len, inner) = self.split_at_axis(axis)?;
        if index >= len {
            return Err(ArrayError::IndexOutOfRange { index, axis, len });
        }
        let mut data = Vec::with_capacity(outer * inner);
        for o in 0..outer {
            let start = (o * len + index) * inner;
            data.extend_from_slice(&self.data[start..start + inner]);
        }
        let mut shape = self.shape.clone();
        shape.remove(axis);
        Ok(Tensor { shape, data })
    }

    fn stack(items: &[Self]) -> Result<Self, ArrayError> {
        let Some(first) = items.first() else {
            return Err(ArrayError::EmptyStack);
        };
        let mut data = Vec::with_capacity(first.size() * items.len());
        for item in items {
            if item.shape != first.shape {
                return Err(ArrayError::StackShapeMismatch {
                    first: first.shape.clone(),
                    other: item.shape.clone(),
                });
            }
            data.extend_from_slice(&item.data);
        }
        let mut shape = vec![items.len()];
        shape.extend_from_slice(&first.shape);
        Ok(Tensor { shape, data })
    }
}

impl Elementwise for Tensor {
    fn add(&self, other: &Self) -> Result<Self, ArrayError> {
        self.zip_with(other, |a, b| a + b)
    }

    fn mul(&self, other: &Self) -> Result<Self, ArrayError> {
        self.zip_with(other, |a, b| a * b)
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor{:?}{:?}", self.shape, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_checks_length() {
        assert_eq!(
            Tensor::from_data(vec![2, 2], vec![1.0; 3]).unwrap_err(),
            ArrayError::DataLength { len: 3, shape: vec![2, 2] }
        );
        assert!(Tensor::from_data(vec![2, 3], vec![1.0; 5]).is_err());
        assert!(Tensor::matrix(2, 2, vec![1.0; 5]).is_err());
        let m = Tensor::matrix(1, 2, vec![1.0, 2.0]).unwrap();
        assert_eq!(m.shape(), vec![1, 2]);
        assert_eq!(m.data(), &[1.0, 2.0]);
    }

    #[test]
    fn test_constructors_keep_shape_and_data_consistent() {
        for t in [
            Tensor::zeros(vec![2, 0, 3]),
            Tensor::full(vec![3, 2], 1.5),
            Tensor::arange(vec![4]),
            Tensor::scalar(2.0),
            Tensor::vector(vec![1.0, 2.0, 3.0]),
        ] {
            assert_eq!(t.data().len(), t.shape().iter().product::<usize>());
        }
    }

    #[test]
    fn test_index_axis() {
        let t = Tensor::arange(vec![2, 3]);
        assert_eq!(t.index_axis(0, 1).unwrap(), Tensor::vector(vec![3.0, 4.0, 5.0]));
        assert_eq!(t.index_axis(1, 2).unwrap(), Tensor::vector(vec![2.0, 5.0]));
        assert_eq!(
            t.index_axis(1, 3).unwrap_err(),
            ArrayError::IndexOutOfRange { index: 3, axis: 1, len: 3 }
        );
        assert!(t.index_axis(2, 0).is_err());
        assert_eq!(Tensor::vector(vec![7.0]).index_axis(0, 0).unwrap(), Tensor::scalar(7.0));
    }

    #[test]
    fn test_stack_adds_leading_axis() {
        let rows = vec![Tensor::vector(vec![1.0, 2.0]), Tensor::vector(vec![3.0, 4.0])];
        let stacked = Tensor::stack(&rows).unwrap();
        assert_eq!(stacked.shape, vec![2, 2]);
        assert_eq!(stacked.get(&[1, 0]), Some(3.0));
        assert_eq!(Tensor::stack(&[]).unwrap_err(), ArrayError::EmptyStack);
        let scalars = Tensor::stack(&[Tensor::scalar(1.0), Tensor::scalar(2.0)]).unwrap();
        assert_eq!(scalars, Tensor::vector(vec![1.0, 2.0]));
    }

    #[test]
    fn test_sum_axis_and_transpose() {
        let t = Tensor::arange(vec![2, 3]);
        assert_eq!(t.sum_axis(0).unwrap(), Tensor::vector(vec![3.0, 5.0, 7.0]));
        assert_eq!(t.sum_axis(1).unwrap(), Tensor::vector(vec![3.0, 12.0]));
        let tt = t.transpose().unwrap();
        assert_eq!(tt.shape, vec![3, 2]);
        assert_eq!(tt.get(&[2, 1]), t.get(&[1, 2]));
    }

    #[test]
    fn test_elementwise() {
        let a = Tensor::vector(vec![1.0, 2.0]);
        let b = Tensor::vector(vec![3.0, 4.0]);
        assert_eq!(a.add(&b).unwrap(), Tensor::vector(vec![4.0, 6.0]));
        assert_eq!(a.mul(&b).unwrap(), Tensor::vector(vec![3.0, 8.0]));
        assert!(a.add(&Tensor::scalar(1.0)).is_err());
    }
}
