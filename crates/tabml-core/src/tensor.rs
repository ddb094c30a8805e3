use crate::dtype::Float;
use crate::error::{MlError, MlResult};
use crate::shape::Shape;

use serde::{Deserialize, Serialize};

/// Dense row-major tensor used for feature matrices and label vectors.
///
/// Stores data in a flat contiguous `Vec<T>`; a feature matrix has shape
/// `[rows, cols]`, a label or score vector has shape `[n]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct Tensor<T: Float> {
    data: Vec<T>,
    shape: Shape,
}

// ─── Construction ───────────────────────────────────────────────────────────

impl<T: Float> Tensor<T> {
    /// Create a tensor from raw data and shape.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> MlResult<Self> {
        let s = Shape::new(shape);
        if data.len() != s.numel() {
            return Err(MlError::ShapeMismatch {
                expected: s.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Tensor { data, shape: s })
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let s = Shape::new(shape);
        Tensor {
            data: vec![T::ZERO; s.numel()],
            shape: s,
        }
    }

    /// Create a 1-D tensor from a slice.
    pub fn from_slice(data: &[T]) -> Self {
        Tensor {
            data: data.to_vec(),
            shape: Shape::new(vec![data.len()]),
        }
    }

    /// Create a 2-D tensor from a nested slice.
    pub fn from_vec2d(data: &[Vec<T>]) -> MlResult<Self> {
        if data.is_empty() {
            return Ok(Tensor::zeros(vec![0, 0]));
        }
        let rows = data.len();
        let cols = data[0].len();
        if data.iter().any(|row| row.len() != cols) {
            return Err(MlError::InvalidOperation(
                "All rows must have the same number of columns".to_string(),
            ));
        }
        let flat: Vec<T> = data.iter().flat_map(|r| r.iter().copied()).collect();
        Tensor::new(flat, vec![rows, cols])
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_vec(&self) -> Vec<usize> {
        self.shape.to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Rows of a matrix, or length of a vector.
    pub fn rows(&self) -> MlResult<usize> {
        self.shape.dim(0)
    }

    /// Columns of a matrix.
    pub fn cols(&self) -> MlResult<usize> {
        self.require_2d("cols()")?;
        self.shape.dim(1)
    }

    fn require_2d(&self, op: &str) -> MlResult<()> {
        if self.ndim() != 2 {
            return Err(MlError::InvalidOperation(format!(
                "{} requires a 2D tensor, got shape {}",
                op, self.shape
            )));
        }
        Ok(())
    }

    /// Borrow row `i` of a matrix without copying.
    pub fn row_slice(&self, i: usize) -> MlResult<&[T]> {
        self.require_2d("row_slice()")?;
        let rows = self.shape.dim(0)?;
        let cols = self.shape.dim(1)?;
        if i >= rows {
            return Err(MlError::IndexOutOfBounds { index: i, axis: 0, size: rows });
        }
        Ok(&self.data[i * cols..(i + 1) * cols])
    }

    /// Gather rows (of a matrix) or elements (of a vector) by index, in the
    /// given order. Indices may repeat, as in bootstrap sampling.
    pub fn select_rows(&self, indices: &[usize]) -> MlResult<Tensor<T>> {
        let rows = self.rows()?;
        let width = if self.ndim() == 2 { self.shape.dim(1)? } else { 1 };
        let mut data = Vec::with_capacity(indices.len() * width);
        for &i in indices {
            if i >= rows {
                return Err(MlError::IndexOutOfBounds { index: i, axis: 0, size: rows });
            }
            data.extend_from_slice(&self.data[i * width..(i + 1) * width]);
        }
        let shape = if self.ndim() == 2 {
            vec![indices.len(), width]
        } else {
            vec![indices.len()]
        };
        Tensor::new(data, shape)
    }

    /// Join matrices side by side. Every input must have the same row count;
    /// 1-D inputs are treated as single columns.
    pub fn hstack(tensors: &[&Tensor<T>]) -> MlResult<Tensor<T>> {
        let first = tensors.first().ok_or_else(|| {
            MlError::InvalidOperation("hstack() needs at least one tensor".to_string())
        })?;
        let rows = first.rows()?;
        let mut widths = Vec::with_capacity(tensors.len());
        for t in tensors {
            let r = t.rows()?;
            if r != rows {
                return Err(MlError::ShapeMismatch {
                    expected: vec![rows],
                    got: vec![r],
                });
            }
            widths.push(if t.ndim() == 2 { t.shape.dim(1)? } else { 1 });
        }
        let total: usize = widths.iter().sum();
        let mut data = Vec::with_capacity(rows * total);
        for i in 0..rows {
            for (t, &w) in tensors.iter().zip(&widths) {
                data.extend_from_slice(&t.data[i * w..(i + 1) * w]);
            }
        }
        Tensor::new(data, vec![rows, total])
    }
}

impl<T: Float> std::fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tensor{} [", self.shape)?;
        for (i, v) in self.data.iter().take(8).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        if self.data.len() > 8 {
            write!(f, ", ...")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> Tensor<f64> {
        Tensor::from_vec2d(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_shape() {
        let err = Tensor::<f64>::new(vec![1.0, 2.0, 3.0], vec![2, 2]).unwrap_err();
        assert!(matches!(err, MlError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_indexing() {
        let m = matrix();
        assert_eq!(m.row_slice(1).unwrap(), &[3.0, 4.0]);
        assert!(matches!(
            m.row_slice(3),
            Err(MlError::IndexOutOfBounds { index: 3, axis: 0, size: 3 })
        ));
        assert!(Tensor::from_slice(&[1.0, 2.0]).row_slice(0).is_err());
    }

    #[test]
    fn test_select_rows_with_repeats() {
        let m = matrix();
        let s = m.select_rows(&[2, 2, 0]).unwrap();
        assert_eq!(s.shape_vec(), vec![3, 2]);
        assert_eq!(s.data(), &[5.0, 6.0, 5.0, 6.0, 1.0, 2.0]);

        let v = Tensor::from_slice(&[10.0, 20.0, 30.0]);
        assert_eq!(v.select_rows(&[1]).unwrap().data(), &[20.0]);
    }

    #[test]
    fn test_hstack_mixes_vectors_and_matrices() {
        let m = matrix();
        let v = Tensor::from_slice(&[7.0, 8.0, 9.0]);
        let h = Tensor::hstack(&[&v, &m]).unwrap();
        assert_eq!(h.shape_vec(), vec![3, 3]);
        assert_eq!(h.row_slice(0).unwrap(), &[7.0, 1.0, 2.0]);
        assert_eq!(h.row_slice(2).unwrap(), &[9.0, 5.0, 6.0]);

        let short = Tensor::from_slice(&[1.0]);
        assert!(Tensor::hstack(&[&m, &short]).is_err());
    }
}
