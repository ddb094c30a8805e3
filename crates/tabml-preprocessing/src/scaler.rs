use serde::{Deserialize, Serialize};
use tabml_core::{Float, MlError, MlResult, Tensor};

/// Scale each feature column to the [0, 1] range observed during `fit`.
///
/// Values outside the fitted range are clamped, and a constant column maps
/// to 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct MinMaxScaler<T: Float> {
    pub min: Option<Tensor<T>>,
    pub max: Option<Tensor<T>>,
}

impl<T: Float> MinMaxScaler<T> {
    pub fn new() -> Self {
        MinMaxScaler {
            min: None,
            max: None,
        }
    }

    /// Record per-column min and max of a `[samples, features]` matrix.
    pub fn fit(&mut self, x: &Tensor<T>) -> MlResult<()> {
        let rows = x.rows()?;
        let cols = x.cols()?;
        if rows == 0 {
            return Err(MlError::EmptyTable);
        }

        let mut min_vals = vec![T::INFINITY; cols];
        let mut max_vals = vec![T::NEG_INFINITY; cols];
        for i in 0..rows {
            for (j, &v) in x.row_slice(i)?.iter().enumerate() {
                if v < min_vals[j] {
                    min_vals[j] = v;
                }
                if v > max_vals[j] {
                    max_vals[j] = v;
                }
            }
        }

        self.min = Some(Tensor::from_slice(&min_vals));
        self.max = Some(Tensor::from_slice(&max_vals));
        Ok(())
    }

    pub fn transform(&self, x: &Tensor<T>) -> MlResult<Tensor<T>> {
        let (min, max) = match (&self.min, &self.max) {
            (Some(min), Some(max)) => (min.data(), max.data()),
            _ => return Err(MlError::NotFitted("MinMaxScaler")),
        };
        let rows = x.rows()?;
        let cols = x.cols()?;
        if cols != min.len() {
            return Err(MlError::FeatureWidth {
                expected: min.len(),
                found: cols,
            });
        }

        let mut out = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for (j, &v) in x.row_slice(i)?.iter().enumerate() {
                let range = max[j] - min[j];
                let scaled = if range.abs() < T::EPSILON {
                    T::ZERO
                } else {
                    (v - min[j]) / range
                };
                out.push(scaled.max(T::ZERO).min(T::ONE));
            }
        }
        Tensor::new(out, vec![rows, cols])
    }

    pub fn fit_transform(&mut self, x: &Tensor<T>) -> MlResult<Tensor<T>> {
        self.fit(x)?;
        self.transform(x)
    }
}

impl<T: Float> Default for MinMaxScaler<T> {
    fn default() -> Self {
        Self::new()
    }
}
