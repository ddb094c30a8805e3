use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tabml_core::{Float, MlError, MlResult, Tensor};

/// Least-squares linear regression trained by randomized coordinate descent.
///
/// Minimizes: (1/2n)||y - Xw - b||² + l1·||w||₁ + (l2/2)·||w||²₂
///
/// Each pass visits the coordinates in a freshly shuffled order, so the
/// result is reproducible for a fixed `seed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct SdcaRegressor<T: Float> {
    pub l1: T,
    pub l2: T,
    pub max_iter: usize,
    pub tol: T,
    pub seed: Option<u64>,
    pub weights: Option<Tensor<T>>,
    pub bias: Option<T>,
}

impl<T: Float> SdcaRegressor<T> {
    pub fn new(l1: T, l2: T, max_iter: usize) -> Self {
        SdcaRegressor {
            l1,
            l2,
            max_iter,
            tol: T::from_f64(1e-7),
            seed: Some(42),
            weights: None,
            bias: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&mut self, x: &Tensor<T>, y: &Tensor<T>) -> MlResult<()> {
        let n = x.rows()?;
        let p = x.cols()?;
        if n == 0 {
            return Err(MlError::EmptyTable);
        }
        if y.numel() != n {
            return Err(MlError::ShapeMismatch {
                expected: vec![n],
                got: y.shape_vec(),
            });
        }
        let n_t = T::from_usize(n);
        let xd = x.data();

        // Per-feature mean squared value, the curvature of each coordinate.
        let mut xj_sq = vec![T::ZERO; p];
        for i in 0..n {
            for j in 0..p {
                let v = xd[i * p + j];
                xj_sq[j] += v * v;
            }
        }
        xj_sq.iter_mut().for_each(|s| *s /= n_t);

        let mut w = vec![T::ZERO; p];
        let mut b = T::ZERO;
        // residual = y - (Xw + b)
        let mut residual: Vec<T> = y.data().to_vec();

        let mut rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut order: Vec<usize> = (0..p).collect();

        for _iter in 0..self.max_iter {
            let mut max_change = T::ZERO;

            // Intercept is unpenalized: move it to the mean residual.
            let shift = residual.iter().copied().sum::<T>() / n_t;
            b += shift;
            residual.iter_mut().for_each(|r| *r -= shift);
            max_change = max_change.max(shift.abs());

            order.shuffle(&mut rng);
            for &j in &order {
                let denom = xj_sq[j] + self.l2;
                if denom <= T::ZERO {
                    continue;
                }
                let mut rho = T::ZERO;
                for i in 0..n {
                    rho += xd[i * p + j] * residual[i];
                }
                rho = rho / n_t + xj_sq[j] * w[j];

                let new_w = if rho > self.l1 {
                    (rho - self.l1) / denom
                } else if rho < -self.l1 {
                    (rho + self.l1) / denom
                } else {
                    T::ZERO
                };

                let delta = new_w - w[j];
                if delta != T::ZERO {
                    for i in 0..n {
                        residual[i] -= xd[i * p + j] * delta;
                    }
                    w[j] = new_w;
                    max_change = max_change.max(delta.abs());
                }
            }

            if max_change < self.tol {
                break;
            }
        }

        self.weights = Some(Tensor::new(w, vec![p])?);
        self.bias = Some(b);
        Ok(())
    }

    pub fn predict(&self, x: &Tensor<T>) -> MlResult<Tensor<T>> {
        let w = self.weights.as_ref().ok_or(MlError::NotFitted("SdcaRegressor"))?;
        let b = self.bias.unwrap_or(T::ZERO);
        let n = x.rows()?;
        let p = x.cols()?;
        if p != w.numel() {
            return Err(MlError::FeatureWidth {
                expected: w.numel(),
                found: p,
            });
        }
        let mut preds = Vec::with_capacity(n);
        for i in 0..n {
            let score: T = x
                .row_slice(i)?
                .iter()
                .zip(w.data())
                .map(|(&xi, &wi)| xi * wi)
                .sum();
            preds.push(score + b);
        }
        Tensor::new(preds, vec![n])
    }
}

impl<T: Float> Default for SdcaRegressor<T> {
    fn default() -> Self {
        Self::new(T::ZERO, T::from_f64(1e-4), 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sdca_recovers_line() {
        let x: Tensor<f64> = Tensor::from_vec2d(&[
            vec![0.0], vec![0.25], vec![0.5], vec![0.75], vec![1.0],
        ]).unwrap();
        let y: Tensor<f64> = Tensor::from_slice(&[10.0, 15.0, 20.0, 25.0, 30.0]);

        let mut model = SdcaRegressor::new(0.0, 0.0, 5000);
        model.fit(&x, &y).unwrap();

        assert_abs_diff_eq!(model.weights.as_ref().unwrap().data()[0], 20.0, epsilon = 1e-3);
        assert_abs_diff_eq!(model.bias.unwrap(), 10.0, epsilon = 1e-3);
        let pred = model.predict(&x).unwrap();
        for i in 0..5 {
            assert_abs_diff_eq!(pred.data()[i], y.data()[i], epsilon = 1e-3);
        }
    }

    #[test]
    fn test_l1_zeroes_irrelevant_feature() {
        let x: Tensor<f64> = Tensor::from_vec2d(&[
            vec![1.0, 0.1], vec![2.0, -0.1], vec![3.0, 0.1],
            vec![4.0, -0.1], vec![5.0, 0.1],
        ]).unwrap();
        let y: Tensor<f64> = Tensor::from_slice(&[2.0, 4.0, 6.0, 8.0, 10.0]);

        let mut model = SdcaRegressor::new(0.05, 0.0, 2000);
        model.fit(&x, &y).unwrap();
        let w = model.weights.as_ref().unwrap();
        assert!(w.data()[0] > 1.5);
        assert_eq!(w.data()[1], 0.0);
    }

    #[test]
    fn test_seed_reproducible() {
        let x: Tensor<f64> = Tensor::from_vec2d(&[
            vec![1.0, 2.0, 0.5], vec![2.0, 1.0, 0.0], vec![0.0, 3.0, 1.0], vec![4.0, 0.0, 2.0],
        ]).unwrap();
        let y: Tensor<f64> = Tensor::from_slice(&[3.0, 4.0, 2.0, 9.0]);

        let mut a = SdcaRegressor::new(0.0, 0.01, 3).with_seed(Some(9));
        let mut b = SdcaRegressor::new(0.0, 0.01, 3).with_seed(Some(9));
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
    }

    #[test]
    fn test_predict_before_fit() {
        let model = SdcaRegressor::<f64>::default();
        let x: Tensor<f64> = Tensor::from_vec2d(&[vec![1.0]]).unwrap();
        assert!(matches!(model.predict(&x), Err(MlError::NotFitted(_))));
    }
}
