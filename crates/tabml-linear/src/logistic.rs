use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tabml_core::{Float, MlError, MlResult, Tensor};

/// Logistic regression: binary classification by stochastic gradient
/// descent on the L2-regularized log loss.
///
/// Rows are visited in a shuffled order every epoch; training stops early
/// once the epoch loss improves by less than `tol`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct LogisticRegression<T: Float> {
    pub learning_rate: T,
    pub epochs: usize,
    pub l2: T,
    pub tol: T,
    pub seed: Option<u64>,
    pub weights: Option<Tensor<T>>,
    pub bias: Option<T>,
}

impl<T: Float> LogisticRegression<T> {
    pub fn new(learning_rate: T, epochs: usize) -> Self {
        LogisticRegression {
            learning_rate,
            epochs,
            l2: T::from_f64(1e-4),
            tol: T::from_f64(1e-6),
            seed: Some(42),
            weights: None,
            bias: None,
        }
    }

    pub fn with_l2(mut self, l2: T) -> Self {
        self.l2 = l2;
        self
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

        let mut w = vec![T::ZERO; p];
        let mut b = T::ZERO;
        let mut rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut order: Vec<usize> = (0..n).collect();
        let eps = T::from_f64(1e-15);
        let mut prev_loss = T::INFINITY;

        for _epoch in 0..self.epochs {
            order.shuffle(&mut rng);
            let mut total_loss = T::ZERO;

            for &i in &order {
                let row = x.row_slice(i)?;
                let z = b + row.iter().zip(&w).map(|(&xi, &wi)| xi * wi).sum::<T>();
                let a = z.sigmoid();
                let yi = if y.data()[i] > T::HALF { T::ONE } else { T::ZERO };
                let error = a - yi;

                // Sparse update: only features present in this row move.
                for (j, &xij) in row.iter().enumerate() {
                    if xij != T::ZERO {
                        let wj = w[j];
                        w[j] = wj - self.learning_rate * (error * xij + self.l2 * wj);
                    }
                }
                b -= self.learning_rate * error;

                total_loss += -(yi * (a + eps).ln() + (T::ONE - yi) * (T::ONE - a + eps).ln());
            }

            let loss = total_loss / T::from_usize(n);
            if (prev_loss - loss).abs() < self.tol {
                break;
            }
            prev_loss = loss;
        }

        self.weights = Some(Tensor::new(w, vec![p])?);
        self.bias = Some(b);
        Ok(())
    }

    /// Raw margin `w·x + b` per row.
    pub fn decision_function(&self, x: &Tensor<T>) -> MlResult<Tensor<T>> {
        let w = self.weights.as_ref().ok_or(MlError::NotFitted("LogisticRegression"))?;
        let n = x.rows()?;
        let p = x.cols()?;
        if p != w.numel() {
            return Err(MlError::FeatureWidth {
                expected: w.numel(),
                found: p,
            });
        }
        let b = self.bias.unwrap_or(T::ZERO);

        let mut scores = Vec::with_capacity(n);
        for i in 0..n {
            let z: T = x
                .row_slice(i)?
                .iter()
                .zip(w.data())
                .map(|(&xi, &wi)| xi * wi)
                .sum();
            scores.push(z + b);
        }
        Tensor::new(scores, vec![n])
    }

    /// Predict probabilities of the positive class.
    pub fn predict_proba(&self, x: &Tensor<T>) -> MlResult<Tensor<T>> {
        let scores = self.decision_function(x)?;
        let proba: Vec<T> = scores.data().iter().map(|&z| z.sigmoid()).collect();
        Ok(Tensor::from_slice(&proba))
    }

    /// Predict class labels (threshold = 0.5).
    pub fn predict(&self, x: &Tensor<T>) -> MlResult<Tensor<T>> {
        let proba = self.predict_proba(x)?;
        let labels: Vec<T> = proba
            .data()
            .iter()
            .map(|&p| if p >= T::HALF { T::ONE } else { T::ZERO })
            .collect();
        Ok(Tensor::from_slice(&labels))
    }
}

impl<T: Float> Default for LogisticRegression<T> {
    fn default() -> Self {
        Self::new(T::from_f64(0.1), 200)
    }
}
