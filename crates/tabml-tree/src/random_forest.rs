use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tabml_core::{Float, MlError, MlResult, Tensor};

use crate::decision_tree::DecisionTreeRegressor;

/// Random forest regression: bagged CART trees averaged at prediction time.
///
/// Each tree sees a bootstrap sample of the rows and a random subset of
/// `feature_fraction` of the features. Per-tree seeds are drawn from one
/// base generator before the trees are built in parallel, so a fixed `seed`
/// gives the same forest regardless of thread scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct RandomForestRegressor<T: Float> {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub feature_fraction: f64,
    pub seed: Option<u64>,
    trees: Vec<DecisionTreeRegressor<T>>,
}

impl<T: Float> RandomForestRegressor<T> {
    pub fn new(n_estimators: usize, min_samples_leaf: usize, feature_fraction: f64) -> Self {
        RandomForestRegressor {
            n_estimators,
            max_depth: 16,
            min_samples_split: 2,
            min_samples_leaf,
            feature_fraction,
            seed: Some(42),
            trees: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
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
        if self.n_estimators == 0 {
            return Err(MlError::InvalidConfig("forest needs at least one tree".into()));
        }
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return Err(MlError::InvalidConfig(format!(
                "feature fraction must lie in (0, 1], got {}",
                self.feature_fraction
            )));
        }
        let max_features = ((p as f64 * self.feature_fraction).ceil() as usize).clamp(1, p.max(1));

        let mut base_rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let tree_seeds: Vec<u64> = (0..self.n_estimators).map(|_| base_rng.gen()).collect();

        let trees = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);

                // Bootstrap sample
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

                // Feature subsampling
                let mut features: Vec<usize> = (0..p).collect();
                features.shuffle(&mut rng);
                features.truncate(max_features);

                let mut tree = DecisionTreeRegressor::new(
                    self.max_depth,
                    self.min_samples_split,
                    self.min_samples_leaf,
                );
                tree.fit_subset(x, y, &sample, &features)?;
                Ok(tree)
            })
            .collect::<MlResult<Vec<_>>>()?;

        self.trees = trees;
        Ok(())
    }

    /// Predict a single feature row as the mean over all trees.
    pub fn predict_row(&self, row: &[T]) -> MlResult<T> {
        if self.trees.is_empty() {
            return Err(MlError::NotFitted("RandomForestRegressor"));
        }
        let mut sum = T::ZERO;
        for tree in &self.trees {
            sum += tree.predict_row(row)?;
        }
        Ok(sum / T::from_usize(self.trees.len()))
    }

    pub fn predict(&self, x: &Tensor<T>) -> MlResult<Tensor<T>> {
        let n = x.rows()?;
        let mut predictions = Vec::with_capacity(n);
        for i in 0..n {
            predictions.push(self.predict_row(x.row_slice(i)?)?);
        }
        Ok(Tensor::from_slice(&predictions))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
