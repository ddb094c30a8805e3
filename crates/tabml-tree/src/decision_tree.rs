use serde::{Deserialize, Serialize};
use tabml_core::{Float, MlError, MlResult, Tensor};

/// A node in the decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
enum TreeNode<T: Float> {
    /// Internal node: rows with `x[feature_idx] <= threshold` go left.
    Split {
        feature_idx: usize,
        threshold: T,
        left: Box<TreeNode<T>>,
        right: Box<TreeNode<T>>,
    },
    /// Leaf: mean label of the training rows that reached it.
    Leaf { value: T },
}

/// Decision Tree Regressor using CART (MSE criterion).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "T: Float")]
pub struct DecisionTreeRegressor<T: Float> {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    tree: Option<TreeNode<T>>,
    n_features: usize,
}

/// Best split found for one node.
struct SplitCandidate<T> {
    feature: usize,
    threshold: T,
    gain: f64,
}

impl<T: Float> DecisionTreeRegressor<T> {
    pub fn new(max_depth: usize, min_samples_split: usize, min_samples_leaf: usize) -> Self {
        DecisionTreeRegressor {
            max_depth,
            min_samples_split,
            min_samples_leaf: min_samples_leaf.max(1),
            tree: None,
            n_features: 0,
        }
    }

    pub fn fit(&mut self, x: &Tensor<T>, y: &Tensor<T>) -> MlResult<()> {
        let rows: Vec<usize> = (0..x.rows()?).collect();
        let features: Vec<usize> = (0..x.cols()?).collect();
        self.fit_subset(x, y, &rows, &features)
    }

    /// Fit on the given rows (repeats allowed, as in a bootstrap sample),
    /// searching splits only over `features`.
    pub fn fit_subset(
        &mut self,
        x: &Tensor<T>,
        y: &Tensor<T>,
        rows: &[usize],
        features: &[usize],
    ) -> MlResult<()> {
        let n = x.rows()?;
        let p = x.cols()?;
        if rows.is_empty() {
            return Err(MlError::EmptyTable);
        }
        if y.numel() != n {
            return Err(MlError::ShapeMismatch {
                expected: vec![n],
                got: y.shape_vec(),
            });
        }
        if let Some(&bad) = rows.iter().find(|&&i| i >= n) {
            return Err(MlError::IndexOutOfBounds { index: bad, axis: 0, size: n });
        }
        if let Some(&bad) = features.iter().find(|&&j| j >= p) {
            return Err(MlError::IndexOutOfBounds { index: bad, axis: 1, size: p });
        }

        self.n_features = p;
        let mut indices = rows.to_vec();
        self.tree = Some(self.build_tree(x.data(), p, y.data(), &mut indices, features, 0));
        Ok(())
    }

    fn build_tree(
        &self,
        x: &[T],
        p: usize,
        y: &[T],
        indices: &mut [usize],
        features: &[usize],
        depth: usize,
    ) -> TreeNode<T> {
        let leaf = TreeNode::Leaf {
            value: Self::mean_value(y, indices),
        };
        if depth >= self.max_depth
            || indices.len() < self.min_samples_split
            || indices.len() < 2 * self.min_samples_leaf
        {
            return leaf;
        }
        let first = y[indices[0]];
        if indices.iter().all(|&i| y[i] == first) {
            return leaf;
        }

        let best = match self.best_split(x, p, y, indices, features) {
            Some(b) => b,
            None => return leaf,
        };

        // Partition in place: left part holds rows with value <= threshold.
        let mut mid = 0;
        for k in 0..indices.len() {
            if x[indices[k] * p + best.feature] <= best.threshold {
                indices.swap(k, mid);
                mid += 1;
            }
        }
        let (left_idx, right_idx) = indices.split_at_mut(mid);
        let left = self.build_tree(x, p, y, left_idx, features, depth + 1);
        let right = self.build_tree(x, p, y, right_idx, features, depth + 1);

        TreeNode::Split {
            feature_idx: best.feature,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Sweep each feature in sorted order, tracking prefix sums so every
    /// candidate threshold is scored in O(1). Maximizes the reduction in
    /// squared error, which is equivalent to minimizing weighted MSE.
    fn best_split(
        &self,
        x: &[T],
        p: usize,
        y: &[T],
        indices: &[usize],
        features: &[usize],
    ) -> Option<SplitCandidate<T>> {
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| y[i].to_f64()).sum();
        let parent_score = total_sum * total_sum / n as f64;
        let min_leaf = self.min_samples_leaf;

        let mut best: Option<SplitCandidate<T>> = None;
        let mut order: Vec<usize> = indices.to_vec();

        for &feature in features {
            order.sort_by(|&a, &b| {
                x[a * p + feature]
                    .partial_cmp(&x[b * p + feature])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += y[order[k]].to_f64();
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf {
                    continue;
                }
                if n_right < min_leaf {
                    break;
                }
                let v = x[order[k] * p + feature];
                let next = x[order[k + 1] * p + feature];
                if !(v < next) {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let score = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / n_right as f64;
                let gain = score - parent_score;
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: (v + next) / T::TWO,
                        gain,
                    });
                }
            }
        }
        best
    }

    fn mean_value(y: &[T], indices: &[usize]) -> T {
        if indices.is_empty() {
            return T::ZERO;
        }
        let sum: T = indices.iter().map(|&i| y[i]).sum();
        sum / T::from_usize(indices.len())
    }

    /// Predict a single feature row.
    pub fn predict_row(&self, row: &[T]) -> MlResult<T> {
        let mut node = self.tree.as_ref().ok_or(MlError::NotFitted("DecisionTreeRegressor"))?;
        if row.len() != self.n_features {
            return Err(MlError::FeatureWidth {
                expected: self.n_features,
                found: row.len(),
            });
        }
        loop {
            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split { feature_idx, threshold, left, right } => {
                    node = if row[*feature_idx] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    pub fn predict(&self, x: &Tensor<T>) -> MlResult<Tensor<T>> {
        let n = x.rows()?;
        let mut preds = Vec::with_capacity(n);
        for i in 0..n {
            preds.push(self.predict_row(x.row_slice(i)?)?);
        }
        Ok(Tensor::from_slice(&preds))
    }

    /// Number of leaves in the fitted tree.
    pub fn n_leaves(&self) -> usize {
        fn count<T: Float>(node: &TreeNode<T>) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.tree.as_ref().map_or(0, count)
    }
}
