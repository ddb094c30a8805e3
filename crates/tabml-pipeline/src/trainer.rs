use serde::{Deserialize, Serialize};
use tabml_core::{MlResult, Tensor};
use tabml_linear::{LogisticRegression, SdcaRegressor};
use tabml_tree::RandomForestRegressor;

/// Trait for supervised estimators.
pub trait Estimator {
    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()>;
    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>>;
}

impl Estimator for SdcaRegressor<f64> {
    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        SdcaRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        SdcaRegressor::predict(self, x)
    }
}

impl Estimator for RandomForestRegressor<f64> {
    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        RandomForestRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        RandomForestRegressor::predict(self, x)
    }
}

impl Estimator for LogisticRegression<f64> {
    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        LogisticRegression::fit(self, x, y)
    }

    /// Raw margin; the probability is derived by the model.
    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        self.decision_function(x)
    }
}

/// What a trainer's score means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    Regression,
    BinaryClassification,
}

/// The learning algorithm at the end of a pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Trainer {
    /// Random-forest regression.
    FastForest(RandomForestRegressor<f64>),
    /// Least-squares regression by coordinate descent.
    Sdca(SdcaRegressor<f64>),
    /// Binary logistic regression.
    Logistic(LogisticRegression<f64>),
}

impl Trainer {
    pub fn task(&self) -> Task {
        match self {
            Trainer::FastForest(_) | Trainer::Sdca(_) => Task::Regression,
            Trainer::Logistic(_) => Task::BinaryClassification,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trainer::FastForest(_) => "FastForest",
            Trainer::Sdca(_) => "Sdca",
            Trainer::Logistic(_) => "Logistic",
        }
    }

    fn estimator(&self) -> &dyn Estimator {
        match self {
            Trainer::FastForest(m) => m,
            Trainer::Sdca(m) => m,
            Trainer::Logistic(m) => m,
        }
    }

    fn estimator_mut(&mut self) -> &mut dyn Estimator {
        match self {
            Trainer::FastForest(m) => m,
            Trainer::Sdca(m) => m,
            Trainer::Logistic(m) => m,
        }
    }
}

impl Estimator for Trainer {
    fn fit(&mut self, x: &Tensor<f64>, y: &Tensor<f64>) -> MlResult<()> {
        self.estimator_mut().fit(x, y)
    }

    fn predict(&self, x: &Tensor<f64>) -> MlResult<Tensor<f64>> {
        self.estimator().predict(x)
    }
}

fn default_trees() -> usize {
    100
}

fn default_min_leaf() -> usize {
    2
}

fn default_max_depth() -> usize {
    16
}

fn default_feature_fraction() -> f64 {
    0.7
}

fn default_l2() -> f64 {
    1e-4
}

fn default_max_iter() -> usize {
    1000
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_epochs() -> usize {
    200
}

/// Serializable trainer hyperparameters.
///
/// ```json
/// { "kind": "fast_forest", "n_trees": 200, "min_samples_leaf": 4 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainerConfig {
    FastForest {
        #[serde(default = "default_trees")]
        n_trees: usize,
        #[serde(default = "default_min_leaf")]
        min_samples_leaf: usize,
        #[serde(default = "default_max_depth")]
        max_depth: usize,
        #[serde(default = "default_feature_fraction")]
        feature_fraction: f64,
    },
    Sdca {
        #[serde(default)]
        l1: f64,
        #[serde(default = "default_l2")]
        l2: f64,
        #[serde(default = "default_max_iter")]
        max_iter: usize,
    },
    Logistic {
        #[serde(default = "default_learning_rate")]
        learning_rate: f64,
        #[serde(default = "default_epochs")]
        epochs: usize,
        #[serde(default = "default_l2")]
        l2: f64,
    },
}

impl TrainerConfig {
    pub fn fast_forest(n_trees: usize, min_samples_leaf: usize) -> Self {
        TrainerConfig::FastForest {
            n_trees,
            min_samples_leaf,
            max_depth: default_max_depth(),
            feature_fraction: default_feature_fraction(),
        }
    }

    pub fn sdca() -> Self {
        TrainerConfig::Sdca {
            l1: 0.0,
            l2: default_l2(),
            max_iter: default_max_iter(),
        }
    }

    pub fn logistic() -> Self {
        TrainerConfig::Logistic {
            learning_rate: default_learning_rate(),
            epochs: default_epochs(),
            l2: default_l2(),
        }
    }

    /// Instantiate the configured algorithm with the given seed.
    pub fn build(&self, seed: Option<u64>) -> Trainer {
        match *self {
            TrainerConfig::FastForest {
                n_trees,
                min_samples_leaf,
                max_depth,
                feature_fraction,
            } => Trainer::FastForest(
                RandomForestRegressor::new(n_trees, min_samples_leaf, feature_fraction)
                    .with_max_depth(max_depth)
                    .with_seed(seed),
            ),
            TrainerConfig::Sdca { l1, l2, max_iter } => {
                Trainer::Sdca(SdcaRegressor::new(l1, l2, max_iter).with_seed(seed))
            }
            TrainerConfig::Logistic {
                learning_rate,
                epochs,
                l2,
            } => Trainer::Logistic(
                LogisticRegression::new(learning_rate, epochs)
                    .with_l2(l2)
                    .with_seed(seed),
            ),
        }
    }
}
