use serde::{Deserialize, Serialize};
use tabml_core::{Column, Float, MlError, MlResult, Row, Table, Tensor, Value, LABEL_COLUMN};
use tracing::{debug, info};

use crate::trainer::{Estimator, Task, Trainer};
use crate::transform::{Step, Transformer};

/// Default name of the feature-vector column the trainer reads.
pub const FEATURES_COLUMN: &str = "Features";
/// Column appended by [`Model::transform`] holding the raw score.
pub const SCORE_COLUMN: &str = "Score";
/// Column appended for binary models: sigmoid of the score.
pub const PROBABILITY_COLUMN: &str = "Probability";
/// Column appended for binary models: 1.0 when probability >= 0.5.
pub const PREDICTED_LABEL_COLUMN: &str = "PredictedLabel";

/// An unfitted chain of transforms followed by a trainer.
///
/// `fit` never mutates the pipeline; it fits a copy and returns a [`Model`],
/// so the same pipeline can be fit repeatedly (e.g. once per fold).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    steps: Vec<Step>,
    trainer: Option<Trainer>,
    features: String,
    label: String,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline {
            steps: Vec::new(),
            trainer: None,
            features: FEATURES_COLUMN.to_string(),
            label: LABEL_COLUMN.to_string(),
        }
    }

    /// Add a transform step after the existing ones.
    pub fn append(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Set the final trainer.
    pub fn set_trainer(mut self, trainer: Trainer) -> Self {
        self.trainer = Some(trainer);
        self
    }

    /// Column holding the label (defaults to `Label`).
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Column holding the feature vector (defaults to `Features`).
    pub fn with_features(mut self, features: &str) -> Self {
        self.features = features.to_string();
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// External columns the chain reads, in first-use order. A column
    /// produced by an earlier step is not external.
    pub fn required_inputs(&self) -> Vec<String> {
        required_inputs(&self.steps, &self.features)
    }

    /// Fit every step in order, then the trainer on the resulting
    /// feature column and the label column.
    pub fn fit(&self, table: &Table) -> MlResult<Model> {
        let trainer = self
            .trainer
            .clone()
            .ok_or_else(|| MlError::InvalidConfig("pipeline has no trainer".to_string()))?;
        if table.is_empty() {
            return Err(MlError::EmptyTable);
        }

        let mut steps = self.steps.clone();
        let mut current = table.clone();
        for step in &mut steps {
            current = step.fit_transform(&current)?;
            debug!(step = step.name(), output = step.output(), "fitted step");
        }

        let x = current.matrix(&self.features)?;
        let y = Tensor::from_slice(current.numeric(&self.label)?);
        let feature_width = x.cols()?;

        let mut trainer = trainer;
        trainer.fit(&x, &y)?;
        info!(
            trainer = trainer.name(),
            rows = table.n_rows(),
            features = feature_width,
            "trained model"
        );

        Ok(Model {
            steps,
            task: trainer.task(),
            trainer,
            features: self.features.clone(),
            label: self.label.clone(),
            feature_width,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn required_inputs(steps: &[Step], features: &str) -> Vec<String> {
    fn need(name: &str, produced: &[&str], required: &mut Vec<String>) {
        if !produced.contains(&name) && !required.iter().any(|r| r == name) {
            required.push(name.to_string());
        }
    }

    let mut produced: Vec<&str> = Vec::new();
    let mut required: Vec<String> = Vec::new();
    for step in steps {
        for input in step.inputs() {
            need(input, &produced, &mut required);
        }
        produced.push(step.output());
    }
    need(features, &produced, &mut required);
    required
}

/// Output of a single-row prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Prediction {
    Regression { score: f64 },
    Binary { score: f64, probability: f64, label: bool },
}

impl Prediction {
    pub fn score(&self) -> f64 {
        match *self {
            Prediction::Regression { score } | Prediction::Binary { score, .. } => score,
        }
    }
}

/// A fitted pipeline. Read-only; safe to share between threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    steps: Vec<Step>,
    trainer: Trainer,
    task: Task,
    features: String,
    label: String,
    feature_width: usize,
}

impl Model {
    pub fn task(&self) -> Task {
        self.task
    }

    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn feature_width(&self) -> usize {
        self.feature_width
    }

    pub fn required_inputs(&self) -> Vec<String> {
        required_inputs(&self.steps, &self.features)
    }

    /// Apply the fitted steps and the trainer to every row, appending
    /// `Score` (plus `Probability` and `PredictedLabel` for binary models).
    pub fn transform(&self, table: &Table) -> MlResult<Table> {
        let mut current = table.clone();
        for step in &self.steps {
            current = step.transform(&current)?;
        }

        let x = current.matrix(&self.features)?;
        let found = x.cols()?;
        if found != self.feature_width {
            return Err(MlError::FeatureWidth {
                expected: self.feature_width,
                found,
            });
        }

        let scores = self.trainer.predict(&x)?.into_data();
        match self.task {
            Task::Regression => current.with_column(SCORE_COLUMN, Column::Numeric(scores)),
            Task::BinaryClassification => {
                let probabilities: Vec<f64> = scores.iter().map(|s| sigmoid(*s)).collect();
                let labels: Vec<f64> = probabilities
                    .iter()
                    .map(|&p| if p >= 0.5 { 1.0 } else { 0.0 })
                    .collect();
                current
                    .with_column(SCORE_COLUMN, Column::Numeric(scores))?
                    .with_column(PROBABILITY_COLUMN, Column::Numeric(probabilities))?
                    .with_column(PREDICTED_LABEL_COLUMN, Column::Numeric(labels))
            }
        }
    }

    /// Predict one row. Every column in [`Model::required_inputs`] must be
    /// present; the label is not needed.
    pub fn predict(&self, row: &Row) -> MlResult<Prediction> {
        for field in self.required_inputs() {
            if !row.contains(&field) {
                return Err(MlError::MissingField { field });
            }
        }
        let scored = self.transform(&Table::from_row(row))?;
        let score = first(scored.numeric(SCORE_COLUMN)?)?;
        Ok(match self.task {
            Task::Regression => Prediction::Regression { score },
            Task::BinaryClassification => {
                let probability = first(scored.numeric(PROBABILITY_COLUMN)?)?;
                Prediction::Binary {
                    score,
                    probability,
                    label: probability >= 0.5,
                }
            }
        })
    }
}

fn first(values: &[f64]) -> MlResult<f64> {
    values.first().copied().ok_or(MlError::EmptyTable)
}

fn sigmoid(z: f64) -> f64 {
    <f64 as Float>::sigmoid(z)
}

/// Convenience for building prediction rows from `(name, value)` pairs.
pub fn row_of<V: Into<Value>>(pairs: impl IntoIterator<Item = (&'static str, V)>) -> Row {
    let mut row = Row::new();
    for (name, value) in pairs {
        row.insert(name, value);
    }
    row
}
