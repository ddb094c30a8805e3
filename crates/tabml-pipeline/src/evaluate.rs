use serde::{Deserialize, Serialize};
use tabml_core::{MlError, MlResult, Table, Tensor};
use tabml_metrics::{self as metrics, ConfusionMatrix};
use tabml_preprocessing::k_fold_indices;
use tracing::{debug, info};

use crate::pipeline::{Model, Pipeline, PREDICTED_LABEL_COLUMN, PROBABILITY_COLUMN, SCORE_COLUMN};
use crate::trainer::Task;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub r_squared: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Area under the ROC curve.
    pub auc: f64,
    /// Area under the precision-recall curve.
    pub auprc: f64,
    pub log_loss: f64,
    pub confusion: ConfusionMatrix,
}

fn expect_task(model: &Model, task: Task) -> MlResult<()> {
    if model.task() != task {
        return Err(MlError::InvalidOperation(format!(
            "{:?} metrics requested from a {:?} model",
            task,
            model.task()
        )));
    }
    Ok(())
}

/// Score `table` with `model` and compare against its label column.
pub fn evaluate_regression(model: &Model, table: &Table) -> MlResult<RegressionMetrics> {
    expect_task(model, Task::Regression)?;
    if table.is_empty() {
        return Err(MlError::EmptyTable);
    }
    let scored = model.transform(table)?;
    let truth = Tensor::from_slice(scored.numeric(model.label())?);
    let scores = Tensor::from_slice(scored.numeric(SCORE_COLUMN)?);

    let result = RegressionMetrics {
        mae: metrics::mae(&truth, &scores)?,
        mse: metrics::mse(&truth, &scores)?,
        rmse: metrics::rmse(&truth, &scores)?,
        r_squared: metrics::r2_score(&truth, &scores)?,
    };
    info!(rows = table.n_rows(), r_squared = result.r_squared, "evaluated regression model");
    Ok(result)
}

/// Score `table` with a binary model and compare against its label column.
///
/// A table holding only one class has no ranking metrics and fails with
/// [`MlError::SingleClass`].
pub fn evaluate_binary(model: &Model, table: &Table) -> MlResult<BinaryMetrics> {
    expect_task(model, Task::BinaryClassification)?;
    if table.is_empty() {
        return Err(MlError::EmptyTable);
    }
    let scored = model.transform(table)?;
    let truth = Tensor::from_slice(scored.numeric(model.label())?);
    let predicted = Tensor::from_slice(scored.numeric(PREDICTED_LABEL_COLUMN)?);
    let probability = Tensor::from_slice(scored.numeric(PROBABILITY_COLUMN)?);

    let result = BinaryMetrics {
        accuracy: metrics::accuracy(&truth, &predicted)?,
        precision: metrics::precision(&truth, &predicted)?,
        recall: metrics::recall(&truth, &predicted)?,
        f1: metrics::f1_score(&truth, &predicted)?,
        auc: metrics::roc_auc(&truth, &probability)?,
        auprc: metrics::pr_auc(&truth, &probability)?,
        log_loss: metrics::log_loss(&truth, &probability)?,
        confusion: metrics::confusion_matrix(&truth, &predicted)?,
    };
    info!(
        rows = table.n_rows(),
        accuracy = result.accuracy,
        auc = result.auc,
        "evaluated binary model"
    );
    Ok(result)
}

/// Metrics of one cross-validation fold.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult<M> {
    pub fold: usize,
    pub metrics: M,
}

impl Pipeline {
    /// K-fold cross-validation. Rows are shuffled with `seed` and cut into
    /// `folds` disjoint parts; each part is scored by `evaluate` against a
    /// fresh fit on the remaining parts.
    pub fn cross_validate<M, F>(
        &self,
        table: &Table,
        folds: usize,
        seed: Option<u64>,
        evaluate: F,
    ) -> MlResult<Vec<FoldResult<M>>>
    where
        F: Fn(&Model, &Table) -> MlResult<M>,
    {
        let parts = k_fold_indices(table.n_rows(), folds, seed)?;
        let mut results = Vec::with_capacity(folds);
        for (fold, held_out) in parts.iter().enumerate() {
            let mut train_idx: Vec<usize> = parts
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != fold)
                .flat_map(|(_, idx)| idx.iter().copied())
                .collect();
            train_idx.sort_unstable();
            let mut test_idx = held_out.clone();
            test_idx.sort_unstable();

            let train = table.select_rows(&train_idx)?;
            let test = table.select_rows(&test_idx)?;
            let model = self.fit(&train)?;
            let metrics = evaluate(&model, &test)?;
            debug!(fold, train_rows = train.n_rows(), test_rows = test.n_rows(), "scored fold");
            results.push(FoldResult { fold, metrics });
        }
        info!(folds, rows = table.n_rows(), "cross-validation complete");
        Ok(results)
    }
}

pub fn cross_validate_regression(
    pipeline: &Pipeline,
    table: &Table,
    folds: usize,
    seed: Option<u64>,
) -> MlResult<Vec<FoldResult<RegressionMetrics>>> {
    pipeline.cross_validate(table, folds, seed, evaluate_regression)
}

pub fn cross_validate_binary(
    pipeline: &Pipeline,
    table: &Table,
    folds: usize,
    seed: Option<u64>,
) -> MlResult<Vec<FoldResult<BinaryMetrics>>> {
    pipeline.cross_validate(table, folds, seed, evaluate_binary)
}

/// Average one metric over all folds.
pub fn mean_metric<M>(results: &[FoldResult<M>], metric: impl Fn(&M) -> f64) -> MlResult<f64> {
    if results.is_empty() {
        return Err(MlError::EmptyTable);
    }
    let total: f64 = results.iter().map(|r| metric(&r.metrics)).sum();
    Ok(total / results.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::TrainerConfig;
    use crate::transform::{Concatenate, FeaturizeText, OneHotEncoding};
    use approx::assert_relative_eq;
    use tabml_core::Column;

    fn linear_table(n: usize) -> Table {
        let a: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64).collect();
        let label: Vec<f64> = a.iter().zip(&b).map(|(a, b)| 3.0 * a - 2.0 * b + 1.0).collect();
        Table::from_columns(vec![
            ("A".into(), Column::Numeric(a)),
            ("B".into(), Column::Numeric(b)),
            ("Label".into(), Column::Numeric(label)),
        ])
        .unwrap()
    }

    fn linear_pipeline() -> Pipeline {
        Pipeline::new()
            .append(Concatenate::new("Features", &["A", "B"]))
            .set_trainer(TrainerConfig::sdca().build(Some(5)))
    }

    #[test]
    fn test_r_squared_on_noiseless_data() {
        let table = linear_table(30);
        let model = linear_pipeline().fit(&table).unwrap();
        let m = evaluate_regression(&model, &table).unwrap();
        assert_relative_eq!(m.r_squared, 1.0, epsilon = 1e-3);
        assert_relative_eq!(m.rmse, m.mse.sqrt(), epsilon = 1e-12);
        assert!(m.mae < 0.5);
    }

    #[test]
    fn test_zero_variance_labels() {
        let table = linear_table(10);
        let model = linear_pipeline().fit(&table).unwrap();
        let flat = table.with_column("Label", Column::Numeric(vec![4.0; 10])).unwrap();
        assert!(matches!(evaluate_regression(&model, &flat), Err(MlError::ZeroVariance)));
    }

    #[test]
    fn test_empty_evaluation_table() {
        let table = linear_table(10);
        let model = linear_pipeline().fit(&table).unwrap();
        let empty = table.select_rows(&[]).unwrap();
        assert!(matches!(evaluate_regression(&model, &empty), Err(MlError::EmptyTable)));
    }

    #[test]
    fn test_wrong_task_is_rejected() {
        let table = linear_table(10);
        let model = linear_pipeline().fit(&table).unwrap();
        assert!(matches!(evaluate_binary(&model, &table), Err(MlError::InvalidOperation(_))));
    }

    #[test]
    fn test_cross_validation_per_fold() {
        let table = linear_table(23);
        let results = cross_validate_regression(&linear_pipeline(), &table, 5, Some(9)).unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results.iter().map(|r| r.fold).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        let mean = mean_metric(&results, |m| m.r_squared).unwrap();
        assert!(mean > 0.99, "mean r2 {}", mean);
    }

    #[test]
    fn test_cross_validation_rejects_bad_fold_counts() {
        let table = linear_table(4);
        let pipeline = linear_pipeline();
        assert!(matches!(
            cross_validate_regression(&pipeline, &table, 1, Some(1)),
            Err(MlError::InvalidConfig(_))
        ));
        assert!(matches!(
            cross_validate_regression(&pipeline, &table, 5, Some(1)),
            Err(MlError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cross_validation_with_custom_evaluator() {
        let table = linear_table(12);
        let sizes = linear_pipeline()
            .cross_validate(&table, 4, Some(2), |_, test| Ok(test.n_rows()))
            .unwrap();
        assert_eq!(sizes.iter().map(|r| r.metrics).sum::<usize>(), 12);
        assert!(sizes.iter().all(|r| r.metrics == 3));
    }

    #[test]
    fn test_mean_metric_of_nothing() {
        let empty: Vec<FoldResult<RegressionMetrics>> = Vec::new();
        assert!(mean_metric(&empty, |m| m.r_squared).is_err());
    }

    fn messages() -> Table {
        let spam = [
            "win a free prize now",
            "free cash bonus click now",
            "claim your free prize today",
            "cheap meds online save $$$",
            "you won cash click here",
            "free offer limited time click",
        ];
        let ham = [
            "see you at lunch tomorrow",
            "the meeting moved to friday",
            "please review the attached notes",
            "can we talk about the project",
            "thanks for the forecast update",
            "team dinner next week",
        ];
        let mut text = Vec::new();
        let mut label = Vec::new();
        for (s, h) in spam.iter().zip(ham.iter()) {
            text.push(s.to_string());
            label.push(1.0);
            text.push(h.to_string());
            label.push(0.0);
        }
        Table::from_columns(vec![
            ("Label".into(), Column::Numeric(label)),
            ("Text".into(), Column::Text(text)),
        ])
        .unwrap()
    }

    #[test]
    fn test_binary_metrics_on_separable_text() {
        let table = messages();
        let model = Pipeline::new()
            .append(FeaturizeText::new("Text", "Features"))
            .set_trainer(TrainerConfig::logistic().build(Some(3)))
            .fit(&table)
            .unwrap();
        let m = evaluate_binary(&model, &table).unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.f1, 1.0);
        assert_relative_eq!(m.auc, 1.0, epsilon = 1e-12);
        assert_eq!(m.confusion.total(), 12);
        assert!(m.log_loss > 0.0);
    }

    #[test]
    fn test_single_class_evaluation_is_surfaced() {
        let table = messages();
        let model = Pipeline::new()
            .append(FeaturizeText::new("Text", "Features"))
            .set_trainer(TrainerConfig::logistic().build(Some(3)))
            .fit(&table)
            .unwrap();
        let spam_only = table.select_rows(&[0, 2, 4]).unwrap();
        assert!(matches!(evaluate_binary(&model, &spam_only), Err(MlError::SingleClass(_))));
    }

    #[test]
    fn test_one_hot_unseen_category_in_fold() {
        let table = Table::from_columns(vec![
            (
                "UseCode".into(),
                Column::Text(vec!["Condominium".into(), "Condominium".into(), "Duplex".into(), "Condominium".into()]),
            ),
            ("Rooms".into(), Column::Numeric(vec![3.0, 4.0, 6.0, 5.0])),
            ("Label".into(), Column::Numeric(vec![300.0, 400.0, 900.0, 500.0])),
        ])
        .unwrap();
        let pipeline = Pipeline::new()
            .append(OneHotEncoding::new("UseCode", "UseCodeEncoded"))
            .append(Concatenate::new("Features", &["UseCodeEncoded", "Rooms"]))
            .set_trainer(TrainerConfig::fast_forest(10, 1).build(Some(4)));
        // Train on condominiums only; the duplex row must still score.
        let model = pipeline.fit(&table.select_rows(&[0, 1, 3]).unwrap()).unwrap();
        let scored = model.transform(&table.select_rows(&[2]).unwrap()).unwrap();
        let score = scored.numeric(SCORE_COLUMN).unwrap()[0];
        assert!((300.0..=500.0).contains(&score));
    }
}
