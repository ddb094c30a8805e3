use tabml_core::{Float, MlError, MlResult, Tensor};

/// Counts for a binary classifier, positive class = 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

fn is_positive<T: Float>(v: T) -> bool {
    v.to_f64() >= 0.5
}

fn check_lengths<T: Float>(y_true: &Tensor<T>, y_other: &Tensor<T>) -> MlResult<usize> {
    let n = y_true.numel();
    if n == 0 {
        return Err(MlError::EmptyTable);
    }
    if y_other.numel() != n {
        return Err(MlError::ShapeMismatch {
            expected: vec![n],
            got: y_other.shape_vec(),
        });
    }
    Ok(n)
}

/// Compute the binary confusion matrix. Values >= 0.5 count as positive.
pub fn confusion_matrix<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<ConfusionMatrix> {
    check_lengths(y_true, y_pred)?;
    let mut cm = ConfusionMatrix::default();
    for (&t, &p) in y_true.data().iter().zip(y_pred.data().iter()) {
        match (is_positive(t), is_positive(p)) {
            (true, true) => cm.true_positive += 1,
            (false, true) => cm.false_positive += 1,
            (false, false) => cm.true_negative += 1,
            (true, false) => cm.false_negative += 1,
        }
    }
    Ok(cm)
}

/// Compute accuracy: fraction of correct predictions.
pub fn accuracy<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    let cm = confusion_matrix(y_true, y_pred)?;
    Ok((cm.true_positive + cm.true_negative) as f64 / cm.total() as f64)
}

/// Precision of the positive class; 0 when nothing was predicted positive.
pub fn precision<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    let cm = confusion_matrix(y_true, y_pred)?;
    Ok(ratio(cm.true_positive, cm.true_positive + cm.false_positive))
}

/// Recall of the positive class; 0 when there are no positives.
pub fn recall<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    let cm = confusion_matrix(y_true, y_pred)?;
    Ok(ratio(cm.true_positive, cm.true_positive + cm.false_negative))
}

/// F1 score, the harmonic mean of precision and recall.
pub fn f1_score<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    let p = precision(y_true, y_pred)?;
    let r = recall(y_true, y_pred)?;
    if p + r == 0.0 {
        Ok(0.0)
    } else {
        Ok(2.0 * p * r / (p + r))
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Log loss (binary cross-entropy) for probabilistic predictions.
///
/// L = -mean(y * log(p) + (1-y) * log(1-p))
pub fn log_loss<T: Float>(y_true: &Tensor<T>, y_pred_proba: &Tensor<T>) -> MlResult<f64> {
    let n = check_lengths(y_true, y_pred_proba)?;
    let eps = 1e-15;
    let mut total = 0.0;
    for (&t, &p) in y_true.data().iter().zip(y_pred_proba.data().iter()) {
        let y = if is_positive(t) { 1.0 } else { 0.0 };
        let p = p.to_f64().clamp(eps, 1.0 - eps);
        total -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
    }
    Ok(total / n as f64)
}

/// (score, is_positive) pairs sorted by descending score, plus class totals.
fn ranked<T: Float>(
    y_true: &Tensor<T>,
    y_scores: &Tensor<T>,
    metric: &'static str,
) -> MlResult<(Vec<(f64, bool)>, f64, f64)> {
    let n = check_lengths(y_true, y_scores)?;
    let mut pairs: Vec<(f64, bool)> = y_scores
        .data()
        .iter()
        .zip(y_true.data().iter())
        .map(|(&s, &t)| (s.to_f64(), is_positive(t)))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let total_pos = pairs.iter().filter(|(_, t)| *t).count();
    let total_neg = n - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return Err(MlError::SingleClass(metric));
    }
    Ok((pairs, total_pos as f64, total_neg as f64))
}

/// ROC-AUC for binary classification.
///
/// Area under the ROC curve by the trapezoidal rule. Tied scores are
/// consumed as one threshold step, so ties contribute half credit.
/// A label set with only one class has no ROC curve and yields
/// [`MlError::SingleClass`].
pub fn roc_auc<T: Float>(y_true: &Tensor<T>, y_scores: &Tensor<T>) -> MlResult<f64> {
    let (pairs, total_pos, total_neg) = ranked(y_true, y_scores, "ROC-AUC")?;

    let mut auc = 0.0;
    let (mut tp, mut fp) = (0.0, 0.0);
    let (mut prev_tpr, mut prev_fpr) = (0.0, 0.0);
    let mut i = 0;
    while i < pairs.len() {
        let score = pairs[i].0;
        while i < pairs.len() && pairs[i].0 == score {
            if pairs[i].1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        let tpr = tp / total_pos;
        let fpr = fp / total_neg;
        auc += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0;
        prev_tpr = tpr;
        prev_fpr = fpr;
    }
    Ok(auc)
}

/// Area under the precision-recall curve, computed as average precision:
/// the sum over thresholds of `(R_k - R_{k-1}) * P_k`.
pub fn pr_auc<T: Float>(y_true: &Tensor<T>, y_scores: &Tensor<T>) -> MlResult<f64> {
    let (pairs, total_pos, _) = ranked(y_true, y_scores, "PR-AUC")?;

    let mut ap = 0.0;
    let (mut tp, mut seen) = (0.0, 0.0);
    let mut prev_recall = 0.0;
    let mut i = 0;
    while i < pairs.len() {
        let score = pairs[i].0;
        while i < pairs.len() && pairs[i].0 == score {
            if pairs[i].1 {
                tp += 1.0;
            }
            seen += 1.0;
            i += 1;
        }
        let recall = tp / total_pos;
        ap += (recall - prev_recall) * (tp / seen);
        prev_recall = recall;
    }
    Ok(ap)
}
