use tabml_core::{Float, MlError, MlResult, Tensor};

fn check_lengths<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<usize> {
    let n = y_true.numel();
    if n == 0 {
        return Err(MlError::EmptyTable);
    }
    if y_pred.numel() != n {
        return Err(MlError::ShapeMismatch {
            expected: vec![n],
            got: y_pred.shape_vec(),
        });
    }
    let finite = |t: &Tensor<T>| t.data().iter().all(|v| v.to_f64().is_finite());
    if !finite(y_true) || !finite(y_pred) {
        return Err(MlError::InvalidOperation(
            "regression metric over non-finite values".into(),
        ));
    }
    Ok(n)
}

/// Mean Squared Error.
pub fn mse<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    let n = check_lengths(y_true, y_pred)?;
    let sum: f64 = y_true
        .data()
        .iter()
        .zip(y_pred.data().iter())
        .map(|(&t, &p)| {
            let d = (t - p).to_f64();
            d * d
        })
        .sum();
    Ok(sum / n as f64)
}

/// Root Mean Squared Error.
pub fn rmse<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    Ok(mse(y_true, y_pred)?.sqrt())
}

/// Mean Absolute Error.
pub fn mae<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    let n = check_lengths(y_true, y_pred)?;
    let sum: f64 = y_true
        .data()
        .iter()
        .zip(y_pred.data().iter())
        .map(|(&t, &p)| (t - p).to_f64().abs())
        .sum();
    Ok(sum / n as f64)
}

/// R² (coefficient of determination), `1 - SS_res / SS_tot`.
///
/// Labels with zero variance make the ratio undefined and are reported as
/// [`MlError::ZeroVariance`] rather than a NaN.
pub fn r2_score<T: Float>(y_true: &Tensor<T>, y_pred: &Tensor<T>) -> MlResult<f64> {
    let n = check_lengths(y_true, y_pred)? as f64;
    let first = y_true.data()[0];
    if y_true.data().iter().all(|&v| v == first) {
        return Err(MlError::ZeroVariance);
    }
    let mean_true: f64 = y_true.data().iter().map(|v| v.to_f64()).sum::<f64>() / n;

    let ss_res: f64 = y_true
        .data()
        .iter()
        .zip(y_pred.data().iter())
        .map(|(&t, &p)| {
            let d = t.to_f64() - p.to_f64();
            d * d
        })
        .sum();

    let ss_tot: f64 = y_true
        .data()
        .iter()
        .map(|&t| {
            let d = t.to_f64() - mean_true;
            d * d
        })
        .sum();

    // Distinct values can still round to no spread around the mean.
    if ss_tot <= f64::EPSILON * n * mean_true * mean_true {
        return Err(MlError::ZeroVariance);
    }
    Ok(1.0 - ss_res / ss_tot)
}
