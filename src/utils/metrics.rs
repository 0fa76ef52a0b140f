//! Accuracy metrics for backtest scoring.

use crate::error::{ForecastError, Result};

/// Root mean squared error between held-out values and their forecasts.
///
/// Non-finite values propagate into the result; the champion selection
/// ignores such scores.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }

    let sq_sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((sq_sum / actual.len() as f64).sqrt())
}
