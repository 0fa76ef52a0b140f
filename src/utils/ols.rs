//! Least-squares helpers for regression start values.

use crate::error::{ForecastError, Result};

/// Least-squares slope of `y` on `x` through the origin.
///
/// Used to seed the exogenous coefficient before likelihood maximisation.
/// A regressor with no variation yields a zero slope.
pub fn ols_slope(y: &[f64], x: &[f64]) -> Result<f64> {
    if y.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    if x.len() != y.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: y.len(),
            got: x.len(),
        });
    }

    let xtx: f64 = x.iter().map(|v| v * v).sum();
    if xtx <= f64::EPSILON {
        return Ok(0.0);
    }
    let xty: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    Ok(xty / xtx)
}

/// Residuals `y - slope * x`.
pub fn ols_residuals(y: &[f64], x: &[f64], slope: f64) -> Vec<f64> {
    y.iter().zip(x).map(|(a, b)| a - slope * b).collect()
}
