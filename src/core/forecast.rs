//! Forecast result structure for holding timestamped predictions.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// One forecast month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastStep {
    pub timestamp: NaiveDate,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Point forecasts with a two-sided 95% interval, first future month first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastResult {
    timestamps: Vec<NaiveDate>,
    mean: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl ForecastResult {
    /// Create a forecast; all four sequences must have the same length.
    pub fn new(
        timestamps: Vec<NaiveDate>,
        mean: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
    ) -> Result<Self> {
        let n = timestamps.len();
        for len in [mean.len(), lower.len(), upper.len()] {
            if len != n {
                return Err(ForecastError::DimensionMismatch {
                    expected: n,
                    got: len,
                });
            }
        }
        Ok(Self {
            timestamps,
            mean,
            lower,
            upper,
        })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Get a single step.
    pub fn step(&self, index: usize) -> Option<ForecastStep> {
        (index < self.horizon()).then(|| ForecastStep {
            timestamp: self.timestamps[index],
            mean: self.mean[index],
            lower: self.lower[index],
            upper: self.upper[index],
        })
    }

    /// The furthest-horizon step.
    pub fn last(&self) -> Option<ForecastStep> {
        self.horizon().checked_sub(1).and_then(|i| self.step(i))
    }

    pub fn steps(&self) -> impl Iterator<Item = ForecastStep> + '_ {
        (0..self.horizon()).filter_map(|i| self.step(i))
    }
}
