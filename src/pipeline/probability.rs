//! Converts the last forecast step into outcome-bin probabilities.
//!
//! The forecast distribution at the target month is taken as
//! `Normal(mean, se)`, with `se` backed out of the 95% interval as
//! `(upper - lower) / (2 * 1.95996)`.

use crate::core::ForecastResult;
use crate::error::{ForecastError, Result};
use crate::utils::stats::{normal_cdf, INTERVAL_Z_ROUNDED};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A named range of outcomes; `None` means unbounded on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

impl PredictionBin {
    pub fn new(name: impl Into<String>, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self {
            name: name.into(),
            lower,
            upper,
        }
    }

    /// Lower edge, `-inf` when unbounded.
    pub fn lower_edge(&self) -> f64 {
        self.lower.unwrap_or(f64::NEG_INFINITY)
    }

    /// Upper edge, `+inf` when unbounded.
    pub fn upper_edge(&self) -> f64 {
        self.upper.unwrap_or(f64::INFINITY)
    }

    fn probability(&self, mean: f64, se: f64) -> f64 {
        match (self.lower, self.upper) {
            (None, None) => 1.0,
            (None, Some(upper)) => normal_cdf(upper, mean, se),
            (Some(lower), None) => 1.0 - normal_cdf(lower, mean, se),
            (Some(lower), Some(upper)) => normal_cdf(upper, mean, se) - normal_cdf(lower, mean, se),
        }
    }
}

/// Probability mass assigned to one bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinProbability {
    pub name: String,
    pub probability: f64,
}

/// Bin probabilities for the target month, ordered by lower edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinProbabilities {
    /// Forecast mean at the target month.
    pub mean: f64,
    /// Standard error backed out of the interval.
    pub standard_error: f64,
    pub bins: Vec<BinProbability>,
}

impl BinProbabilities {
    /// Total probability across all bins.
    pub fn total(&self) -> f64 {
        self.bins.iter().map(|b| b.probability).sum()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.bins
            .iter()
            .find(|b| b.name == name)
            .map(|b| b.probability)
    }
}

/// Bins sorted by lower edge; equal edges keep their configured order.
pub fn sorted_bins(bins: &[PredictionBin]) -> Vec<&PredictionBin> {
    let mut sorted: Vec<&PredictionBin> = bins.iter().collect();
    sorted.sort_by(|a, b| a.lower_edge().total_cmp(&b.lower_edge()));
    sorted
}

/// Assign probabilities to `bins` from the last step of `forecast`.
///
/// # Example
/// ```
/// use anomaly_forecast::core::ForecastResult;
/// use anomaly_forecast::core::month::month_start;
/// use anomaly_forecast::pipeline::probability::{convert, PredictionBin};
///
/// let month = month_start(2025, 9).unwrap();
/// let forecast = ForecastResult::new(vec![month], vec![110.0], vec![100.2], vec![119.8]).unwrap();
/// let bins = vec![
///     PredictionBin::new("low", None, Some(110.0)),
///     PredictionBin::new("high", Some(110.0), None),
/// ];
/// let probs = convert(&forecast, &bins).unwrap();
/// assert!((probs.get("low").unwrap() - 0.5).abs() < 1e-9);
/// ```
pub fn convert(forecast: &ForecastResult, bins: &[PredictionBin]) -> Result<BinProbabilities> {
    let last = forecast.last().ok_or(ForecastError::EmptyData)?;
    let se = (last.upper - last.lower) / (2.0 * INTERVAL_Z_ROUNDED);
    if !se.is_finite() || se <= 0.0 {
        return Err(ForecastError::ComputationError(format!(
            "forecast interval gives unusable standard error {se}"
        )));
    }
    if !last.mean.is_finite() {
        return Err(ForecastError::ComputationError(
            "forecast mean is not finite".to_string(),
        ));
    }

    let bins = sorted_bins(bins)
        .into_iter()
        .map(|bin| BinProbability {
            name: bin.name.clone(),
            probability: bin.probability(last.mean, se),
        })
        .collect();

    Ok(BinProbabilities {
        mean: last.mean,
        standard_error: se,
        bins,
    })
}

/// A way in which a bin list fails to cover the real line exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum PartitionIssue {
    /// Outcomes below the lowest bin are not covered.
    OpenBelow { bin: String, edge: f64 },
    /// Outcomes above the highest bin are not covered.
    OpenAbove { bin: String, edge: f64 },
    /// Outcomes between two adjacent bins are not covered.
    Gap {
        below: String,
        above: String,
        from: f64,
        to: f64,
    },
    /// Outcomes counted by two adjacent bins.
    Overlap {
        below: String,
        above: String,
        from: f64,
        to: f64,
    },
}

impl fmt::Display for PartitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenBelow { bin, edge } => {
                write!(f, "nothing covers outcomes below {edge} (lowest bin '{bin}')")
            }
            Self::OpenAbove { bin, edge } => {
                write!(f, "nothing covers outcomes above {edge} (highest bin '{bin}')")
            }
            Self::Gap {
                below,
                above,
                from,
                to,
            } => write!(f, "gap between '{below}' and '{above}' over ({from}, {to})"),
            Self::Overlap {
                below,
                above,
                from,
                to,
            } => write!(f, "'{below}' and '{above}' overlap over ({from}, {to})"),
        }
    }
}

/// Report gaps and overlaps in a bin list.
///
/// Probabilities only sum to one when this returns nothing.
pub fn check_partition(bins: &[PredictionBin]) -> Vec<PartitionIssue> {
    let sorted = sorted_bins(bins);
    let mut issues = Vec::new();

    let Some(first) = sorted.first() else {
        return issues;
    };
    if let Some(edge) = first.lower {
        issues.push(PartitionIssue::OpenBelow {
            bin: first.name.clone(),
            edge,
        });
    }

    let mut reach = first.upper_edge();
    let mut reach_bin = &first.name;
    for bin in sorted.iter().skip(1) {
        let lower = bin.lower_edge();
        match reach.partial_cmp(&lower) {
            Some(Ordering::Less) => issues.push(PartitionIssue::Gap {
                below: reach_bin.clone(),
                above: bin.name.clone(),
                from: reach,
                to: lower,
            }),
            Some(Ordering::Greater) => issues.push(PartitionIssue::Overlap {
                below: reach_bin.clone(),
                above: bin.name.clone(),
                from: lower,
                to: reach.min(bin.upper_edge()),
            }),
            _ => {}
        }
        if bin.upper_edge() >= reach {
            reach = bin.upper_edge();
            reach_bin = &bin.name;
        }
    }

    if reach.is_finite() {
        issues.push(PartitionIssue::OpenAbove {
            bin: reach_bin.clone(),
            edge: reach,
        });
    }
    issues
}
