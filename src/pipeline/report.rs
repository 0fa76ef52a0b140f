//! Human- and machine-readable summary of a forecast run.

use super::backtest::{BacktestCandidate, BacktestOutcome};
use super::forecast::FinalForecast;
use crate::core::month::format_month;
use crate::error::{ForecastError, Result};
use crate::models::sarimax::{ModelOrder, SeasonalOrder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One evaluated backtest window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowLine {
    pub window: usize,
    pub split: String,
    pub rmse: f64,
    pub order: ModelOrder,
    pub seasonal_order: SeasonalOrder,
    pub champion: bool,
}

/// One skipped backtest window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLine {
    pub window: usize,
    pub reason: String,
}

/// The ENSO model and its value at the target month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsoOutlook {
    pub order: ModelOrder,
    pub seasonal_order: SeasonalOrder,
    pub aic: f64,
    pub value: f64,
}

/// One month of the final forecast path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathLine {
    pub month: String,
    pub enso: f64,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Model probability of one bin next to its reference probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinLine {
    pub name: String,
    pub probability: f64,
    pub reference: Option<f64>,
}

/// Summary of the horse race and the final forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub target: String,
    pub last_observation: String,
    pub horizon: usize,
    pub windows: Vec<WindowLine>,
    pub skipped: Vec<SkippedLine>,
    pub champion: WindowLine,
    pub enso: EnsoOutlook,
    pub path: Vec<PathLine>,
    pub mean: f64,
    pub standard_error: f64,
    pub bins: Vec<BinLine>,
}

impl Report {
    pub fn new(
        backtest: &BacktestOutcome,
        forecast: &FinalForecast,
        reference: &BTreeMap<String, f64>,
    ) -> Self {
        let line = |c: &BacktestCandidate| WindowLine {
            window: c.window,
            split: format_month(c.split),
            rmse: c.rmse,
            order: c.order,
            seasonal_order: c.seasonal_order,
            champion: backtest.is_champion(c),
        };

        Self {
            target: format_month(forecast.target),
            last_observation: format_month(forecast.last_observation),
            horizon: forecast.horizon,
            windows: backtest.candidates.iter().map(line).collect(),
            skipped: backtest
                .skipped
                .iter()
                .map(|s| SkippedLine {
                    window: s.window,
                    reason: s.reason.clone(),
                })
                .collect(),
            champion: line(&backtest.champion),
            enso: EnsoOutlook {
                order: forecast.enso_selection.order,
                seasonal_order: forecast.enso_selection.seasonal_order,
                aic: forecast.enso_selection.aic,
                value: forecast
                    .enso_forecast
                    .last()
                    .map_or(f64::NAN, |step| step.mean),
            },
            path: forecast
                .anomaly_forecast
                .steps()
                .zip(forecast.enso_forecast.steps())
                .map(|(step, enso)| PathLine {
                    month: format_month(step.timestamp),
                    enso: enso.mean,
                    mean: step.mean,
                    lower: step.lower,
                    upper: step.upper,
                })
                .collect(),
            mean: forecast.probabilities.mean,
            standard_error: forecast.probabilities.standard_error,
            bins: forecast
                .probabilities
                .bins
                .iter()
                .map(|b| BinLine {
                    name: b.name.clone(),
                    probability: b.probability,
                    reference: reference.get(&b.name).copied(),
                })
                .collect(),
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ForecastError::ComputationError(format!("cannot encode report: {e}")))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Horse race (target {})", self.target)?;
        writeln!(f, "  window | split   |   RMSE | order     | seasonal")?;
        for w in &self.windows {
            writeln!(
                f,
                "  {:<6} | {} | {:>6.2} | {} | {}{}",
                format!("-{}", w.window),
                w.split,
                w.rmse,
                w.order,
                w.seasonal_order,
                if w.champion { "  *" } else { "" }
            )?;
        }
        for s in &self.skipped {
            writeln!(f, "  -{:<5} skipped: {}", s.window, s.reason)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Champion: {}-month window, trained through {} (RMSE {:.2})",
            self.champion.window, self.champion.split, self.champion.rmse
        )?;
        writeln!(
            f,
            "ENSO outlook: {:.2} from SARIMAX{}x{}",
            self.enso.value, self.enso.order, self.enso.seasonal_order
        )?;
        writeln!(f, "  month   |  ENSO |   mean | 95% interval")?;
        for p in &self.path {
            writeln!(
                f,
                "  {} | {:>5.2} | {:>6.2} | [{:.2}, {:.2}]",
                p.month, p.enso, p.mean, p.lower, p.upper
            )?;
        }
        writeln!(
            f,
            "Forecast for {}: {:.2} (se {:.2}, {} months past {})",
            self.target, self.mean, self.standard_error, self.horizon, self.last_observation
        )?;

        writeln!(f)?;
        writeln!(f, "  {:<10} {:>8} {:>10}", "bin", "model", "reference")?;
        for b in &self.bins {
            let reference = b
                .reference
                .map_or_else(|| "-".to_string(), |p| format!("{:.2}%", p * 100.0));
            writeln!(
                f,
                "  {:<10} {:>7.2}% {:>10}",
                b.name,
                b.probability * 100.0,
                reference
            )?;
        }
        Ok(())
    }
}
