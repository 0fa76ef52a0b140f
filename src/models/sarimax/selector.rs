//! Exhaustive SARIMAX order selection by AIC.
//!
//! Every `(p, d, q)` and `(P, D, Q, 12)` with entries in `{0, 1}` is tried,
//! 64 candidates in all. A candidate whose fit fails, whose AIC is not finite
//! or whose forecast over [`SCREEN_HORIZON`] months is unusable does not
//! compete. The lowest remaining AIC wins; ties keep the candidate enumerated
//! first.

use super::spec::{ModelOrder, SarimaxSpec, SeasonalOrder, SEASONAL_PERIOD};
use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::traits::{FittedModel, SeasonalFitter};
use serde::Serialize;
use tracing::debug;

/// Largest order tried in each position of the grid.
pub const MAX_GRID_ORDER: usize = 1;

/// Months forecast when screening a fitted candidate.
pub const SCREEN_HORIZON: usize = SEASONAL_PERIOD;

/// All order triples with entries in `0..=max`, `p` outermost, `q` innermost.
fn order_triples(max: usize) -> Vec<ModelOrder> {
    let mut orders = Vec::new();
    for p in 0..=max {
        for d in 0..=max {
            for q in 0..=max {
                orders.push(ModelOrder::new(p, d, q));
            }
        }
    }
    orders
}

/// Candidate grid: every non-seasonal order paired with every seasonal order,
/// non-seasonal order varying slowest.
pub fn candidate_grid(period: usize) -> Vec<SarimaxSpec> {
    let triples = order_triples(MAX_GRID_ORDER);
    triples
        .iter()
        .flat_map(|&order| {
            triples
                .iter()
                .map(move |&s| SarimaxSpec::new(order, SeasonalOrder::from_order(s, period)))
        })
        .collect()
}

/// Result of fitting one grid candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CandidateOutcome {
    Fitted { aic: f64 },
    Failed { reason: String },
}

/// A grid candidate and how its fit went.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateEvaluation {
    pub spec: SarimaxSpec,
    pub outcome: CandidateOutcome,
}

/// The winning orders of a grid search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub order: ModelOrder,
    pub seasonal_order: SeasonalOrder,
    pub aic: f64,
    /// Every candidate in enumeration order.
    pub outcomes: Vec<CandidateEvaluation>,
}

impl Selection {
    /// The selected orders as one specification.
    pub fn spec(&self) -> SarimaxSpec {
        SarimaxSpec::new(self.order, self.seasonal_order)
    }

    /// Number of candidates that produced a finite AIC.
    pub fn fitted_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|c| matches!(c.outcome, CandidateOutcome::Fitted { .. }))
            .count()
    }
}

/// Grid-search selector over a [`SeasonalFitter`].
#[derive(Debug, Clone)]
pub struct ModelSelector<'a, F> {
    fitter: &'a F,
    grid: Vec<SarimaxSpec>,
}

impl<'a, F: SeasonalFitter> ModelSelector<'a, F> {
    /// Selector over the full monthly grid.
    pub fn new(fitter: &'a F) -> Self {
        Self {
            fitter,
            grid: candidate_grid(SEASONAL_PERIOD),
        }
    }

    /// Replace the candidate grid; order determines tie-breaking.
    pub fn with_grid(mut self, grid: Vec<SarimaxSpec>) -> Self {
        self.grid = grid;
        self
    }

    pub fn grid(&self) -> &[SarimaxSpec] {
        &self.grid
    }

    /// The fitter candidates are evaluated with.
    pub fn fitter(&self) -> &'a F {
        self.fitter
    }

    fn evaluate(
        &self,
        endog: &TimeSeries,
        exog: Option<&[f64]>,
        spec: SarimaxSpec,
    ) -> CandidateOutcome {
        let fitted = match self.fitter.fit(endog, exog, spec) {
            Ok(fitted) => fitted,
            Err(e) => {
                return CandidateOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };
        if !fitted.aic().is_finite() {
            return CandidateOutcome::Failed {
                reason: format!("non-finite AIC ({})", fitted.aic()),
            };
        }
        match forecast_defect(&fitted, exog.is_some()) {
            Some(reason) => CandidateOutcome::Failed { reason },
            None => CandidateOutcome::Fitted { aic: fitted.aic() },
        }
    }

    /// Fit every candidate to `endog` and keep the lowest AIC.
    pub fn select(&self, endog: &TimeSeries, exog: Option<&[f64]>) -> Result<Selection> {
        let mut outcomes = Vec::with_capacity(self.grid.len());
        let mut best: Option<(SarimaxSpec, f64)> = None;
        debug!(
            fitter = self.fitter.name(),
            candidates = self.grid.len(),
            months = endog.len(),
            "grid search started"
        );

        for &spec in &self.grid {
            let outcome = self.evaluate(endog, exog, spec);
            match &outcome {
                CandidateOutcome::Fitted { aic } => {
                    debug!(order = %spec.order, seasonal = %spec.seasonal, aic, "candidate fitted");
                    if best.map_or(true, |(_, best_aic)| *aic < best_aic) {
                        best = Some((spec, *aic));
                    }
                }
                CandidateOutcome::Failed { reason } => {
                    debug!(
                        order = %spec.order,
                        seasonal = %spec.seasonal,
                        reason = %reason,
                        "candidate failed"
                    );
                }
            }
            outcomes.push(CandidateEvaluation { spec, outcome });
        }

        let (spec, aic) = best.ok_or_else(|| {
            ForecastError::NoViableModel(format!(
                "all {} grid candidates failed to fit",
                self.grid.len()
            ))
        })?;

        Ok(Selection {
            order: spec.order,
            seasonal_order: spec.seasonal,
            aic,
            outcomes,
        })
    }
}

/// Why a fitted model's forecast over [`SCREEN_HORIZON`] months is unusable.
///
/// A covariate model is screened with a zero future covariate, which leaves
/// only its own dynamics.
fn forecast_defect<M: FittedModel>(fitted: &M, has_exog: bool) -> Option<String> {
    let future_exog = has_exog.then(|| vec![0.0; SCREEN_HORIZON]);
    let forecast = match fitted.forecast(SCREEN_HORIZON, future_exog.as_deref()) {
        Ok(forecast) => forecast,
        Err(e) => return Some(format!("forecast failed: {e}")),
    };
    if let Some(step) = forecast.mean().iter().position(|m| !m.is_finite()) {
        return Some(format!("non-finite forecast at step {}", step + 1));
    }
    forecast
        .lower()
        .iter()
        .zip(forecast.upper())
        .position(|(lower, upper)| {
            let width = upper - lower;
            !width.is_finite() || width <= 0.0
        })
        .map(|step| format!("degenerate forecast interval at step {}", step + 1))
}
