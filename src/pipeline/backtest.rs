//! Horse race over training windows.
//!
//! Each window length `w` places the train/test split `w` months before the
//! target month. Orders are selected on the training slice, the selected model
//! forecasts the held-out months with the observed ENSO values, and the window
//! with the lowest RMSE becomes the champion.

use crate::core::month::{add_months, format_month};
use crate::core::TimeSeries;
use crate::data::{ANOMALY_COLUMN, ENSO_COLUMN};
use crate::error::{ForecastError, Result};
use crate::models::sarimax::{
    fit_and_forecast, ModelOrder, ModelSelector, SarimaxSpec, SeasonalOrder,
};
use crate::models::SeasonalFitter;
use crate::utils::metrics::rmse;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

/// Window lengths raced by default, in months before the target.
pub const DEFAULT_WINDOWS: [usize; 5] = [18, 21, 24, 27, 30];

/// Shortest training slice a window may use.
pub const DEFAULT_MIN_TRAIN_MONTHS: usize = 36;

/// Horse-race settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Window lengths in evaluation order; earlier windows win RMSE ties.
    pub windows: Vec<usize>,
    pub min_train_months: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.to_vec(),
            min_train_months: DEFAULT_MIN_TRAIN_MONTHS,
        }
    }
}

/// An evaluated window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestCandidate {
    pub window: usize,
    /// Last training month.
    pub split: NaiveDate,
    pub train_months: usize,
    pub test_months: usize,
    pub rmse: f64,
    pub order: ModelOrder,
    pub seasonal_order: SeasonalOrder,
    pub aic: f64,
}

impl BacktestCandidate {
    pub fn spec(&self) -> SarimaxSpec {
        SarimaxSpec::new(self.order, self.seasonal_order)
    }
}

/// A window that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedCandidate {
    pub window: usize,
    pub split: NaiveDate,
    pub reason: String,
}

/// Everything the horse race produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestOutcome {
    /// Evaluated windows in configured order.
    pub candidates: Vec<BacktestCandidate>,
    pub skipped: Vec<SkippedCandidate>,
    pub champion: BacktestCandidate,
}

impl BacktestOutcome {
    pub fn is_champion(&self, candidate: &BacktestCandidate) -> bool {
        candidate.window == self.champion.window
    }
}

/// The candidate with the lowest RMSE; the earliest wins ties.
///
/// Candidates with a non-finite RMSE are never chosen.
pub fn select_champion(candidates: &[BacktestCandidate]) -> Option<&BacktestCandidate> {
    candidates
        .iter()
        .filter(|c| c.rmse.is_finite())
        .fold(None, |best: Option<&BacktestCandidate>, c| match best {
            Some(b) if b.rmse <= c.rmse => Some(b),
            _ => Some(c),
        })
}

enum WindowResult {
    Evaluated(BacktestCandidate),
    Skipped(SkippedCandidate),
}

/// Race every configured window and crown a champion.
///
/// `history` must carry the anomaly and ENSO columns. Windows that cannot be
/// evaluated are recorded as skipped; the race fails only when none remain.
pub fn run<F: SeasonalFitter>(
    selector: &ModelSelector<'_, F>,
    history: &TimeSeries,
    target: NaiveDate,
    config: &BacktestConfig,
) -> Result<BacktestOutcome> {
    let mut candidates = Vec::new();
    let mut skipped = Vec::new();

    for &window in &config.windows {
        match evaluate_window(selector, history, target, window, config)? {
            WindowResult::Evaluated(candidate) => {
                info!(
                    stage = "backtest",
                    window,
                    rmse = candidate.rmse,
                    order = %candidate.order,
                    seasonal = %candidate.seasonal_order,
                    "window evaluated"
                );
                candidates.push(candidate);
            }
            WindowResult::Skipped(skip) => {
                warn!(stage = "backtest", window, reason = %skip.reason, "window skipped");
                skipped.push(skip);
            }
        }
    }

    let champion = select_champion(&candidates).cloned().ok_or_else(|| {
        ForecastError::NoViableModel(format!(
            "no backtest window could be evaluated ({} skipped)",
            skipped.len()
        ))
    })?;
    info!(
        stage = "backtest",
        window = champion.window,
        rmse = champion.rmse,
        split = %format_month(champion.split),
        "champion selected"
    );

    Ok(BacktestOutcome {
        candidates,
        skipped,
        champion,
    })
}

fn evaluate_window<F: SeasonalFitter>(
    selector: &ModelSelector<'_, F>,
    history: &TimeSeries,
    target: NaiveDate,
    window: usize,
    config: &BacktestConfig,
) -> Result<WindowResult> {
    let offset = i32::try_from(window)
        .map_err(|_| ForecastError::InvalidParameter(format!("window {window} is too large")))?;
    let split = add_months(target, -offset)?;
    let skip = |reason: String| {
        WindowResult::Skipped(SkippedCandidate {
            window,
            split,
            reason,
        })
    };

    let train = history.through(split);
    let test = history.after(split);
    if test.is_empty() {
        return Ok(skip(format!("no observations after {}", format_month(split))));
    }
    if train.len() < config.min_train_months {
        return Ok(skip(
            ForecastError::InsufficientHistory {
                needed: config.min_train_months,
                got: train.len(),
            }
            .to_string(),
        ));
    }

    match score_window(selector, &train, &test) {
        Ok((rmse, spec, aic)) => Ok(WindowResult::Evaluated(BacktestCandidate {
            window,
            split,
            train_months: train.len(),
            test_months: test.len(),
            rmse,
            order: spec.order,
            seasonal_order: spec.seasonal,
            aic,
        })),
        Err(e) if is_candidate_failure(&e) => Ok(skip(e.to_string())),
        Err(e) => Err(e),
    }
}

/// Model failures are confined to their window; data errors are not.
fn is_candidate_failure(error: &ForecastError) -> bool {
    matches!(
        error,
        ForecastError::NoViableModel(_)
            | ForecastError::ComputationError(_)
            | ForecastError::InsufficientData { .. }
            | ForecastError::InvalidParameter(_)
    )
}

fn score_window<F: SeasonalFitter>(
    selector: &ModelSelector<'_, F>,
    train: &TimeSeries,
    test: &TimeSeries,
) -> Result<(f64, SarimaxSpec, f64)> {
    let endog = train.project(ANOMALY_COLUMN)?;
    let exog = train.column(ENSO_COLUMN)?;
    let selection = selector.select(&endog, Some(exog))?;

    let forecast = fit_and_forecast(
        selector.fitter(),
        &endog,
        selection.spec(),
        test.len(),
        Some(exog),
        Some(test.column(ENSO_COLUMN)?),
    )?;
    let error = rmse(test.column(ANOMALY_COLUMN)?, forecast.mean())?;
    Ok((error, selection.spec(), selection.aic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::month::month_start;
    use crate::models::sarimax::candidate_grid;
    use crate::models::sarimax::selector::scripted::ScriptedFitter;
    use crate::test_support::synthetic_history;

    fn candidate(window: usize, rmse: f64) -> BacktestCandidate {
        BacktestCandidate {
            window,
            split: month_start(2024, 1).unwrap(),
            train_months: 100,
            test_months: window,
            rmse,
            order: ModelOrder::new(1, 0, 0),
            seasonal_order: SeasonalOrder::new(0, 0, 0, 12),
            aic: 0.0,
        }
    }

    fn scripted(level: f64) -> ScriptedFitter {
        let mut fitter = ScriptedFitter {
            level,
            ..Default::default()
        };
        for (i, spec) in candidate_grid(12).into_iter().enumerate() {
            fitter.aics.insert(spec, 500.0 - i as f64);
        }
        fitter
    }

    #[test]
    fn champion_has_minimum_rmse() {
        let candidates = vec![candidate(18, 0.30), candidate(21, 0.25), candidate(24, 0.28)];
        assert_eq!(select_champion(&candidates).unwrap().window, 21);
    }

    #[test]
    fn champion_ties_keep_first_window() {
        let candidates = vec![candidate(18, 0.25), candidate(21, 0.25)];
        assert_eq!(select_champion(&candidates).unwrap().window, 18);
    }

    #[test]
    fn champion_ignores_non_finite_rmse() {
        let candidates = vec![candidate(18, f64::NAN), candidate(21, 0.9)];
        assert_eq!(select_champion(&candidates).unwrap().window, 21);
        assert!(select_champion(&[]).is_none());
    }

    #[test]
    fn splits_are_counted_back_from_target() {
        // history 2000-01 .. 2023-12, target 2024-06
        let history = synthetic_history(2000, 1, 288, 5);
        let fitter = scripted(100.0);
        let selector = ModelSelector::new(&fitter);
        let config = BacktestConfig {
            windows: vec![18, 24],
            min_train_months: 36,
        };
        let target = month_start(2024, 6).unwrap();
        let outcome = run(&selector, &history, target, &config).unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        let first = &outcome.candidates[0];
        assert_eq!(first.split, month_start(2022, 12).unwrap());
        assert_eq!(first.test_months, 12);
        assert_eq!(outcome.candidates[1].split, month_start(2022, 6).unwrap());
        assert_eq!(outcome.candidates[1].test_months, 18);
        // the scripted grid prefers the last candidate
        assert_eq!(first.spec(), *candidate_grid(12).last().unwrap());
        assert!(outcome.is_champion(select_champion(&outcome.candidates).unwrap()));
    }

    #[test]
    fn skips_windows_without_test_data_or_history() {
        let history = synthetic_history(2020, 1, 48, 3);
        let fitter = scripted(100.0);
        let selector = ModelSelector::new(&fitter);
        let config = BacktestConfig {
            windows: vec![6, 30],
            min_train_months: 36,
        };
        // last observation 2023-12; window 6 splits at 2024-03 (no test data),
        // window 30 splits at 2022-03 (27 training months)
        let target = month_start(2024, 9).unwrap();
        let err = run(&selector, &history, target, &config).unwrap_err();
        assert!(matches!(err, ForecastError::NoViableModel(_)));

        let config = BacktestConfig {
            windows: vec![6, 30, 12],
            min_train_months: 36,
        };
        let outcome = run(&selector, &history, target, &config).unwrap();
        assert_eq!(outcome.skipped.len(), 2);
        assert!(outcome.skipped[0].reason.contains("no observations"));
        assert!(outcome.skipped[1].reason.contains("insufficient history"));
        assert_eq!(outcome.champion.window, 12);
        assert!(outcome.candidates.iter().all(|c| c.train_months >= 36 && c.test_months > 0));
    }

    #[test]
    fn model_failure_skips_window_instead_of_aborting() {
        let history = synthetic_history(2015, 1, 108, 9);
        let failing = ScriptedFitter::default();
        let selector = ModelSelector::new(&failing);
        let target = month_start(2024, 6).unwrap();
        let err = run(&selector, &history, target, &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, ForecastError::NoViableModel(_)));
    }

    #[test]
    fn missing_enso_column_is_a_data_error() {
        let history = synthetic_history(2015, 1, 108, 9).project(ANOMALY_COLUMN).unwrap();
        let fitter = scripted(100.0);
        let selector = ModelSelector::new(&fitter);
        let target = month_start(2024, 6).unwrap();
        let err = run(&selector, &history, target, &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, ForecastError::DataMalformed(_)));
    }
}
