//! Final forecast: ENSO first, then the anomaly driven by the ENSO outlook.

use super::backtest::BacktestCandidate;
use super::probability::{check_partition, convert, BinProbabilities, PredictionBin};
use crate::core::month::{format_month, months_between};
use crate::core::{ForecastResult, TimeSeries};
use crate::data::{ANOMALY_COLUMN, ENSO_COLUMN};
use crate::error::{ForecastError, Result};
use crate::models::sarimax::{fit_and_forecast, ModelSelector, Selection};
use crate::models::SeasonalFitter;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of the final forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalForecast {
    pub target: NaiveDate,
    pub last_observation: NaiveDate,
    /// Months from the last observation to the target.
    pub horizon: usize,
    /// Orders chosen for the ENSO series on its own.
    #[serde(skip)]
    pub enso_selection: Selection,
    pub enso_forecast: ForecastResult,
    pub anomaly_forecast: ForecastResult,
    pub probabilities: BinProbabilities,
}

/// Months from `last` to `target`, failing when the target is not later.
pub fn forecast_horizon(last: NaiveDate, target: NaiveDate) -> Result<usize> {
    let months = months_between(last, target);
    usize::try_from(months)
        .ok()
        .filter(|&h| h > 0)
        .ok_or_else(|| ForecastError::HorizonMismatch {
            last: format_month(last),
            target: format_month(target),
        })
}

/// Forecast the anomaly at `target` with the champion's orders.
///
/// Both models train on the full history through the latest observation, so
/// the last forecast step is the target month. The ENSO path forecast by its
/// own grid-selected model serves as the future covariate.
pub fn run<F: SeasonalFitter>(
    selector: &ModelSelector<'_, F>,
    history: &TimeSeries,
    target: NaiveDate,
    champion: &BacktestCandidate,
    bins: &[PredictionBin],
) -> Result<FinalForecast> {
    let last_observation = history.last_timestamp().ok_or(ForecastError::EmptyData)?;
    let horizon = forecast_horizon(last_observation, target)?;

    let enso = history.project(ENSO_COLUMN)?;
    let enso_selection = selector.select(&enso, None)?;
    let enso_forecast = fit_and_forecast(
        selector.fitter(),
        &enso,
        enso_selection.spec(),
        horizon,
        None,
        None,
    )?;
    info!(
        stage = "enso",
        order = %enso_selection.order,
        seasonal = %enso_selection.seasonal_order,
        aic = enso_selection.aic,
        horizon,
        outlook = enso_forecast.last().map(|s| s.mean),
        "ENSO forecast"
    );

    let anomaly = history.project(ANOMALY_COLUMN)?;
    let anomaly_forecast = fit_and_forecast(
        selector.fitter(),
        &anomaly,
        champion.spec(),
        horizon,
        Some(history.column(ENSO_COLUMN)?),
        Some(enso_forecast.mean()),
    )?;
    info!(
        stage = "final",
        window = champion.window,
        order = %champion.order,
        seasonal = %champion.seasonal_order,
        horizon,
        mean = anomaly_forecast.last().map(|s| s.mean),
        "anomaly forecast"
    );

    for issue in check_partition(bins) {
        warn!(stage = "convert", %issue, "bins do not partition the outcome range");
    }
    let probabilities = convert(&anomaly_forecast, bins)?;
    for bin in &probabilities.bins {
        info!(stage = "convert", bin = %bin.name, probability = bin.probability);
    }

    Ok(FinalForecast {
        target,
        last_observation,
        horizon,
        enso_selection,
        enso_forecast,
        anomaly_forecast,
        probabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::month::month_start;
    use crate::models::sarimax::selector::scripted::ScriptedFitter;
    use crate::models::sarimax::{candidate_grid, ModelOrder, SeasonalOrder};
    use crate::test_support::synthetic_history;
    use approx::assert_relative_eq;

    fn champion() -> BacktestCandidate {
        BacktestCandidate {
            window: 21,
            split: month_start(2022, 3).unwrap(),
            train_months: 200,
            test_months: 21,
            rmse: 0.25,
            order: ModelOrder::new(0, 0, 0),
            seasonal_order: SeasonalOrder::new(0, 0, 0, 12),
            aic: 10.0,
        }
    }

    fn bins() -> Vec<PredictionBin> {
        vec![
            PredictionBin::new("low", None, Some(100.0)),
            PredictionBin::new("high", Some(100.0), None),
        ]
    }

    #[test]
    fn horizon_counts_whole_months() {
        let last = month_start(2023, 12).unwrap();
        assert_eq!(forecast_horizon(last, month_start(2024, 6).unwrap()).unwrap(), 6);
        assert_eq!(forecast_horizon(last, month_start(2024, 1).unwrap()).unwrap(), 1);
    }

    #[test]
    fn target_not_after_last_observation_fails_fast() {
        let last = month_start(2023, 12).unwrap();
        for target in [month_start(2023, 12).unwrap(), month_start(2023, 1).unwrap()] {
            let err = forecast_horizon(last, target).unwrap_err();
            assert_eq!(
                err,
                ForecastError::HorizonMismatch {
                    last: "2023-12".to_string(),
                    target: format_month(target),
                }
            );
        }
    }

    #[test]
    fn last_step_lands_on_target() {
        let history = synthetic_history(2000, 1, 288, 2);
        let mut fitter = ScriptedFitter {
            level: 100.0,
            ..Default::default()
        };
        for spec in candidate_grid(12) {
            fitter.aics.insert(spec, 1.0);
        }
        let selector = ModelSelector::new(&fitter);
        let target = month_start(2024, 6).unwrap();

        let result = run(&selector, &history, target, &champion(), &bins()).unwrap();
        assert_eq!(result.horizon, 6);
        assert_eq!(result.enso_forecast.horizon(), 6);
        assert_eq!(result.anomaly_forecast.timestamps().last(), Some(&target));
        assert_relative_eq!(result.probabilities.total(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(result.probabilities.get("low").unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn stale_target_is_rejected_before_fitting() {
        let history = synthetic_history(2000, 1, 288, 2);
        let fitter = ScriptedFitter::default();
        let selector = ModelSelector::new(&fitter);
        let err = run(
            &selector,
            &history,
            month_start(2020, 1).unwrap(),
            &champion(),
            &bins(),
        )
        .unwrap_err();
        assert!(matches!(err, ForecastError::HorizonMismatch { .. }));
    }
}
