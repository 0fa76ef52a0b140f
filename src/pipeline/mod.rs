//! Adaptive forecasting pipeline.
//!
//! 1. [`backtest`]: race training windows and pick the champion orders
//! 2. [`forecast`]: forecast ENSO, then the anomaly at the target month
//! 3. [`probability`]: turn the last forecast step into bin probabilities
//! 4. [`report`]: summarise the run

pub mod backtest;
pub mod forecast;
pub mod probability;
pub mod report;

pub use backtest::{
    select_champion, BacktestCandidate, BacktestConfig, BacktestOutcome, SkippedCandidate,
};
pub use forecast::{forecast_horizon, FinalForecast};
pub use probability::{
    check_partition, convert, BinProbabilities, BinProbability, PartitionIssue, PredictionBin,
};
pub use report::{PathLine, Report};

use crate::core::month::format_month;
use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::models::sarimax::ModelSelector;
use crate::models::SeasonalFitter;
use chrono::NaiveDate;
use tracing::info;

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub backtest: BacktestOutcome,
    pub forecast: FinalForecast,
}

/// Run the horse race and the final forecast for `target`.
///
/// `history` must carry the anomaly and ENSO columns. A target that is not
/// after the last observation fails before any model is fitted.
pub fn run_adaptive_forecast<F: SeasonalFitter>(
    selector: &ModelSelector<'_, F>,
    history: &TimeSeries,
    target: NaiveDate,
    config: &BacktestConfig,
    bins: &[PredictionBin],
) -> Result<PipelineOutput> {
    let last = history.last_timestamp().ok_or(ForecastError::EmptyData)?;
    forecast_horizon(last, target)?;
    info!(
        stage = "backtest",
        target = %format_month(target),
        windows = ?config.windows,
        candidates = selector.grid().len(),
        "starting horse race"
    );
    let backtest = backtest::run(selector, history, target, config)?;
    let forecast = forecast::run(selector, history, target, &backtest.champion, bins)?;
    Ok(PipelineOutput { backtest, forecast })
}
