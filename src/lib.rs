//! # anomaly-forecast
//!
//! Adaptive SARIMAX forecaster for monthly global temperature anomalies.
//!
//! A run reads the GISTEMP anomaly table and the Niño 3.4 (ENSO) feed,
//! races several training windows against each other on a held-out
//! tail of the history, and uses the orders of the most accurate window to
//! forecast the anomaly at a target month. ENSO is forecast first and fed
//! to the anomaly model as its covariate. The final Gaussian forecast is
//! turned into probabilities over outcome bins.
//!
//! ```no_run
//! use anomaly_forecast::prelude::*;
//! use std::path::Path;
//!
//! # fn main() -> anomaly_forecast::Result<()> {
//! let config = ForecastConfig::default();
//! let anomaly = read_gistemp(Path::new("GLB.Ts+dSST.txt"))?;
//! let enso = EnsoClient::new(config.http_timeout())?.fetch(&config.enso_url)?;
//! let history = load_history(&anomaly, &enso, config.history_start_month()?)?;
//!
//! let fitter = Sarimax::new();
//! let selector = ModelSelector::new(&fitter);
//! let output = run_adaptive_forecast(
//!     &selector,
//!     &history,
//!     config.target_month()?,
//!     &config.backtest(),
//!     &config.bins,
//! )?;
//! println!("{}", Report::new(&output.backtest, &output.forecast, &config.reference));
//! # Ok(())
//! # }
//! ```

#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::ForecastConfig;
    pub use crate::core::{ForecastResult, TimeSeries};
    pub use crate::data::{load_history, read_gistemp, EnsoClient};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::sarimax::{ModelSelector, Sarimax, SarimaxSpec};
    pub use crate::models::{FittedModel, SeasonalFitter};
    pub use crate::pipeline::{run_adaptive_forecast, PredictionBin, Report};
}
