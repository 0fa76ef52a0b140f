//! Seasonal ARIMA with one exogenous regressor.
//!
//! - [`spec`]: order specifications and state dimensions
//! - [`polynomial`]: differencing and lag-polynomial expansion
//! - [`state_space`]: sparse system matrices
//! - [`kalman`]: concentrated-likelihood filter and predictions
//! - [`model`]: maximum-likelihood fitter and forecasts
//! - [`selector`]: AIC grid search

pub mod kalman;
pub mod model;
pub mod polynomial;
pub mod selector;
pub mod spec;
pub mod state_space;

pub use model::{fit_and_forecast, FittedSarimax, Sarimax, SarimaxParams};
pub use selector::{
    candidate_grid, CandidateEvaluation, CandidateOutcome, ModelSelector, Selection,
};
pub use spec::{ModelOrder, SarimaxSpec, SeasonalOrder, SEASONAL_PERIOD};
