//! Core data structures for monthly series and forecasts.

mod forecast;
pub mod month;
mod time_series;

pub use forecast::{ForecastResult, ForecastStep};
pub use time_series::{MissingValuePolicy, TimeSeries};
