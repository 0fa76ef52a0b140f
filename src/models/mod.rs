//! Forecasting models.

mod traits;

pub mod sarimax;

pub use traits::{FittedModel, SeasonalFitter};
