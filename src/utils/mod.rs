//! Utility functions for model estimation and evaluation.

pub mod metrics;
pub mod ols;
pub mod optimization;
pub mod stats;

pub use metrics::rmse;
pub use ols::{ols_residuals, ols_slope};
pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{normal_cdf, CONFIDENCE_Z, INTERVAL_Z_ROUNDED};
