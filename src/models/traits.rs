//! Fitting seams shared by the selector, the backtest and the final pipeline.

use crate::core::{ForecastResult, TimeSeries};
use crate::error::Result;
use crate::models::sarimax::SarimaxSpec;

/// A model fitted to one training series.
pub trait FittedModel {
    /// Akaike information criterion of the fit.
    fn aic(&self) -> f64;

    /// Forecast `horizon` months past the end of the training series.
    ///
    /// `future_exog` must hold exactly `horizon` covariate values when the
    /// model was fitted with a covariate.
    fn forecast(&self, horizon: usize, future_exog: Option<&[f64]>) -> Result<ForecastResult>;
}

/// Fits a seasonal model of a given order to a series.
///
/// Orchestration code is generic over this trait so the grid search and the
/// horse race can be exercised with scripted fitters.
pub trait SeasonalFitter {
    /// The fitted model type.
    type Fitted: FittedModel;

    /// Fit `spec` to the first column of `endog`, optionally regressing on
    /// `exog` (one value per observation).
    fn fit(&self, endog: &TimeSeries, exog: Option<&[f64]>, spec: SarimaxSpec)
        -> Result<Self::Fitted>;

    /// Get the fitter name.
    fn name(&self) -> &str;
}

