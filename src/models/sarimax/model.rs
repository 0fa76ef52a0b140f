//! SARIMAX estimation by exact Gaussian maximum likelihood.
//!
//! The model is
//!
//! ```text
//! (1-L)^d (1-L^s)^D (y_t - beta x_t) = u_t
//! phi(L) Phi(L^s) u_t = theta(L) Theta(L^s) eps_t,   eps_t ~ N(0, sigma^2)
//! ```
//!
//! without a trend term. Every lag polynomial must keep its inverse roots
//! below [`MAX_INVERSE_ROOT`]: near-unit roots are admitted, explosive AR and
//! non-invertible MA coefficients are not. Every state gets an approximate
//! diffuse prior, and the innovation variance is concentrated out of the
//! likelihood.

use super::kalman::{self, FilterOutput};
use super::polynomial::{full_difference, inverse_roots_within};
use super::spec::SarimaxSpec;
use super::state_space::StateSpace;
use crate::core::month::following_months;
use crate::core::{ForecastResult, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::traits::{FittedModel, SeasonalFitter};
use crate::utils::ols::{ols_residuals, ols_slope};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{autocorrelation, CONFIDENCE_Z};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

const START_COEFFICIENT_BOUND: f64 = 0.9;

/// Largest inverse-root modulus an AR or MA factor may have.
pub const MAX_INVERSE_ROOT: f64 = 0.999;

/// Estimated SARIMAX coefficients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SarimaxParams {
    /// Regression coefficient on the covariate, if any.
    pub exog: Option<f64>,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
}

impl SarimaxParams {
    /// Unpack an optimiser vector laid out as `[beta, ar, ma, sar, sma]`.
    fn from_vector(spec: &SarimaxSpec, has_exog: bool, x: &[f64]) -> Self {
        let mut cursor = 0;
        let mut take = |n: usize| {
            let part: Vec<f64> = x.iter().skip(cursor).take(n).copied().collect();
            cursor += n;
            part
        };
        let exog = if has_exog { take(1).first().copied() } else { None };
        Self {
            exog,
            ar: take(spec.order.p),
            ma: take(spec.order.q),
            seasonal_ar: take(spec.seasonal.p),
            seasonal_ma: take(spec.seasonal.q),
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        self.exog
            .iter()
            .chain(&self.ar)
            .chain(&self.ma)
            .chain(&self.seasonal_ar)
            .chain(&self.seasonal_ma)
            .copied()
            .collect()
    }

    /// AR factors stationary and MA factors invertible, up to
    /// [`MAX_INVERSE_ROOT`].
    pub fn is_admissible(&self) -> bool {
        let negated = |c: &[f64]| c.iter().map(|v| -v).collect::<Vec<_>>();
        inverse_roots_within(&self.ar, MAX_INVERSE_ROOT)
            && inverse_roots_within(&self.seasonal_ar, MAX_INVERSE_ROOT)
            && inverse_roots_within(&negated(&self.ma), MAX_INVERSE_ROOT)
            && inverse_roots_within(&negated(&self.seasonal_ma), MAX_INVERSE_ROOT)
    }

    fn state_space(&self, spec: &SarimaxSpec) -> StateSpace {
        StateSpace::new(
            spec,
            &self.ar,
            &self.ma,
            &self.seasonal_ar,
            &self.seasonal_ma,
        )
    }

    /// `y - beta x`.
    fn regression_error(&self, y: &[f64], exog: Option<&[f64]>) -> Vec<f64> {
        match (self.exog, exog) {
            (Some(beta), Some(x)) => ols_residuals(y, x, beta),
            _ => y.to_vec(),
        }
    }

    fn filter(
        &self,
        spec: &SarimaxSpec,
        y: &[f64],
        exog: Option<&[f64]>,
    ) -> Result<(StateSpace, FilterOutput)> {
        let model = self.state_space(spec);
        let output = kalman::filter(&model, &self.regression_error(y, exog), spec.k_states())?;
        Ok((model, output))
    }
}

/// SARIMAX fitter.
///
/// # Example
/// ```
/// use anomaly_forecast::models::sarimax::{ModelOrder, Sarimax, SarimaxSpec, SeasonalOrder};
/// use anomaly_forecast::models::{FittedModel, SeasonalFitter};
/// use anomaly_forecast::core::TimeSeries;
/// use anomaly_forecast::core::month::{add_months, month_start};
///
/// let start = month_start(2015, 1).unwrap();
/// let timestamps: Vec<_> = (0..60).map(|i| add_months(start, i).unwrap()).collect();
/// let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.7).sin() + 0.01 * i as f64).collect();
/// let series = TimeSeries::univariate(timestamps, values).unwrap();
///
/// let spec = SarimaxSpec::new(ModelOrder::new(1, 0, 0), SeasonalOrder::none());
/// let fitted = Sarimax::new().fit(&series, None, spec).unwrap();
/// let forecast = fitted.forecast(3, None).unwrap();
/// assert_eq!(forecast.horizon(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Sarimax {
    optimizer: NelderMeadConfig,
}

impl Default for Sarimax {
    fn default() -> Self {
        Self::new()
    }
}

impl Sarimax {
    pub fn new() -> Self {
        Self {
            optimizer: NelderMeadConfig {
                max_iter: 500,
                f_tolerance: 1e-8,
                x_tolerance: 1e-6,
                initial_step: 0.1,
                ..Default::default()
            },
        }
    }

    /// Override the optimiser settings.
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Fit to raw values ending at `last_timestamp`.
    pub fn fit_values(
        &self,
        y: &[f64],
        exog: Option<&[f64]>,
        spec: SarimaxSpec,
        last_timestamp: NaiveDate,
    ) -> Result<FittedSarimax> {
        validate_inputs(y, exog, &spec)?;

        let has_exog = exog.is_some();
        let k = spec.num_params(usize::from(has_exog));
        let needed = spec.k_states() + k + 1;
        if y.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: y.len(),
            });
        }

        let start = start_params(&spec, y, exog)?;
        let objective = |x: &[f64]| -> f64 {
            let params = SarimaxParams::from_vector(&spec, has_exog, x);
            if !params.is_admissible() {
                return f64::INFINITY;
            }
            match params.filter(&spec, y, exog) {
                Ok((_, output)) => -output.loglike,
                Err(_) => f64::INFINITY,
            }
        };
        let result = nelder_mead(objective, &start.to_vector(), &self.optimizer);
        if !result.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "likelihood of {spec} is not finite at the optimum"
            )));
        }
        if !result.converged {
            debug!(
                %spec,
                iterations = result.iterations,
                evaluations = result.evaluations,
                "optimiser stopped before meeting its tolerances"
            );
        }

        let params = SarimaxParams::from_vector(&spec, has_exog, &result.optimal_point);
        if !params.is_admissible() {
            return Err(ForecastError::ComputationError(format!(
                "{spec} has no stationary and invertible optimum"
            )));
        }
        let (state_space, filtered) = params.filter(&spec, y, exog)?;
        let loglike = filtered.loglike;
        let aic = -2.0 * loglike + 2.0 * k as f64;
        let bic = -2.0 * loglike + k as f64 * (filtered.n_eff as f64).ln();
        if !aic.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "non-finite AIC for {spec}"
            )));
        }

        Ok(FittedSarimax {
            spec,
            params,
            loglike,
            aic,
            bic,
            sigma2: filtered.scale,
            last_timestamp,
            state_space,
            filtered,
        })
    }
}

impl SeasonalFitter for Sarimax {
    type Fitted = FittedSarimax;

    fn fit(
        &self,
        endog: &TimeSeries,
        exog: Option<&[f64]>,
        spec: SarimaxSpec,
    ) -> Result<FittedSarimax> {
        let last = endog.last_timestamp().ok_or(ForecastError::EmptyData)?;
        self.fit_values(endog.primary_values(), exog, spec, last)
    }

    fn name(&self) -> &str {
        "SARIMAX"
    }
}

fn validate_inputs(y: &[f64], exog: Option<&[f64]>, spec: &SarimaxSpec) -> Result<()> {
    if y.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::InvalidParameter(
            "series contains missing or non-finite values".to_string(),
        ));
    }
    if let Some(x) = exog {
        if x.len() != y.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: y.len(),
                got: x.len(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "covariate contains missing or non-finite values".to_string(),
            ));
        }
    }
    let seasonal = spec.seasonal;
    if seasonal.period == 0 && (seasonal.p > 0 || seasonal.d > 0 || seasonal.q > 0) {
        return Err(ForecastError::InvalidParameter(
            "seasonal terms require a positive period".to_string(),
        ));
    }
    Ok(())
}

/// Data-driven starting point for the optimiser.
fn start_params(spec: &SarimaxSpec, y: &[f64], exog: Option<&[f64]>) -> Result<SarimaxParams> {
    let (d, sd, period) = (spec.order.d, spec.seasonal.d, spec.seasonal.period);

    let beta = match exog {
        Some(x) => {
            let dy = full_difference(y, d, sd, period);
            let dx = full_difference(x, d, sd, period);
            Some(if dy.is_empty() {
                ols_slope(y, x)?
            } else {
                ols_slope(&dy, &dx)?
            })
        }
        None => None,
    };

    let residual = match (beta, exog) {
        (Some(b), Some(x)) => ols_residuals(y, x, b),
        _ => y.to_vec(),
    };
    let stationary = full_difference(&residual, d, sd, period);

    let mut params = SarimaxParams {
        exog: beta,
        ar: vec![0.0; spec.order.p],
        ma: vec![0.0; spec.order.q],
        seasonal_ar: vec![0.0; spec.seasonal.p],
        seasonal_ma: vec![0.0; spec.seasonal.q],
    };
    if let Some(first) = params.ar.first_mut() {
        *first = start_coefficient(&stationary, 1);
    }
    if let Some(first) = params.seasonal_ar.first_mut() {
        *first = start_coefficient(&stationary, period);
    }
    Ok(params)
}

fn start_coefficient(series: &[f64], lag: usize) -> f64 {
    let r = autocorrelation(series, lag);
    if r.is_finite() {
        r.clamp(-START_COEFFICIENT_BOUND, START_COEFFICIENT_BOUND)
    } else {
        0.0
    }
}

/// A fitted SARIMAX model, ready to forecast.
#[derive(Debug, Clone)]
pub struct FittedSarimax {
    spec: SarimaxSpec,
    params: SarimaxParams,
    loglike: f64,
    aic: f64,
    bic: f64,
    sigma2: f64,
    last_timestamp: NaiveDate,
    state_space: StateSpace,
    filtered: FilterOutput,
}

impl FittedSarimax {
    pub fn spec(&self) -> SarimaxSpec {
        self.spec
    }

    pub fn params(&self) -> &SarimaxParams {
        &self.params
    }

    /// Maximised log-likelihood.
    pub fn loglike(&self) -> f64 {
        self.loglike
    }

    /// Bayesian information criterion.
    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Innovation variance estimate.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Month of the last training observation.
    pub fn last_timestamp(&self) -> NaiveDate {
        self.last_timestamp
    }

    fn covariate_effect(&self, horizon: usize, future_exog: Option<&[f64]>) -> Result<Vec<f64>> {
        match (self.params.exog, future_exog) {
            (Some(beta), Some(x)) => {
                if x.len() != horizon {
                    return Err(ForecastError::DimensionMismatch {
                        expected: horizon,
                        got: x.len(),
                    });
                }
                if x.iter().any(|v| !v.is_finite()) {
                    return Err(ForecastError::InvalidParameter(
                        "future covariate contains non-finite values".to_string(),
                    ));
                }
                Ok(x.iter().map(|v| beta * v).collect())
            }
            (Some(_), None) => Err(ForecastError::InvalidParameter(
                "model was fitted with a covariate; future covariate values are required"
                    .to_string(),
            )),
            (None, Some(_)) => Err(ForecastError::InvalidParameter(
                "model was fitted without a covariate".to_string(),
            )),
            (None, None) => Ok(vec![0.0; horizon]),
        }
    }
}

impl FittedModel for FittedSarimax {
    fn aic(&self) -> f64 {
        self.aic
    }

    fn forecast(&self, horizon: usize, future_exog: Option<&[f64]>) -> Result<ForecastResult> {
        let effect = self.covariate_effect(horizon, future_exog)?;
        let (means, variances) = kalman::predict(&self.state_space, &self.filtered, horizon);

        let mean: Vec<f64> = means.iter().zip(&effect).map(|(m, e)| m + e).collect();
        let half_width: Vec<f64> = variances.iter().map(|v| CONFIDENCE_Z * v.sqrt()).collect();
        let lower = mean.iter().zip(&half_width).map(|(m, h)| m - h).collect();
        let upper = mean.iter().zip(&half_width).map(|(m, h)| m + h).collect();

        ForecastResult::new(
            following_months(self.last_timestamp, horizon)?,
            mean,
            lower,
            upper,
        )
    }
}

/// Fit `spec` once and forecast `horizon` months past the end of `endog`.
pub fn fit_and_forecast<F: SeasonalFitter>(
    fitter: &F,
    endog: &TimeSeries,
    spec: SarimaxSpec,
    horizon: usize,
    exog: Option<&[f64]>,
    future_exog: Option<&[f64]>,
) -> Result<ForecastResult> {
    fitter.fit(endog, exog, spec)?.forecast(horizon, future_exog)
}
