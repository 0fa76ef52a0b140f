//! Kalman filter with concentrated likelihood.
//!
//! The innovation variance is profiled out: the filter runs with unit shock
//! variance and the scale is estimated from the standardised innovations.

use super::state_space::StateSpace;
use crate::error::{ForecastError, Result};
use std::f64::consts::PI;

/// Prior variance of the approximate diffuse initial state.
pub const DIFFUSE_VARIANCE: f64 = 1e6;

const MIN_INNOVATION_VARIANCE: f64 = 1e-12;
const STEADY_STATE_TOLERANCE: f64 = 1e-10;

/// Filter summary needed for estimation and forecasting.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    /// Concentrated log-likelihood.
    pub loglike: f64,
    /// Estimated innovation variance.
    pub scale: f64,
    /// Innovations contributing to the likelihood.
    pub n_eff: usize,
    /// Predicted state one step past the sample.
    pub next_state: Vec<f64>,
    /// Predicted state covariance one step past the sample (unit scale).
    pub next_cov: Vec<f64>,
}

/// Run the filter over `observations`, skipping the first `burn` innovations
/// in the likelihood.
pub fn filter(model: &StateSpace, observations: &[f64], burn: usize) -> Result<FilterOutput> {
    let k = model.k_states();
    let mut state = vec![0.0; k];
    let mut cov = vec![0.0; k * k];
    for i in 0..k {
        cov[i * k + i] = DIFFUSE_VARIANCE;
    }

    let mut sum_log_f = 0.0;
    let mut sum_sq = 0.0;
    let mut n_eff = 0usize;

    let mut steady = false;
    let mut pz = model.cov_times_design(&cov);
    let mut f = model.observe(&pz);
    let mut filtered_cov = cov.clone();

    for (t, &y) in observations.iter().enumerate() {
        if !steady {
            pz = model.cov_times_design(&cov);
            f = model.observe(&pz);
        }
        if !f.is_finite() {
            return Err(ForecastError::ComputationError(
                "non-finite innovation variance".to_string(),
            ));
        }

        let v = y - model.observe(&state);
        if f > MIN_INNOVATION_VARIANCE {
            if t >= burn {
                sum_log_f += f.ln();
                sum_sq += v * v / f;
                n_eff += 1;
            }
            let gain = v / f;
            for (a, p) in state.iter_mut().zip(&pz) {
                *a += p * gain;
            }
            if !steady {
                filtered_cov.copy_from_slice(&cov);
                for i in 0..k {
                    for j in 0..k {
                        filtered_cov[i * k + j] -= pz[i] * pz[j] / f;
                    }
                }
            }
        } else if !steady {
            filtered_cov.copy_from_slice(&cov);
        }

        state = model.transition_state(&state);
        if !steady {
            let next = model.transition_cov(&filtered_cov);
            let change = next
                .iter()
                .zip(&cov)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            let magnitude = next.iter().map(|v| v.abs()).fold(1.0, f64::max);
            steady = t >= burn && change <= STEADY_STATE_TOLERANCE * magnitude;
            cov = next;
        }
    }

    if n_eff == 0 {
        return Err(ForecastError::InsufficientData {
            needed: burn + 1,
            got: observations.len(),
        });
    }

    let scale = sum_sq / n_eff as f64;
    if !scale.is_finite() || scale <= f64::MIN_POSITIVE {
        return Err(ForecastError::ComputationError(
            "degenerate innovation variance".to_string(),
        ));
    }
    let n = n_eff as f64;
    let loglike = -0.5 * n * ((2.0 * PI).ln() + 1.0 + scale.ln()) - 0.5 * sum_log_f;

    Ok(FilterOutput {
        loglike,
        scale,
        n_eff,
        next_state: state,
        next_cov: cov,
    })
}

/// Multi-step predictions `(mean, variance)` of the observed process.
pub fn predict(model: &StateSpace, output: &FilterOutput, horizon: usize) -> (Vec<f64>, Vec<f64>) {
    let mut state = output.next_state.clone();
    let mut cov = output.next_cov.clone();
    let mut means = Vec::with_capacity(horizon);
    let mut variances = Vec::with_capacity(horizon);

    for h in 0..horizon {
        means.push(model.observe(&state));
        let pz = model.cov_times_design(&cov);
        variances.push(model.observe(&pz).max(0.0) * output.scale);
        if h + 1 < horizon {
            state = model.transition_state(&state);
            cov = model.transition_cov(&cov);
        }
    }
    (means, variances)
}
