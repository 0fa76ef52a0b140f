//! Statistical utility functions.

use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided 95% standard-normal quantile used for every forecast interval.
///
/// The probability converter inverts intervals with the rounded value
/// [`INTERVAL_Z_ROUNDED`], so the two must stay in step.
pub const CONFIDENCE_Z: f64 = 1.959963984540054;

/// The rounded 95% quantile used to back a standard error out of an interval.
pub const INTERVAL_Z_ROUNDED: f64 = 1.95996;

/// CDF of Normal(mean, sd) at `x`; `sd` must be positive.
pub fn normal_cdf(x: f64, mean: f64, sd: f64) -> f64 {
    standard_normal().cdf((x - mean) / sd)
}

fn standard_normal() -> Normal {
    Normal::standard()
}

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the autocorrelation at a given lag.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    if values.len() <= lag {
        return f64::NAN;
    }
    let m = mean(values);

    let denominator: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    if denominator == 0.0 {
        return 0.0;
    }
    let numerator: f64 = values
        .iter()
        .skip(lag)
        .zip(values.iter())
        .map(|(a, b)| (a - m) * (b - m))
        .sum();

    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn confidence_z_is_the_975_quantile() {
        let normal = standard_normal();
        assert_relative_eq!(normal.inverse_cdf(0.975), CONFIDENCE_Z, epsilon = 1e-8);
        assert_relative_eq!(normal.inverse_cdf(0.025), -CONFIDENCE_Z, epsilon = 1e-8);
    }

    #[test]
    fn rounded_quantile_matches_exact_one() {
        assert_relative_eq!(INTERVAL_Z_ROUNDED, CONFIDENCE_Z, epsilon = 1e-5);
    }

    #[test]
    fn normal_cdf_is_shifted_and_scaled() {
        assert_relative_eq!(normal_cdf(110.0, 110.0, 5.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(
            normal_cdf(110.0 + 5.0 * CONFIDENCE_Z, 110.0, 5.0),
            0.975,
            epsilon = 1e-9
        );
    }

    #[test]
    fn mean_of_slice() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0, epsilon = 1e-10);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn autocorrelation_lag_0_is_1() {
        assert_relative_eq!(
            autocorrelation(&[1.0, 2.0, 3.0, 4.0, 5.0], 0),
            1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn autocorrelation_of_trend_is_high() {
        let values: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert!(autocorrelation(&values, 1) > 0.8);
        assert_eq!(autocorrelation(&[2.0, 2.0, 2.0], 1), 0.0);
        assert!(autocorrelation(&[1.0], 3).is_nan());
    }
}
