//! Differencing and lag-polynomial utilities for SARIMAX models.
//!
//! Polynomials are stored as coefficient vectors indexed by lag power, so
//! `[1.0, -0.5]` is `1 - 0.5L`.

/// Apply ordinary differencing `d` times.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `d` times at lag `period`.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Apply `(1 - L)^d (1 - L^period)^seasonal_d` to a series.
pub fn full_difference(series: &[f64], d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    seasonal_difference(&difference(series, d), seasonal_d, period)
}

/// Product of two lag polynomials.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 + sign * (c_1 L^step + c_2 L^(2 step) + ...)`.
fn lag_polynomial(coefficients: &[f64], step: usize, sign: f64) -> Vec<f64> {
    let mut poly = vec![0.0; coefficients.len() * step + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// Coefficients `delta_i` with `y_t = sum delta_i y_{t-i} + u_t`, where `u_t`
/// is the differenced series.
///
/// Index 0 holds `delta_1`. The length is `d + period * seasonal_d`.
pub fn differencing_coefficients(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &lag_polynomial(&[1.0], period, -1.0));
        }
    }
    poly.iter().skip(1).map(|c| -c).collect()
}

/// Reduced AR coefficients of `phi(L) Phi(L^period)`.
///
/// The product is written `1 - sum c_i L^i`; index 0 holds `c_1`.
pub fn reduced_ar(ar: &[f64], seasonal_ar: &[f64], period: usize) -> Vec<f64> {
    let product = poly_mul(
        &lag_polynomial(ar, 1, -1.0),
        &lag_polynomial(seasonal_ar, period.max(1), -1.0),
    );
    product.iter().skip(1).map(|c| -c).collect()
}

/// Reduced MA coefficients of `theta(L) Theta(L^period)`.
///
/// The product is written `1 + sum m_i L^i`; index 0 holds `m_1`.
pub fn reduced_ma(ma: &[f64], seasonal_ma: &[f64], period: usize) -> Vec<f64> {
    let product = poly_mul(
        &lag_polynomial(ma, 1, 1.0),
        &lag_polynomial(seasonal_ma, period.max(1), 1.0),
    );
    product.into_iter().skip(1).collect()
}

/// Whether every inverse root of `1 - sum c_i L^i` has modulus below `modulus`.
///
/// Runs the Schur-Cohn step-down recursion on the coefficients scaled by
/// `modulus^-i`; the polynomial passes when every reflection coefficient lies
/// strictly inside `(-1, 1)`. Index 0 holds `c_1`.
pub fn inverse_roots_within(coefficients: &[f64], modulus: f64) -> bool {
    let mut a: Vec<f64> = coefficients
        .iter()
        .zip(1..)
        .map(|(c, power)| c / modulus.powi(power))
        .collect();
    while let Some(&r) = a.last() {
        if !r.is_finite() || r.abs() >= 1.0 {
            return false;
        }
        let k = a.len();
        let scale = 1.0 - r * r;
        a = (0..k - 1).map(|j| (a[j] + r * a[k - 2 - j]) / scale).collect();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_order_1() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn difference_order_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
        assert_eq!(difference(&series, 0), series);
    }

    #[test]
    fn difference_runs_out_of_data() {
        assert!(difference(&[1.0], 1).is_empty());
        assert!(seasonal_difference(&[1.0, 2.0, 3.0], 1, 3).is_empty());
    }

    #[test]
    fn seasonal_difference_basic() {
        let series = vec![
            100.0, 120.0, 80.0, 90.0, // year 1
            110.0, 130.0, 90.0, 100.0, // year 2
        ];
        assert_eq!(seasonal_difference(&series, 1, 4), vec![10.0; 4]);
    }

    #[test]
    fn full_difference_combines_both() {
        // Seasonal pattern plus linear trend vanishes under (1-L)(1-L^4)
        let series: Vec<f64> = (0..16)
            .map(|i| [3.0, -1.0, 2.0, 0.0][i % 4] + 0.5 * i as f64)
            .collect();
        let out = full_difference(&series, 1, 1, 4);
        assert_eq!(out.len(), 11);
        assert!(out.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn poly_mul_expands_product() {
        // (1 - L)(1 + L) = 1 - L^2
        assert_eq!(poly_mul(&[1.0, -1.0], &[1.0, 1.0]), vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn differencing_coefficients_of_first_difference() {
        assert_eq!(differencing_coefficients(1, 0, 12), vec![1.0]);
        assert_eq!(differencing_coefficients(2, 0, 12), vec![2.0, -1.0]);
        assert!(differencing_coefficients(0, 0, 12).is_empty());
    }

    #[test]
    fn differencing_coefficients_of_seasonal_difference() {
        // (1 - L)(1 - L^12) = 1 - L - L^12 + L^13
        let delta = differencing_coefficients(1, 1, 12);
        assert_eq!(delta.len(), 13);
        assert_eq!(delta[0], 1.0);
        assert!(delta[1..11].iter().all(|&c| c == 0.0));
        assert_eq!(delta[11], 1.0);
        assert_eq!(delta[12], -1.0);
    }

    #[test]
    fn reduced_ar_multiplies_seasonal_factor() {
        // (1 - 0.5L)(1 - 0.3L^12): c_1 = 0.5, c_12 = 0.3, c_13 = -0.15
        let c = reduced_ar(&[0.5], &[0.3], 12);
        assert_eq!(c.len(), 13);
        assert_relative_eq!(c[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(c[11], 0.3, epsilon = 1e-12);
        assert_relative_eq!(c[12], -0.15, epsilon = 1e-12);
    }

    #[test]
    fn reduced_ma_multiplies_seasonal_factor() {
        // (1 + 0.4L)(1 + 0.2L^12): m_1 = 0.4, m_12 = 0.2, m_13 = 0.08
        let m = reduced_ma(&[0.4], &[0.2], 12);
        assert_eq!(m.len(), 13);
        assert_relative_eq!(m[0], 0.4, epsilon = 1e-12);
        assert_relative_eq!(m[11], 0.2, epsilon = 1e-12);
        assert_relative_eq!(m[12], 0.08, epsilon = 1e-12);
    }

    #[test]
    fn empty_coefficients_reduce_to_nothing() {
        assert!(reduced_ar(&[], &[], 12).is_empty());
        assert!(reduced_ma(&[], &[], 12).is_empty());
        assert_eq!(reduced_ar(&[0.7], &[], 12), vec![0.7]);
    }

    #[test]
    fn stable_ar_polynomials_pass() {
        assert!(inverse_roots_within(&[], 0.999));
        assert!(inverse_roots_within(&[0.5], 0.999));
        assert!(inverse_roots_within(&[-0.99], 0.999));
        // inverse roots 0.6 +/- 0.374i, modulus sqrt(0.5)
        assert!(inverse_roots_within(&[1.2, -0.5], 0.999));
        assert!(!inverse_roots_within(&[1.2, -0.5], 0.7));
    }

    #[test]
    fn explosive_and_unit_roots_fail() {
        assert!(!inverse_roots_within(&[1.68], 0.999));
        assert!(!inverse_roots_within(&[-2.88], 0.999));
        assert!(!inverse_roots_within(&[1.0], 0.999));
        // 1 - 0.5L - 0.5L^2 has a root at L = 1
        assert!(!inverse_roots_within(&[0.5, 0.5], 0.999));
        assert!(!inverse_roots_within(&[f64::NAN], 0.999));
    }
}
