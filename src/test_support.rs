//! Synthetic monthly data for unit tests.

use crate::core::month::{add_months, month_start};
use crate::core::TimeSeries;
use chrono::NaiveDate;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seeded standard-normal draws via Box-Muller.
pub fn gaussian_noise(n: usize, sd: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen();
            sd * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
        })
        .collect()
}

/// `n` consecutive month starts beginning at `year`-`month`.
pub fn monthly_timestamps(year: i32, month: u32, n: usize) -> Vec<NaiveDate> {
    let start = month_start(year, month).unwrap();
    (0..n).map(|i| add_months(start, i as i32).unwrap()).collect()
}

/// AR(1) series with the given coefficient and noise scale.
pub fn ar1(n: usize, phi: f64, sd: f64, seed: u64) -> Vec<f64> {
    let noise = gaussian_noise(n, sd, seed);
    let mut values = Vec::with_capacity(n);
    let mut prev = 0.0;
    for e in noise {
        prev = phi * prev + e;
        values.push(prev);
    }
    values
}

/// Anomaly (hundredths of a degree) driven by an ENSO-like covariate.
///
/// Returns a two-column series labelled `anomaly` and `enso`.
pub fn synthetic_history(year: i32, month: u32, n: usize, seed: u64) -> TimeSeries {
    let enso = ar1(n, 0.85, 0.3, seed);
    let noise = ar1(n, 0.5, 3.0, seed.wrapping_add(1));
    let anomaly: Vec<f64> = (0..n)
        .map(|t| 90.0 + 0.05 * t as f64 + 6.0 * enso[t] + noise[t])
        .collect();
    TimeSeries::new(
        monthly_timestamps(year, month, n),
        vec![anomaly, enso],
        vec!["anomaly".to_string(), "enso".to_string()],
    )
    .unwrap()
}
