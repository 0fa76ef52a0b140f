//! Synthetic inputs shared by the integration tests.

#![allow(dead_code)]

use anomaly_forecast::core::month::{add_months, month_start};
use anomaly_forecast::core::TimeSeries;
use anomaly_forecast::data::{ANOMALY_COLUMN, ENSO_COLUMN};
use chrono::NaiveDate;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub fn monthly_timestamps(year: i32, month: u32, n: usize) -> Vec<NaiveDate> {
    let start = month_start(year, month).unwrap();
    (0..n).map(|i| add_months(start, i as i32).unwrap()).collect()
}

/// AR(1) path driven by seeded Gaussian noise.
pub fn ar1(n: usize, phi: f64, sd: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut prev = 0.0;
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen();
            let e = sd * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            prev = phi * prev + e;
            prev
        })
        .collect()
}

/// Monthly anomaly and ENSO series as two separate inputs.
///
/// The anomaly (hundredths of a degree) follows a slow trend, a twelve-month
/// cycle and six times the ENSO index, plus autocorrelated noise.
pub fn synthetic_inputs(year: i32, month: u32, n: usize, seed: u64) -> (TimeSeries, TimeSeries) {
    let timestamps = monthly_timestamps(year, month, n);
    let enso = ar1(n, 0.85, 0.3, seed);
    let noise = ar1(n, 0.5, 3.0, seed.wrapping_add(1));
    let anomaly: Vec<f64> = (0..n)
        .map(|t| {
            let season = 2.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin();
            90.0 + 0.05 * t as f64 + season + 6.0 * enso[t] + noise[t]
        })
        .collect();
    (
        TimeSeries::labelled(ANOMALY_COLUMN, timestamps.clone(), anomaly).unwrap(),
        TimeSeries::labelled(ENSO_COLUMN, timestamps, enso).unwrap(),
    )
}

/// GISTEMP-style table text covering whole years from `first_year`.
///
/// `values` fill the months in order; months beyond them print as asterisks.
pub fn gistemp_table(first_year: i32, values: &[f64]) -> String {
    let mut text = String::new();
    text.push_str("GLOBAL Land-Ocean Temperature Index in 0.01 degrees Celsius\n");
    for i in 1..7 {
        text.push_str(&format!("preamble {i}\n"));
    }
    let header = "Year   Jan  Feb  Mar  Apr  May  Jun  Jul  Aug  Sep  Oct  Nov  Dec    J-D D-N    DJF  MAM  JJA  SON  Year";
    let years = values.len().div_ceil(12);
    for y in 0..years {
        if y % 20 == 0 {
            text.push_str(header);
            text.push('\n');
        }
        let year = first_year + y as i32;
        let mut row = format!("{year}");
        for m in 0..12 {
            match values.get(y * 12 + m) {
                Some(v) => row.push_str(&format!(" {:4}", v.round() as i64)),
                None => row.push_str(" ****"),
            }
        }
        row.push_str("   ***  ***   ***  ***  ***  ***");
        row.push_str(&format!("  {year}\n"));
        text.push_str(&row);
    }
    text.push_str("\nDivide by 100 to get changes in degrees Celsius (deg-C).\n");
    text
}

/// CPC-style ENSO feed text.
pub fn enso_feed(series: &TimeSeries) -> String {
    use chrono::Datelike;
    let mut text = String::from(" YR   MON  TOTAL ClimAdjust ANOM\n");
    for (date, value) in series.timestamps().iter().zip(series.primary_values()) {
        text.push_str(&format!(
            "{:4} {:3}   {:.2}   {:.2}   {:.2}\n",
            date.year(),
            date.month(),
            26.5 + value,
            26.5,
            value
        ));
    }
    text
}
