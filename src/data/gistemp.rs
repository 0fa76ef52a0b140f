//! GISTEMP monthly anomaly table (`GLB.Ts+dSST.txt`).
//!
//! The table is a fixed-width text file: seven lines of preamble, a header
//! row naming `Year`, `Jan` .. `Dec` and some seasonal means, then one row per
//! year. The header is repeated every twenty or so rows and a footer follows
//! the data. Missing months are written as runs of asterisks.

use super::ANOMALY_COLUMN;
use crate::core::month::month_start;
use crate::core::{MissingValuePolicy, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Zero-based index of the header line.
pub const HEADER_LINE: usize = 7;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Read and clean the table at `path`.
///
/// A missing file is reported as [`ForecastError::DataFileNotFound`] so the
/// caller can tell the user where to download it.
pub fn read_gistemp(path: &Path) -> Result<TimeSeries> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ForecastError::DataFileNotFound(path.display().to_string()),
        _ => ForecastError::DataUnavailable(format!("cannot read {}: {e}", path.display())),
    })?;
    parse_gistemp(&text)
}

fn is_repeated_header(line: &str) -> bool {
    line.contains("Year") && line.contains("Jan")
}

fn column_index(header: &[&str], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| *h == name)
        .ok_or_else(|| ForecastError::DataMalformed(format!("GISTEMP header lacks column '{name}'")))
}

/// Parse the table into a monthly anomaly series.
///
/// The result ends at the last reported month; interior gaps are filled by
/// time-weighted interpolation.
pub fn parse_gistemp(text: &str) -> Result<TimeSeries> {
    let lines: Vec<&str> = text.lines().collect();
    let header: Vec<&str> = lines
        .get(HEADER_LINE)
        .ok_or_else(|| {
            ForecastError::DataMalformed(format!(
                "GISTEMP table has {} lines, expected a header on line {}",
                lines.len(),
                HEADER_LINE + 1
            ))
        })?
        .split_whitespace()
        .collect();

    let year_idx = column_index(&header, "Year")?;
    let month_idx = MONTHS
        .iter()
        .map(|m| column_index(&header, m))
        .collect::<Result<Vec<_>>>()?;

    let mut records: Vec<(NaiveDate, f64)> = Vec::new();
    for line in lines.iter().skip(HEADER_LINE + 1) {
        if line.trim().is_empty() || is_repeated_header(line) {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < header.len() {
            continue;
        }
        let year: i32 = fields[year_idx].parse().map_err(|_| {
            ForecastError::DataMalformed(format!("invalid year '{}'", fields[year_idx]))
        })?;
        for (m, &idx) in month_idx.iter().enumerate() {
            let value = fields[idx].parse::<f64>().unwrap_or(f64::NAN);
            records.push((month_start(year, m as u32 + 1)?, value));
        }
    }
    if records.is_empty() {
        return Err(ForecastError::DataMalformed(
            "GISTEMP table contains no data rows".to_string(),
        ));
    }

    records.sort_by_key(|(date, _)| *date);
    records.dedup_by_key(|(date, _)| *date);
    let (timestamps, values): (Vec<NaiveDate>, Vec<f64>) = records.into_iter().unzip();
    let raw = TimeSeries::labelled(ANOMALY_COLUMN, timestamps, values)?;

    let series = raw
        .truncated_to_last_valid()
        .interpolated()
        .sanitized(MissingValuePolicy::Drop)?;
    if series.is_empty() {
        return Err(ForecastError::DataMalformed(
            "GISTEMP table has no reported months".to_string(),
        ));
    }
    debug!(
        stage = "prepare",
        months = series.len(),
        dropped = raw.len() - series.len(),
        "parsed GISTEMP table"
    );
    Ok(series)
}
