//! Monthly TimeSeries data structure.

use crate::core::month::{format_month, is_month_start};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};

/// Policy for handling missing values (NaN/Inf).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissingValuePolicy {
    /// Drop observations where any column is missing.
    Drop,
    /// Return error if missing values found.
    Error,
}

/// A monthly time series with one or more labelled columns.
///
/// Every timestamp is the first day of its month and timestamps are
/// strictly increasing, so each calendar month appears at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDate>,
    /// Values stored in column-major format: values[column][observation]
    values: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl TimeSeries {
    /// Create a series from column-major values.
    ///
    /// `labels` may be empty; otherwise it must name every column.
    pub fn new(
        timestamps: Vec<NaiveDate>,
        values: Vec<Vec<f64>>,
        labels: Vec<String>,
    ) -> Result<Self> {
        for date in &timestamps {
            if !is_month_start(*date) {
                return Err(ForecastError::TimestampError(format!(
                    "{date} is not the first day of a month"
                )));
            }
        }
        for pair in timestamps.windows(2) {
            if pair[1] <= pair[0] {
                return Err(ForecastError::TimestampError(format!(
                    "timestamps must be strictly increasing ({} then {})",
                    format_month(pair[0]),
                    format_month(pair[1])
                )));
            }
        }
        for column in &values {
            if column.len() != timestamps.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: timestamps.len(),
                    got: column.len(),
                });
            }
        }
        if !labels.is_empty() && labels.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: values.len(),
                got: labels.len(),
            });
        }

        Ok(Self {
            timestamps,
            values,
            labels,
        })
    }

    /// Create a single-column series.
    pub fn univariate(timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        Self::new(timestamps, vec![values], vec![])
    }

    /// Create a single labelled column.
    pub fn labelled(label: &str, timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        Self::new(timestamps, vec![values], vec![label.to_string()])
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get the number of columns.
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn first_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDate> {
        self.timestamps.last().copied()
    }

    /// Get primary (first column) values.
    pub fn primary_values(&self) -> &[f64] {
        self.values.first().map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Look up a column by label.
    pub fn column(&self, label: &str) -> Result<&[f64]> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.values[i].as_slice())
            .ok_or_else(|| ForecastError::DataMalformed(format!("missing column '{label}'")))
    }

    /// A single labelled column as its own series.
    pub fn project(&self, label: &str) -> Result<TimeSeries> {
        let values = self.column(label)?.to_vec();
        TimeSeries::labelled(label, self.timestamps.clone(), values)
    }

    /// All rows up to and including `date`.
    pub fn through(&self, date: NaiveDate) -> TimeSeries {
        let end = self.timestamps.partition_point(|t| *t <= date);
        self.rows(0, end)
    }

    /// All rows strictly after `date`.
    pub fn after(&self, date: NaiveDate) -> TimeSeries {
        let start = self.timestamps.partition_point(|t| *t <= date);
        self.rows(start, self.len())
    }

    /// All rows on or after `date`.
    pub fn since(&self, date: NaiveDate) -> TimeSeries {
        let start = self.timestamps.partition_point(|t| *t < date);
        self.rows(start, self.len())
    }

    fn rows(&self, start: usize, end: usize) -> TimeSeries {
        TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self
                .values
                .iter()
                .map(|column| column[start..end].to_vec())
                .collect(),
            labels: self.labels.clone(),
        }
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values
            .iter()
            .any(|column| column.iter().any(|v| !v.is_finite()))
    }

    /// Return a copy with missing values handled.
    pub fn sanitized(&self, policy: MissingValuePolicy) -> Result<TimeSeries> {
        match policy {
            MissingValuePolicy::Error => {
                if self.has_missing_values() {
                    return Err(ForecastError::DataMalformed(
                        "missing values detected in data".to_string(),
                    ));
                }
                Ok(self.clone())
            }
            MissingValuePolicy::Drop => {
                let keep: Vec<usize> = (0..self.len())
                    .filter(|&i| self.values.iter().all(|column| column[i].is_finite()))
                    .collect();

                Ok(TimeSeries {
                    timestamps: keep.iter().map(|&i| self.timestamps[i]).collect(),
                    values: self
                        .values
                        .iter()
                        .map(|column| keep.iter().map(|&i| column[i]).collect())
                        .collect(),
                    labels: self.labels.clone(),
                })
            }
        }
    }

    /// Drop every row after the last one whose primary value is present.
    ///
    /// Trailing gaps are never extrapolated.
    pub fn truncated_to_last_valid(&self) -> TimeSeries {
        let end = self
            .primary_values()
            .iter()
            .rposition(|v| v.is_finite())
            .map(|i| i + 1)
            .unwrap_or(0);
        self.rows(0, end)
    }

    /// Return a copy with interior gaps filled by time-weighted linear interpolation.
    ///
    /// Weights follow elapsed days, so a gap in February counts for less
    /// than one in March. Leading and trailing gaps are left missing.
    pub fn interpolated(&self) -> TimeSeries {
        let days: Vec<f64> = self
            .timestamps
            .iter()
            .map(|d| d.num_days_from_ce() as f64)
            .collect();

        TimeSeries {
            timestamps: self.timestamps.clone(),
            values: self
                .values
                .iter()
                .map(|column| interpolate_by_time(column, &days))
                .collect(),
            labels: self.labels.clone(),
        }
    }

    /// Inner join on timestamps, keeping the columns of both series.
    ///
    /// Months present in only one series are dropped.
    pub fn inner_join(&self, other: &TimeSeries) -> Result<TimeSeries> {
        let mut timestamps = Vec::new();
        let mut values = vec![Vec::new(); self.dimensions() + other.dimensions()];

        let (mut i, mut j) = (0, 0);
        while i < self.len() && j < other.len() {
            match self.timestamps[i].cmp(&other.timestamps[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    timestamps.push(self.timestamps[i]);
                    let row = self
                        .values
                        .iter()
                        .map(|c| c[i])
                        .chain(other.values.iter().map(|c| c[j]));
                    for (column, value) in values.iter_mut().zip(row) {
                        column.push(value);
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        let labels = if self.labels.is_empty() || other.labels.is_empty() {
            vec![]
        } else {
            self.labels
                .iter()
                .chain(other.labels.iter())
                .cloned()
                .collect()
        };

        TimeSeries::new(timestamps, values, labels)
    }
}

/// Linear interpolation over time for a column with NaN values.
fn interpolate_by_time(values: &[f64], days: &[f64]) -> Vec<f64> {
    let mut result = values.to_vec();
    let n = result.len();

    let mut i = 0;
    while i < n {
        if result[i].is_finite() {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && !result[i].is_finite() {
            i += 1;
        }
        let end = i;

        // Only gaps bounded on both sides are filled
        if start > 0 && end < n {
            let (x0, y0) = (days[start - 1], result[start - 1]);
            let (x1, y1) = (days[end], result[end]);
            for idx in start..end {
                let t = (days[idx] - x0) / (x1 - x0);
                result[idx] = y0 + t * (y1 - y0);
            }
        }
    }

    result
}
