//! Monthly Niño 3.4 anomalies from the NOAA CPC text feed.
//!
//! The feed is whitespace-delimited with a header row, e.g.
//!
//! ```text
//! YR   MON  TOTAL ClimAdjust ANOM
//! 1950   1   24.56   26.18   -1.62
//! ```

use super::ENSO_COLUMN;
use crate::core::month::month_start;
use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info};

/// Detrended Niño 3.4 index published by the Climate Prediction Center.
pub const DEFAULT_ENSO_URL: &str =
    "https://www.cpc.ncep.noaa.gov/products/analysis_monitoring/ensostuff/detrend.nino34.ascii.txt";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

fn malformed(message: impl Into<String>) -> ForecastError {
    ForecastError::DataMalformed(message.into())
}

/// Parse the feed text into a monthly ENSO series.
pub fn parse_enso(text: &str) -> Result<TimeSeries> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| malformed("ENSO feed is empty"))?
        .split_whitespace()
        .collect();
    let find = |name: &str| {
        header
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| malformed(format!("ENSO header lacks column '{name}'")))
    };
    let (yr, mon, anom) = (find("YR")?, find("MON")?, find("ANOM")?);
    let width = yr.max(mon).max(anom) + 1;

    let mut records: Vec<(NaiveDate, f64)> = Vec::new();
    for (row, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < width {
            return Err(malformed(format!(
                "ENSO row {} has {} fields, expected at least {width}",
                row + 1,
                fields.len()
            )));
        }
        let bad = |what: &str| malformed(format!("ENSO row {}: invalid {what} in '{line}'", row + 1));
        let year: i32 = fields[yr].parse().map_err(|_| bad("year"))?;
        let month: u32 = fields[mon].parse().map_err(|_| bad("month"))?;
        let value: f64 = fields[anom].parse().map_err(|_| bad("anomaly"))?;
        records.push((month_start(year, month).map_err(|_| bad("date"))?, value));
    }
    if records.is_empty() {
        return Err(malformed("ENSO feed contains no data rows"));
    }

    records.sort_by_key(|(date, _)| *date);
    records.dedup_by_key(|(date, _)| *date);
    let (timestamps, values): (Vec<NaiveDate>, Vec<f64>) = records.into_iter().unzip();
    TimeSeries::labelled(ENSO_COLUMN, timestamps, values)
}

/// Blocking HTTP client for the ENSO feed.
#[derive(Debug, Clone)]
pub struct EnsoClient {
    client: reqwest::blocking::Client,
}

impl EnsoClient {
    /// Client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ForecastError::DataUnavailable(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Download and parse the feed at `url`.
    ///
    /// Transport failures and non-success statuses are
    /// [`ForecastError::DataUnavailable`]; there are no retries.
    pub fn fetch(&self, url: &str) -> Result<TimeSeries> {
        debug!(stage = "prepare", url, "fetching ENSO feed");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ForecastError::DataUnavailable(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForecastError::DataUnavailable(format!(
                "{url} returned HTTP {status}"
            )));
        }
        let text = response
            .text()
            .map_err(|e| ForecastError::DataUnavailable(format!("cannot read body from {url}: {e}")))?;

        let series = parse_enso(&text)?;
        info!(stage = "prepare", months = series.len(), "ENSO feed loaded");
        Ok(series)
    }
}
