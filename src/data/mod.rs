//! Input series: the GISTEMP anomaly table and the ENSO feed.

pub mod enso;
pub mod gistemp;

pub use enso::{parse_enso, EnsoClient, DEFAULT_ENSO_URL};
pub use gistemp::{parse_gistemp, read_gistemp};

use crate::core::month::format_month;
use crate::core::{MissingValuePolicy, TimeSeries};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use tracing::info;

/// Label of the temperature anomaly column.
pub const ANOMALY_COLUMN: &str = "anomaly";

/// Label of the ENSO anomaly column.
pub const ENSO_COLUMN: &str = "enso";

/// Join the anomaly and ENSO series into the modelling history.
///
/// Only months present in both are kept, optionally from `start` onwards.
/// The result carries the [`ANOMALY_COLUMN`] and [`ENSO_COLUMN`] columns.
pub fn load_history(
    anomaly: &TimeSeries,
    enso: &TimeSeries,
    start: Option<NaiveDate>,
) -> Result<TimeSeries> {
    let joined = anomaly
        .project(ANOMALY_COLUMN)?
        .inner_join(&enso.project(ENSO_COLUMN)?)?
        .sanitized(MissingValuePolicy::Drop)?;
    let history = match start {
        Some(date) => joined.since(date),
        None => joined,
    };

    match (history.first_timestamp(), history.last_timestamp()) {
        (Some(first), Some(last)) => {
            info!(
                stage = "prepare",
                months = history.len(),
                first = %format_month(first),
                last = %format_month(last),
                "history assembled"
            );
            Ok(history)
        }
        _ => Err(ForecastError::DataMalformed(
            "anomaly and ENSO series share no months".to_string(),
        )),
    }
}
