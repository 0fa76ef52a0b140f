//! Calendar-month arithmetic.
//!
//! Monthly series are indexed by the first day of each month.

use crate::error::{ForecastError, Result};
use chrono::{Datelike, Months, NaiveDate};

/// First day of the given month.
pub fn month_start(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        ForecastError::TimestampError(format!("invalid year/month {year}-{month:02}"))
    })
}

/// Parse a `YYYYMM` string into the first day of that month.
pub fn parse_year_month(text: &str) -> Result<NaiveDate> {
    let text = text.trim();
    if text.len() != 6 || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(ForecastError::TimestampError(format!(
            "expected YYYYMM, got '{text}'"
        )));
    }
    let year: i32 = text[..4]
        .parse()
        .map_err(|_| ForecastError::TimestampError(format!("bad year in '{text}'")))?;
    let month: u32 = text[4..]
        .parse()
        .map_err(|_| ForecastError::TimestampError(format!("bad month in '{text}'")))?;
    month_start(year, month)
}

/// Render a month as `YYYY-MM`.
pub fn format_month(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Whether the date is the first day of a month.
pub fn is_month_start(date: NaiveDate) -> bool {
    date.day() == 1
}

/// Shift a month-start date by a signed number of months.
pub fn add_months(date: NaiveDate, months: i32) -> Result<NaiveDate> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.ok_or_else(|| {
        ForecastError::TimestampError(format!(
            "cannot shift {} by {months} months",
            format_month(date)
        ))
    })
}

/// Number of whole months from `from` to `to` (negative when `to` is earlier).
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// The `count` consecutive months following `after`.
pub fn following_months(after: NaiveDate, count: usize) -> Result<Vec<NaiveDate>> {
    (1..=count as i32).map(|i| add_months(after, i)).collect()
}
