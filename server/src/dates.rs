//! Calendar-day handling
//!
//! Checklist entries belong to a calendar day (`NaiveDate`), while report
//! filtering works on creation instants (`DateTime<Utc>`). Helpers here
//! keep the two axes apart.

use crate::error::{AppError, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Parse a request date into the calendar day it names.
///
/// Accepts `YYYY-MM-DD`, naive date-times (`2024-01-01T22:00:00`,
/// optionally with fractional seconds or a space separator) and RFC 3339
/// timestamps. Any time-of-day component is truncated; for RFC 3339 input
/// the day is taken in the timestamp's own offset.
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let value = input.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput("date is required".into()));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }

    Err(AppError::InvalidInput(format!("Invalid date format: {}", value)))
}

/// Half-open instant range `[start, end)` covering whole UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayRange {
    /// Start of `first` through the end of `last`, inclusive of both days.
    pub fn spanning(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        if first > last {
            return Err(AppError::InvalidInput(format!(
                "start date {} is after end date {}",
                first, last
            )));
        }
        let next = last
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::InvalidInput(format!("date out of range: {}", last)))?;

        Ok(Self {
            start: start_of_day(first),
            end: start_of_day(next),
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
