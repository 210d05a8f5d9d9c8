//! Lenient date handling for backend payloads.
//!
//! The backend stores dates as datetimes, so reads may carry either
//! `2024-01-15` or `2024-01-15T00:00:00[.fff][Z]`. Only the calendar date is kept.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};

pub(crate) fn parse_lenient_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Deserialize an optional date from a date or datetime string.
pub(crate) fn deserialize_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_lenient_date(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid date: {s:?}"))),
    }
}
