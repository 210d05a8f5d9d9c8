//! Human-readable durations like "2m", "15s" or "4000ms" for config files and CLI flags.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer, Serializer};

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// Parse a duration string.
///
/// Supported units: `d`, `h`, `m`, `s` and `ms`. Input is case-insensitive and
/// surrounding whitespace is ignored.
///
/// ```
/// use finsight::duration::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
/// assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
/// assert_eq!(parse_duration("4000ms").unwrap(), Duration::from_millis(4000));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .context("Duration must end with d, h, m, s, or ms")?;
    let (num, unit) = s.split_at(split);
    if num.is_empty() {
        anyhow::bail!("Duration is missing a number");
    }

    let num: u64 = num.parse().context("Invalid number in duration")?;
    let unit_millis = match unit {
        "d" => MILLIS_PER_DAY,
        "h" => MILLIS_PER_HOUR,
        "m" => MILLIS_PER_MINUTE,
        "s" => MILLIS_PER_SECOND,
        "ms" => 1,
        other => anyhow::bail!("Unknown duration unit {other:?}; use d, h, m, s, or ms"),
    };

    let millis = num
        .checked_mul(unit_millis)
        .context("Duration is too large")?;
    Ok(Duration::from_millis(millis))
}

/// Format a duration with the largest unit that divides it evenly.
///
/// ```
/// use finsight::duration::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(120)), "2m");
/// assert_eq!(format_duration(Duration::from_millis(4500)), "4500ms");
/// ```
pub fn format_duration(d: Duration) -> String {
    let millis = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);

    for (unit, size) in [
        ("d", MILLIS_PER_DAY),
        ("h", MILLIS_PER_HOUR),
        ("m", MILLIS_PER_MINUTE),
        ("s", MILLIS_PER_SECOND),
    ] {
        if millis >= size && millis % size == 0 {
            return format!("{}{unit}", millis / size);
        }
    }

    if millis == 0 {
        "0s".to_string()
    } else {
        format!("{millis}ms")
    }
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}

/// Serde serializer writing durations in the same form [`parse_duration`] reads.
pub fn serialize_duration<S>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*d))
}
