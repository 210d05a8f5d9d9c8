//! Staleness of dashboard data.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Result of a staleness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalenessCheck {
    pub is_stale: bool,
    pub age: Option<Duration>,
    pub threshold: Duration,
}

impl StalenessCheck {
    pub fn stale(age: Duration, threshold: Duration) -> Self {
        Self { is_stale: true, age: Some(age), threshold }
    }

    pub fn fresh(age: Duration, threshold: Duration) -> Self {
        Self { is_stale: false, age: Some(age), threshold }
    }

    /// Nothing has been loaded yet; always stale.
    pub fn missing(threshold: Duration) -> Self {
        Self { is_stale: true, age: None, threshold }
    }
}

/// Check whether data last updated at `last_updated` is older than `threshold`.
///
/// A timestamp in the future (clock adjustments) counts as age zero.
pub fn check_dashboard_staleness(
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: Duration,
) -> StalenessCheck {
    match last_updated {
        Some(at) => {
            let age = (now - at).to_std().unwrap_or(Duration::ZERO);
            if age > threshold {
                StalenessCheck::stale(age, threshold)
            } else {
                StalenessCheck::fresh(age, threshold)
            }
        }
        None => StalenessCheck::missing(threshold),
    }
}

/// Log a staleness check result.
pub fn log_dashboard_staleness(check: &StalenessCheck) {
    let status = if check.is_stale { "stale" } else { "fresh" };
    let age_str = check
        .age
        .map(crate::duration::format_duration)
        .unwrap_or_else(|| "never".to_string());
    let threshold_str = crate::duration::format_duration(check.threshold);

    debug!(
        age = %age_str,
        threshold = %threshold_str,
        status = status,
        "dashboard staleness check"
    );
}
