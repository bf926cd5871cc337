//! Epoch-millisecond timestamp helpers shared by storage and enrichment.

use chrono::{DateTime, SecondsFormat, Utc};

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Returns `base` shifted forward by `days` whole days.
pub fn add_days(base: i64, days: u32) -> i64 {
    base.saturating_add(i64::from(days).saturating_mul(DAY_MS))
}

/// Formats epoch milliseconds as an RFC 3339 UTC string.
///
/// Returns `None` for values outside chrono's representable range.
pub fn format_epoch_ms(value: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parses an RFC 3339 timestamp into epoch milliseconds.
pub fn parse_rfc3339_ms(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.timestamp_millis())
}
