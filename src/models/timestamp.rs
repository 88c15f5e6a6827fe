//! Database timestamp helpers.
//!
//! Source and feed tables store timestamps as 14-digit `YYYYMMDDHHMMSS` UTC
//! strings, which sort lexicographically in time order.

use chrono::{DateTime, NaiveDateTime, Utc};

const FORMAT: &str = "%Y%m%d%H%M%S";

/// Format a UTC time for storage.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(FORMAT).to_string()
}

/// Parse a stored timestamp.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a stored timestamp, defaulting to Unix epoch on error.
pub fn parse_timestamp_or_epoch(s: &str) -> DateTime<Utc> {
    parse_timestamp(s).unwrap_or(DateTime::UNIX_EPOCH)
}
