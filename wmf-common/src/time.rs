//! Timestamp utilities

use chrono::{DateTime, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a date as published in remote feature configs
///
/// Accepts RFC 3339 timestamps (`2024-01-01T00:00:00Z`) and bare dates
/// (`2024-01-01`, read as midnight UTC).
pub fn parse_config_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
