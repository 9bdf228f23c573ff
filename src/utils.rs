use chrono::{DateTime, NaiveDate, NaiveDateTime};
use uuid::Uuid;
use crate::{MetanetError, Result};

pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn format_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "invalid timestamp".to_string(),
    }
}

/// Parses a UTC date or date-time into epoch seconds.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` and `YYYY-MM-DD HH:MM:SS`.
pub fn parse_datetime(input: &str) -> Result<i64> {
    let input = input.trim();

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt.and_utc().timestamp());
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| MetanetError::Parse(format!("Invalid date/time: {}", input)))
}
