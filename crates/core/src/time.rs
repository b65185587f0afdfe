// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Origin-time parsing and formatting.
//!
//! Incoming triggers carry the origin time as a string in one of two
//! accepted formats; the first is also the canonical serialization used in
//! the event descriptor file.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Canonical origin-time format: `2024-01-01T00:00:00Z`.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Fallback format with fractional seconds: `2024-01-01T00:00:00.123Z`.
pub const ALT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Failure to interpret an origin-time string.
#[derive(Debug, Error)]
#[error("unparseable event time '{value}'")]
pub struct TimeParseError {
    pub value: String,
}

/// Parse an origin-time string, trying the canonical format first and the
/// fractional-seconds fallback second. Times are interpreted as UTC.
pub fn parse_event_time(value: &str) -> Result<DateTime<Utc>, TimeParseError> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, ALT_TIME_FORMAT))
        .map(|naive| naive.and_utc())
        .map_err(|_| TimeParseError {
            value: value.to_string(),
        })
}

/// Serialize a parsed origin time back into the canonical format.
pub fn format_event_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;
