// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized JST (UTC+9) <-> UTC-naive ISO8601 conversion.
//!
//! Per the design notes: conversions happen in exactly two functions,
//! called only at the index gateway boundary. Nothing else in the crate
//! should reach for its own offset arithmetic.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// Fixed JST offset, UTC+9, matching the original service's hardcoded
/// `timezone(timedelta(hours=+9))`.
pub const JST_OFFSET_SECONDS: i32 = 9 * 3600;

#[allow(clippy::expect_used)]
fn jst_offset() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECONDS).expect("JST offset is a valid fixed offset")
}

/// Parse an operator-supplied local (JST) ISO8601 timestamp and render it
/// as a UTC-naive ISO8601 string suitable for the index's storage format.
///
/// The input is always interpreted as JST wall-clock time, per the
/// operator-facing contract — callers that need to handle `Z`-suffixed
/// (already-UTC) input should detect that before calling this function.
pub fn to_index_ts(local_iso: &str) -> Result<String, TimeParseError> {
    let naive = parse_flexible(local_iso)?;
    let jst = jst_offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| TimeParseError::Ambiguous(local_iso.to_string()))?;
    let utc = jst.with_timezone(&Utc);
    Ok(utc.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Parse a UTC-naive ISO8601 timestamp as stored by the index and render
/// it as a JST-local ISO8601 string for presentation to operators.
pub fn from_index_ts(utc_iso: &str) -> Result<String, TimeParseError> {
    let naive = parse_flexible(utc_iso)?;
    let utc: DateTime<Utc> = DateTime::from_naive_utc_and_offset(naive, Utc);
    let jst = utc.with_timezone(&jst_offset());
    Ok(jst.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Parse either a strict `%Y-%m-%dT%H:%M:%S` or a `Z`/offset-suffixed
/// RFC3339 timestamp, discarding any offset (callers are responsible for
/// knowing which timezone the naive result is in).
///
/// Exposed publicly so the query layer can parse a `Z`-suffixed (already
/// UTC) operator timestamp directly, without routing it through the JST
/// conversion in [`to_index_ts`].
pub fn parse_flexible(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }
    // `Z`-suffixed but not strictly RFC3339 (e.g. fractional seconds dropped).
    let without_z = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(without_z, fmt) {
            return Ok(naive);
        }
    }
    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimeParseError {
    #[error("invalid timestamp format: {0}")]
    InvalidFormat(String),
    #[error("ambiguous local timestamp: {0}")]
    Ambiguous(String),
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
