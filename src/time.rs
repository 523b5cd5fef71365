// src/time.rs

//! Timestamp and duration formatting helpers.
//!
//! Timestamps are ISO-8601 with millisecond precision and a trailing `Z`
//! (`YYYY-MM-DDTHH:MM:SS.mmmZ`); durations are rendered as `HH:MM:SS`.

use chrono::{DateTime, Utc};
use serde::Serializer;
use std::time::Duration;

/// Current wall-clock time, truncated to millisecond precision.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// `serde(serialize_with = ...)` for a required `DateTime<Utc>` field:
/// renders via [`format_timestamp`] rather than chrono's default RFC3339
/// (which varies fractional-second precision and spells the offset
/// `+00:00` instead of the spec-mandated trailing `Z`).
pub fn serialize_timestamp<S: Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(*ts))
}

/// `serde(serialize_with = ...)` for an `Option<DateTime<Utc>>` field, for
/// the same reason as [`serialize_timestamp`].
pub fn serialize_timestamp_opt<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_str(&format_timestamp(*ts)),
        None => serializer.serialize_none(),
    }
}

/// Render an elapsed duration as `HH:MM:SS`, saturating at large values
/// rather than overflowing.
pub fn format_duration_hms(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
