use chrono::{DateTime, Local, TimeZone, Utc};

use crate::types::Timestamp;

/// Render a Unix timestamp as an ISO-8601 UTC string, e.g. `2026-02-14T03:00:00Z`.
pub fn to_iso(ts: Timestamp) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| Utc::now().to_rfc3339())
}

/// Current Unix timestamp.
pub fn now() -> Timestamp {
    Utc::now().timestamp()
}

/// Decompose a Unix timestamp into the local calendar (year, month, day, hour)
/// used for date-slot derivation. The upstream platform's calendar fields are
/// expressed in local time, not UTC.
pub fn local_ymd_hour(ts: Timestamp) -> (i32, u32, u32, u32) {
    let dt: DateTime<Local> = Local
        .timestamp_opt(ts, 0)
        .single()
        .unwrap_or_else(|| Local.timestamp_opt(0, 0).single().unwrap());
    (
        chrono::Datelike::year(&dt),
        chrono::Datelike::month(&dt),
        chrono::Datelike::day(&dt),
        chrono::Timelike::hour(&dt),
    )
}
