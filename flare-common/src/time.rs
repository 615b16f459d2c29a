//! Timestamp utilities
//!
//! Upstream feeds disagree on timestamp shape: DONKI reports minute precision
//! (`2023-01-01T12:34Z`) while Helioviewer reports naive UTC with a space
//! separator (`2023-01-01 12:34:56`). Everything is normalized to UTC here.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Naive layouts accepted after RFC 3339 parsing fails. All are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse an upstream timestamp into UTC
///
/// Accepts RFC 3339 (any offset, optional fraction) and the naive layouts in
/// [`NAIVE_FORMATS`]. Returns `None` for anything else.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Format as `YYYY-MM-DDTHH:MM:SSZ` (second precision, no fraction)
pub fn to_iso_seconds(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format as an RFC 1123 date in GMT, e.g. `Sun, 01 Jan 2023 12:34:00 GMT`
pub fn to_utc_string(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Display form of an optional upstream timestamp
///
/// Absent values render as `N/A`; values that do not parse are shown verbatim.
pub fn display_timestamp(raw: Option<&str>) -> String {
    match raw {
        None => "N/A".to_string(),
        Some(s) if s.trim().is_empty() => "N/A".to_string(),
        Some(s) => parse_timestamp(s)
            .map(|dt| to_utc_string(&dt))
            .unwrap_or_else(|| s.to_string()),
    }
}
