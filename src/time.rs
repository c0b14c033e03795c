/// Timestamp construction and parsing for track records.
///
/// Track files carry time either as a single column (ISO 8601, RFC 3339 or
/// a plain `YYYY-MM-DD HH:MM[:SS]` string) or split across year, month,
/// day and hour columns. Times are naive and taken to be UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Builds a timestamp from split calendar fields.
pub fn compose_time(year: i32, month: u32, day: u32, hour: u32) -> Result<NaiveDateTime, String> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .ok_or_else(|| format!("invalid date {:04}-{:02}-{:02} {:02}:00", year, month, day, hour))
}

/// Parses a single time cell.
///
/// RFC 3339 strings with an offset are converted to UTC; naive strings are
/// taken as-is; a bare date means midnight.
pub fn parse_time(raw: &str) -> Result<NaiveDateTime, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("empty time value".to_string());
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.naive_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| format!("invalid time '{}'", s));
    }

    Err(format!("unrecognized time format '{}'", s))
}
