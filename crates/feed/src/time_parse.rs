// ABOUTME: Timestamp parsing for Atom date constructs in OPDS feeds.
// ABOUTME: Accepts RFC3339 first, then the looser ISO forms catalog servers emit in practice.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parses an Atom `updated`/`published` value into UTC.
/// Returns None if the text matches none of the accepted forms.
///
/// Accepted forms, in order:
/// - RFC3339 with offset or `Z` (what Atom requires)
/// - ISO datetime with a compact offset: `2006-01-02T15:04:05-0700`
/// - ISO datetime without offset, `T` or space separated (assumed UTC)
/// - Date only: `2006-01-02` (midnight UTC)
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // %.f also accepts a missing fraction
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}
