//! Capture timestamp handling
//!
//! EXIF stores timestamps as `YYYY:MM:DD HH:MM:SS` text. Sorted files are
//! named after the capture time rendered with a strftime-style format; the
//! same format is used to parse the name back when choosing a bucket.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use chrono::format::{self, Item, ParseErrorKind, Parsed, StrftimeItems};
use std::fmt::Write;

/// Default name format for sorted files, e.g. `20240115_143000`
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Parse EXIF datetime string format: "YYYY:MM:DD HH:MM:SS"
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    // EXIF format: "2024:01:15 14:30:00" or with quotes
    let s = s.trim().trim_matches('"').trim_end_matches('\0');

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    // Try with subseconds
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S%.f") {
        return Some(dt);
    }

    let formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
}

/// Check that `format` only contains valid strftime specifiers
pub fn validate_format(format: &str) -> Result<Vec<Item<'_>>> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidDateTimeFormat {
            format: format.to_string(),
        });
    }
    Ok(items)
}

/// Render `datetime` with `format`.
///
/// A malformed format is a configuration bug and is returned as
/// [`Error::InvalidDateTimeFormat`] for the caller to propagate.
pub fn format_datetime(datetime: &NaiveDateTime, format: &str) -> Result<String> {
    let items = validate_format(format)?;
    let mut rendered = String::new();
    write!(rendered, "{}", datetime.format_with_items(items.iter())).map_err(|_| {
        Error::InvalidDateTimeFormat {
            format: format.to_string(),
        }
    })?;
    Ok(rendered)
}

/// Parse `s` against `format`, requiring the whole string to match.
///
/// Returns `Ok(None)` when the string does not match. A format without a day
/// parses to the 1st of the month, one without a time of day to midnight.
pub fn parse_exact(s: &str, format: &str) -> Result<Option<NaiveDateTime>> {
    let items = validate_format(format)?;

    let mut parsed = Parsed::new();
    if format::parse(&mut parsed, s, items.iter()).is_err() {
        return Ok(None);
    }
    Ok(resolve(parsed))
}

/// Build a timestamp from parsed fields, filling in a missing day and time
fn resolve(mut parsed: Parsed) -> Option<NaiveDateTime> {
    let date = match parsed.to_naive_date() {
        Ok(date) => date,
        Err(e) if e.kind() == ParseErrorKind::NotEnough => {
            // Only fills fields that are still unset
            let _ = parsed.set_day(1);
            parsed.to_naive_date().ok()?
        }
        Err(_) => return None,
    };

    let time = match parsed.to_naive_time() {
        Ok(time) => time,
        Err(e) if e.kind() == ParseErrorKind::NotEnough => {
            let _ = parsed.set_hour(0);
            let _ = parsed.set_minute(0);
            let _ = parsed.set_second(0);
            parsed.to_naive_time().ok()?
        }
        Err(_) => return None,
    };

    Some(date.and_time(time))
}
