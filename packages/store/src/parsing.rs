//! Field-level parsing shared by the loaders.
//!
//! Every parser returns `None` for values it cannot interpret; the
//! loaders decide whether that drops the row or just nulls the field.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Date/time layouts seen in LA open data exports, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, tried after [`DATETIME_FORMATS`].
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Parses a finite floating-point coordinate.
#[must_use]
pub fn parse_coordinate(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a combined location field such as `"(34.05, -118.25)"` into
/// `(latitude, longitude)`.
///
/// Surrounding parentheses are optional. Returns `None` unless both
/// halves are finite numbers.
#[must_use]
pub fn parse_location(s: &str) -> Option<(f64, f64)> {
    let inner = s
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    let (lat, lon) = inner.split_once(',')?;
    Some((parse_coordinate(lat)?, parse_coordinate(lon)?))
}

/// Parses a date or date-time string. Date-only values map to midnight.
#[must_use]
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parses a military time value (`"1530"`, `"45"`, `"0005"`) into a
/// time of day.
#[must_use]
pub fn parse_military_time(s: &str) -> Option<NaiveTime> {
    let value = s.trim().parse::<u32>().ok()?;
    NaiveTime::from_hms_opt(value / 100, value % 100, 0)
}

/// Trims a text field, mapping blank values to `None`.
#[must_use]
pub fn parse_text(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a non-negative whole number that fits in `T`, accepting a
/// trailing `.0` as written by spreadsheet exports.
#[must_use]
pub fn parse_count<T: TryFrom<u64>>(s: &str) -> Option<T> {
    let s = s.trim();
    let s = s.strip_suffix(".0").unwrap_or(s);
    let value = s.parse::<u64>().ok()?;
    T::try_from(value).ok()
}
