//! Calendar date parsing and `MMDDYYYY` formatting

use crate::value::is_missing;
use crate::{FieldTextError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Month-first date layouts, tried in order
const DATE_FORMATS: [&str; 13] = [
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%m.%d.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y%m%d",
];

/// Date-time layouts, the time part is discarded
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a calendar date from common spreadsheet layouts
///
/// Ambiguous numeric dates are read month-first (`8/1/2025` is August 1st).
/// Two-digit years (`8/1/25`, `12-31-24`, `1-Aug-25`) land in 1970-2069.
/// Date-times with an offset keep the calendar date they were written in.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let value = raw.trim();

    // A two-digit year would otherwise be accepted by %Y as year 25 AD
    if let Some(formats) = two_digit_year_formats(value) {
        return formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
            .ok_or_else(|| FieldTextError::InvalidDate(raw.to_string()));
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if date.year() >= 1000 {
                return Ok(date);
            }
        }
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime.date());
        }
    }

    Err(FieldTextError::InvalidDate(raw.to_string()))
}

const SLASHED_SHORT_YEAR: &[&str] = &["%m/%d/%y"];
const DASHED_SHORT_YEAR: &[&str] = &["%m-%d-%y", "%d-%b-%y"];

/// Layouts for `a/b/yy` and `a-b-yy`, `None` when the year has four digits
fn two_digit_year_formats(value: &str) -> Option<&'static [&'static str]> {
    for (separator, formats) in [('/', SLASHED_SHORT_YEAR), ('-', DASHED_SHORT_YEAR)] {
        let parts: Vec<&str> = value.split(separator).collect();
        if parts.len() == 3
            && parts[0].len() <= 2
            && parts[2].len() == 2
            && parts[2].bytes().all(|b| b.is_ascii_digit())
        {
            return Some(formats);
        }
    }
    None
}

/// Reformat a date cell as `MMDDYYYY`
///
/// Missing or blank cells become `""`. A value that cannot be parsed as a
/// date is returned unchanged.
///
/// # Examples
/// ```
/// use field_text::format_date_mmddyyyy;
/// assert_eq!(format_date_mmddyyyy(Some("8/1/2025")), "08012025");
/// assert_eq!(format_date_mmddyyyy(Some("Q3 2025")), "Q3 2025");
/// assert_eq!(format_date_mmddyyyy(None), "");
/// ```
pub fn format_date_mmddyyyy(raw: Option<&str>) -> String {
    let value = match raw {
        Some(value) if !is_missing(raw) && !value.trim().is_empty() => value,
        _ => return String::new(),
    };

    match parse_date(value) {
        Ok(date) => date.format("%m%d%Y").to_string(),
        Err(e) => {
            log::warn!("{e}; keeping the raw value");
            value.to_string()
        }
    }
}
