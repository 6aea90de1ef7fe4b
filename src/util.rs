// Cell value normalization and display helpers.
//
// Every place that reads a cell goes through here, so the rest of the code
// only ever sees trimmed strings and `NaiveDate`s.
use crate::types::{CellValue, Record};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use num_format::{Locale, ToFormattedString};

pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

/// Spreadsheet date serials count days from this day.
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Case-folded, trimmed comparison key.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Canonical string form of a cell.
///
/// - empty cells become `""`
/// - text is trimmed
/// - dates and date-times are rendered as `DD.MM.YYYY`
/// - numbers use their natural form
pub fn value_to_string(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Date(d) => d.format(DISPLAY_DATE_FORMAT).to_string(),
        CellValue::DateTime(dt) => dt.format(DISPLAY_DATE_FORMAT).to_string(),
        CellValue::Int(n) => n.to_string(),
        CellValue::Float(f) => f.to_string(),
    }
}

/// Trimmed text of `record[column]`; unmapped columns and missing cells read as `""`.
pub fn field_text(record: &Record, column: Option<&str>) -> String {
    column
        .and_then(|c| record.get(c))
        .map(value_to_string)
        .unwrap_or_default()
}

/// Date of `record[column]`, if the cell holds anything date-like.
pub fn field_date(record: &Record, column: Option<&str>) -> Option<NaiveDate> {
    column.and_then(|c| record.get(c)).and_then(parse_date)
}

/// Interpret a cell as a calendar date.
///
/// Failures are `None`, never errors: a record without a usable date is
/// simply left out of date-bound counters.
pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Empty => None,
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Int(n) => serial_to_date(*n as f64),
        CellValue::Float(f) => serial_to_date(*f),
        CellValue::Text(s) => parse_date_text(s),
    }
}

fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > 3_000_000.0 {
        return None;
    }
    let days = serial.floor() as i64;
    serial_epoch()?.checked_add_signed(Duration::days(days))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, DISPLAY_DATE_FORMAT) {
        return Some(d);
    }
    parse_iso8601(s)
}

/// ISO dates, optionally followed by a `T` or space and a time of day
/// (`HH`, `HH:MM` or `HH:MM:SS[.fff]`).
fn parse_iso8601(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some((date, time)) = s.split_once(['T', ' ']) {
        if is_iso_time(time) {
            if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                return Some(d);
            }
        }
    }
    // Offsets keep the local calendar date as written.
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

fn is_iso_time(time: &str) -> bool {
    if time.len() == 2 && time.bytes().all(|b| b.is_ascii_digit()) {
        return time < "24";
    }
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .any(|fmt| NaiveTime::parse_from_str(time, fmt).is_ok())
}

/// Parse an operator-entered `DD.MM.YYYY` date.
pub fn parse_display_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DISPLAY_DATE_FORMAT).ok()
}

pub fn format_display_date(value: NaiveDate) -> String {
    value.format(DISPLAY_DATE_FORMAT).to_string()
}

pub fn compute_percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64) * 100.0
}

/// Thousands grouped with a plain space, e.g. `12 345`.
pub fn format_integer(n: usize) -> String {
    n.to_formatted_string(&Locale::en).replace(',', " ")
}

pub fn format_percent(value: f64) -> String {
    if value == 0.0 {
        return "0%".to_string();
    }
    format!("{:.1}%", value)
}
