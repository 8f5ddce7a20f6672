//! Date cell normalization
//!
//! Accepted encodings:
//! - native date cells
//! - numeric day serials counted from 1899-12-30 (fractional part dropped)
//! - text `D-M-YYYY` (one or two digit day and month)
//!
//! Anything else is a [`DateError`]. Callers drop the row and count it.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::spreadsheet::CellValue;

static DAY_MONTH_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})$").expect("static regex"));

/// Reasons a cell is not a usable date
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DateError {
    #[error("empty cell")]
    Empty,
    #[error("day serial {0} does not decode to a calendar date")]
    InvalidSerial(f64),
    #[error("text {0:?} is not D-M-YYYY")]
    UnrecognizedText(String),
    #[error("text {0:?} names a day that does not exist")]
    InvalidCalendarDate(String),
}

/// Spreadsheet serial day zero
pub fn spreadsheet_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

/// Decode a cell into a calendar date
pub fn normalize_date(cell: &CellValue) -> Result<NaiveDate, DateError> {
    match cell {
        CellValue::Date(date) => Ok(*date),
        CellValue::Number(serial) => from_serial(*serial),
        CellValue::Text(text) => from_day_month_year(text),
        CellValue::Empty => Err(DateError::Empty),
    }
}

/// Canonical `YYYY-MM-DD` string for a cell
pub fn canonical_date(cell: &CellValue) -> Result<String, DateError> {
    normalize_date(cell).map(format_canonical)
}

pub fn format_canonical(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Re-encode a date as a spreadsheet day serial
pub fn to_serial(date: NaiveDate) -> i64 {
    (date - spreadsheet_epoch()).num_days()
}

fn from_serial(serial: f64) -> Result<NaiveDate, DateError> {
    if !serial.is_finite() || serial < 0.0 || serial > u32::MAX as f64 {
        return Err(DateError::InvalidSerial(serial));
    }

    spreadsheet_epoch()
        .checked_add_days(Days::new(serial.trunc() as u64))
        .ok_or(DateError::InvalidSerial(serial))
}

fn from_day_month_year(text: &str) -> Result<NaiveDate, DateError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DateError::Empty);
    }

    let caps = DAY_MONTH_YEAR
        .captures(trimmed)
        .ok_or_else(|| DateError::UnrecognizedText(trimmed.to_string()))?;

    let invalid = || DateError::InvalidCalendarDate(trimmed.to_string());
    let day: u32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let year: i32 = caps[3].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}
