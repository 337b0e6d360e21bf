//! Tolerant parsing of time-like cells.
//!
//! Flight sheets mix bare clock times (`08:15:00`), full timestamps, textual
//! dates and native spreadsheet datetimes in the same column. [`parse_cell`]
//! accepts all of them and reports anything else as [`ParsedTime::Unparseable`];
//! it never fails.
//!
//! Slash dates are read month-first (`05/06/2024` is May 6) and fall back to
//! day-first when the month-first reading is impossible (`25/06/2024`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::data::Cell;

/// Date used for cells that only carry a time of day.
pub const BARE_TIME_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(date) => date,
    None => panic!("invalid reference date"),
};

/// Day zero of spreadsheet serial dates.
const SERIAL_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1899, 12, 30) {
    Some(date) => date,
    None => panic!("invalid serial epoch"),
};

/// Serial of 9999-12-31, the last date spreadsheets represent.
const MAX_SERIAL: f64 = 2_958_466.0;

/// Serial of the fictitious 1900-02-29.
const LEAP_BUG_SERIAL: i64 = 60;

const MILLIS_PER_DAY: i64 = 86_400_000;

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%b %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y%m%d",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M:%S",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
];

/// Outcome of parsing one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTime {
    Parsed(NaiveDateTime),
    Unparseable,
}

impl ParsedTime {
    pub fn value(self) -> Option<NaiveDateTime> {
        match self {
            ParsedTime::Parsed(dt) => Some(dt),
            ParsedTime::Unparseable => None,
        }
    }

    pub fn is_parsed(self) -> bool {
        matches!(self, ParsedTime::Parsed(_))
    }
}

impl From<Option<NaiveDateTime>> for ParsedTime {
    fn from(value: Option<NaiveDateTime>) -> Self {
        value.map_or(ParsedTime::Unparseable, ParsedTime::Parsed)
    }
}

pub fn parse_cell(cell: &Cell) -> ParsedTime {
    match cell {
        Cell::Empty => ParsedTime::Unparseable,
        Cell::Temporal(dt) => ParsedTime::Parsed(*dt),
        Cell::Number(n) => from_serial(*n).into(),
        Cell::Text(s) => parse_text(s).into(),
    }
}

/// Converts a spreadsheet serial date to a timestamp, rounded to the
/// millisecond. Serials below 1 carry only a time of day and land on
/// [`BARE_TIME_DATE`], the same date bare text times use. Serials below 60
/// follow the spreadsheet convention of counting a fictitious 1900-02-29.
pub fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..MAX_SERIAL).contains(&serial) {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY as f64).round() as i64;
    if millis < MILLIS_PER_DAY {
        return BARE_TIME_DATE
            .and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::try_milliseconds(millis)?);
    }
    let millis = if millis < LEAP_BUG_SERIAL * MILLIS_PER_DAY {
        millis + MILLIS_PER_DAY
    } else {
        millis
    };
    SERIAL_EPOCH
        .and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// Inverse of [`from_serial`], used when writing workbooks. Timestamps on
/// [`BARE_TIME_DATE`] become a plain day fraction.
pub fn to_serial(value: NaiveDateTime) -> f64 {
    if is_time_only(value) {
        return days(value - BARE_TIME_DATE.and_time(NaiveTime::MIN));
    }
    let serial = days(value - SERIAL_EPOCH.and_time(NaiveTime::MIN));
    if serial < (LEAP_BUG_SERIAL + 1) as f64 {
        serial - 1.0
    } else {
        serial
    }
}

/// True for timestamps that stand for a bare time of day.
pub fn is_time_only(value: NaiveDateTime) -> bool {
    value.date() == BARE_TIME_DATE
}

fn days(delta: TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 86_400_000_000.0,
        None => delta.num_milliseconds() as f64 / MILLIS_PER_DAY as f64,
    }
}

pub fn parse_text(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    for fmt in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(value, fmt) {
            return Some(BARE_TIME_DATE.and_time(time));
        }
    }
    None
}
