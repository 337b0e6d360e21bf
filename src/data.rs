use std::fmt;

use chrono::NaiveDateTime;

use crate::timeparse;

/// A single spreadsheet value, normalized right after loading.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Temporal(NaiveDateTime),
}

impl Cell {
    /// Builds a text cell, mapping the empty string to [`Cell::Empty`].
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Renders the cell the way delimited output and console tables show it.
    /// Missing numbers (NaN) render as an empty string and time-only values
    /// render without a date.
    pub fn as_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Temporal(dt) if timeparse::is_time_only(*dt) => {
                dt.format("%H:%M:%S%.f").to_string()
            }
            Cell::Temporal(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// An in-memory table: ordered headers and rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates a table, padding short rows with [`Cell::Empty`]. Rows wider
    /// than the header are truncated, so loaders reject them beforehand.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Table { headers, rows }
    }

    /// Exact, case-sensitive header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Rows rendered as display strings, suitable for [`crate::table::render_grid`].
    pub fn display_rows(&self, limit: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| row.iter().map(Cell::as_display).collect())
            .collect()
    }
}
