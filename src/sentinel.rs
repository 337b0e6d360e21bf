use crate::data::{Cell, Table};

/// Header of the column that marks placeholder rows. Matched exactly.
pub const SENTINEL_COLUMN: &str = "data";
/// Text value that marks a placeholder row.
pub const SENTINEL_VALUE: &str = "00:00:00";

pub fn is_sentinel(cell: &Cell) -> bool {
    cell.as_text() == Some(SENTINEL_VALUE)
}

/// Returns the rows of `table` that are not sentinel rows, in their original
/// order. Tables without a `data` column pass through untouched.
pub fn retain_rows(table: &Table) -> Vec<&[Cell]> {
    match table.column_index(SENTINEL_COLUMN) {
        Some(idx) => table
            .rows
            .iter()
            .filter(|row| !row.get(idx).is_some_and(is_sentinel))
            .map(Vec::as_slice)
            .collect(),
        None => table.rows.iter().map(Vec::as_slice).collect(),
    }
}
