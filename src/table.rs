//! Plain-text rendering for console output.

use std::fmt::Write as _;

use itertools::Itertools;

use crate::{
    data::Table,
    preprocess::PreprocessReport,
    roles::RoleCandidates,
};

/// Renders a header line, a dashed rule, and one line per row, with columns
/// padded to their widest cell and separated by two spaces.
pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| cell_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell_width(cell));
        }
    }

    let rule = widths
        .iter()
        .map(|w| "-".repeat((*w).max(3)))
        .collect::<Vec<_>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();

    let mut out = String::new();
    let _ = writeln!(out, "{}", format_line(headers, &widths));
    let _ = writeln!(out, "{}", format_line(&rule, &rule_widths));
    for row in rows {
        let _ = writeln!(out, "{}", format_line(row, &widths));
    }
    out
}

/// Renders the first `limit` rows of a table.
pub fn render_preview(table: &Table, limit: usize) -> String {
    render_grid(&table.headers, &table.display_rows(limit))
}

/// One line per role: the bound column (or `-`), the unparseable count, and
/// the fragments that were tried.
pub fn render_role_report(report: &PreprocessReport, candidates: &RoleCandidates) -> String {
    let headers = ["role", "column", "unparseable", "fragments"]
        .map(String::from)
        .to_vec();
    let rows = report
        .roles
        .iter()
        .map(|entry| {
            vec![
                entry.role.to_string(),
                entry.column.clone().unwrap_or_else(|| "-".to_string()),
                entry.unparseable.to_string(),
                candidates.fragments(entry.role).iter().join(", "),
            ]
        })
        .collect::<Vec<_>>();
    render_grid(&headers, &rows)
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let flat = cell.replace(['\n', '\r', '\t'], " ");
            let pad = width.saturating_sub(cell_width(&flat));
            format!("{flat}{}", " ".repeat(pad))
        })
        .join("  ");
    line.trim_end().to_string()
}

fn cell_width(value: &str) -> usize {
    value.chars().count()
}
