//! The delay preprocessor.
//!
//! [`preprocess`] takes a loaded [`Table`] and returns a new one in which
//! sentinel rows are gone and two delay columns are appended. Original
//! columns keep their order and values. The steps run in a fixed order:
//!
//! 1. drop rows whose `data` column is the literal `00:00:00`;
//! 2. resolve the four time roles against the headers, once;
//! 3. for each remaining row parse the bound cells and compute both delays.
//!
//! Cells that fail to parse and roles with no matching column never abort the
//! transform. They produce NaN delays and are tallied in [`PreprocessReport`].

use log::{debug, warn};

use crate::{
    data::{Cell, Table},
    delay::{DelayColumn, delay_minutes},
    roles::{Role, RoleBindings, RoleCandidates},
    sentinel,
    timeparse::ParsedTime,
};

/// Per-role outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleReport {
    pub role: Role,
    pub column: Option<String>,
    /// Rows whose bound cell could not be read as a time. Only counted for
    /// roles that take part in a computable delay.
    pub unparseable: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessReport {
    pub input_rows: usize,
    pub sentinel_rows_removed: usize,
    pub bindings: RoleBindings,
    pub roles: Vec<RoleReport>,
}

impl PreprocessReport {
    pub fn output_rows(&self) -> usize {
        self.input_rows - self.sentinel_rows_removed
    }

    pub fn role(&self, role: Role) -> Option<&RoleReport> {
        self.roles.iter().find(|r| r.role == role)
    }
}

#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub table: Table,
    pub report: PreprocessReport,
}

/// Runs the full transform with the given role fragments.
pub fn preprocess(input: &Table, candidates: &RoleCandidates) -> Preprocessed {
    let kept = sentinel::retain_rows(input);
    let removed = input.row_count() - kept.len();
    if removed > 0 {
        debug!("Removed {removed} sentinel row(s)");
    }

    let bindings = RoleBindings::resolve(&input.headers, candidates);
    for role in Role::ALL {
        match bindings.column_name(role, &input.headers) {
            Some(name) => debug!("Role {role} bound to column '{name}'"),
            None => warn!("No column matches role {role}; dependent delays will be empty"),
        }
    }

    let delays = [DelayColumn::departure(&bindings), DelayColumn::arrival(&bindings)];
    let mut headers = input.headers.clone();
    let targets = delays
        .iter()
        .map(|delay| match input.column_index(delay.name) {
            Some(existing) => {
                debug!("Overwriting existing column '{}'", delay.name);
                existing
            }
            None => {
                headers.push(delay.name.to_string());
                headers.len() - 1
            }
        })
        .collect::<Vec<_>>();

    let mut failures = [0usize; 4];
    let mut rows = Vec::with_capacity(kept.len());
    for source in kept {
        let mut row = source.to_vec();
        row.resize(headers.len(), Cell::Empty);
        for (delay, &target) in delays.iter().zip(&targets) {
            let minutes = match delay.parse_row(source) {
                Some((scheduled, actual)) => {
                    tally(&mut failures, delay.scheduled_role, scheduled);
                    tally(&mut failures, delay.actual_role, actual);
                    delay_minutes(scheduled, actual)
                }
                None => f64::NAN,
            };
            row[target] = Cell::Number(minutes);
        }
        rows.push(row);
    }

    let roles = Role::ALL
        .iter()
        .zip(failures)
        .map(|(&role, unparseable)| {
            let column = bindings.column_name(role, &input.headers).map(str::to_string);
            if unparseable > 0 && unparseable == rows.len() {
                warn!(
                    "None of the {unparseable} value(s) bound to role {role} could be parsed as a time"
                );
            } else if unparseable > 0 {
                debug!("{unparseable} value(s) bound to role {role} could not be parsed");
            }
            RoleReport {
                role,
                column,
                unparseable,
            }
        })
        .collect();

    Preprocessed {
        table: Table { headers, rows },
        report: PreprocessReport {
            input_rows: input.row_count(),
            sentinel_rows_removed: removed,
            bindings,
            roles,
        },
    }
}

fn tally(failures: &mut [usize; 4], role: Role, parsed: ParsedTime) {
    if !parsed.is_parsed() {
        if let Some(slot) = Role::ALL.iter().position(|r| *r == role) {
            failures[slot] += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::{ARRIVAL_DELAY_COLUMN, DEPARTURE_DELAY_COLUMN};

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    fn flight_table() -> Table {
        let headers = ["Flight", "STD", "ATD", "STA", "ATA", "data"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = vec![
            ["AI101", "08:00:00", "08:15:00", "10:00:00", "09:55:00", "12:30:00"],
            ["AI102", "07:00:00", "07:05:00", "09:00:00", "09:00:00", "00:00:00"],
            ["AI103", "09:00:00", "N/A", "11:00:00", "10:50:00", "13:00:00"],
        ]
        .iter()
        .map(|row| row.iter().map(|v| text(v)).collect())
        .collect();
        Table::new(headers, rows)
    }

    #[test]
    fn computes_delays_and_drops_sentinel_rows() {
        let out = preprocess(&flight_table(), &RoleCandidates::default());
        let table = &out.table;
        assert_eq!(
            table.headers,
            vec![
                "Flight",
                "STD",
                "ATD",
                "STA",
                "ATA",
                "data",
                DEPARTURE_DELAY_COLUMN,
                ARRIVAL_DELAY_COLUMN
            ]
        );
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0][0], text("AI101"));
        assert_eq!(table.rows[0][6], Cell::Number(15.0));
        assert_eq!(table.rows[0][7], Cell::Number(-5.0));
        assert_eq!(table.rows[1][0], text("AI103"));
        assert!(table.rows[1][6].as_number().unwrap().is_nan());
        assert_eq!(table.rows[1][7], Cell::Number(-10.0));
    }

    #[test]
    fn report_counts_removed_rows_and_parse_failures() {
        let out = preprocess(&flight_table(), &RoleCandidates::default());
        let report = &out.report;
        assert_eq!(report.input_rows, 3);
        assert_eq!(report.sentinel_rows_removed, 1);
        assert_eq!(report.output_rows(), 2);
        let atd = report.role(Role::ActualDeparture).unwrap();
        assert_eq!(atd.column.as_deref(), Some("ATD"));
        assert_eq!(atd.unparseable, 1);
        assert_eq!(report.role(Role::ScheduledDeparture).unwrap().unparseable, 0);
    }

    #[test]
    fn input_table_is_left_untouched() {
        let input = flight_table();
        let before = input.clone();
        let _ = preprocess(&input, &RoleCandidates::default());
        assert_eq!(input, before);
    }

    #[test]
    fn unbound_roles_fill_delays_with_nan() {
        let table = Table::new(
            vec!["Flight".into(), "STD".into()],
            vec![vec![text("AI1"), text("08:00")]],
        );
        let out = preprocess(&table, &RoleCandidates::default());
        assert_eq!(out.table.headers.len(), 4);
        assert!(out.table.rows[0][2].as_number().unwrap().is_nan());
        assert!(out.table.rows[0][3].as_number().unwrap().is_nan());
        assert_eq!(out.report.role(Role::ScheduledDeparture).unwrap().unparseable, 0);
    }

    #[test]
    fn existing_delay_columns_are_overwritten_in_place() {
        let table = Table::new(
            vec![
                "departure_delay_mins".into(),
                "STD".into(),
                "ATD".into(),
            ],
            vec![vec![text("stale"), text("08:00"), text("08:30")]],
        );
        let out = preprocess(&table, &RoleCandidates::default());
        assert_eq!(
            out.table.headers,
            vec!["departure_delay_mins", "STD", "ATD", "arrival_delay_mins"]
        );
        assert_eq!(out.table.rows[0][0], Cell::Number(30.0));
    }

    #[test]
    fn empty_table_still_gets_derived_headers() {
        let table = Table::new(vec!["Flight".into()], Vec::new());
        let out = preprocess(&table, &RoleCandidates::default());
        assert_eq!(
            out.table.headers,
            vec!["Flight", DEPARTURE_DELAY_COLUMN, ARRIVAL_DELAY_COLUMN]
        );
        assert_eq!(out.table.row_count(), 0);
    }
}
