use chrono::NaiveDateTime;

use crate::{
    data::Cell,
    roles::{Role, RoleBindings},
    timeparse::{ParsedTime, parse_cell},
};

pub const DEPARTURE_DELAY_COLUMN: &str = "departure_delay_mins";
pub const ARRIVAL_DELAY_COLUMN: &str = "arrival_delay_mins";

/// Minutes from `scheduled` to `actual`, negative when early. NaN unless
/// both sides parsed.
pub fn delay_minutes(scheduled: ParsedTime, actual: ParsedTime) -> f64 {
    match (scheduled.value(), actual.value()) {
        (Some(scheduled), Some(actual)) => minutes_between(scheduled, actual),
        _ => f64::NAN,
    }
}

fn minutes_between(scheduled: NaiveDateTime, actual: NaiveDateTime) -> f64 {
    let delta = actual - scheduled;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 60_000_000.0,
        None => delta.num_milliseconds() as f64 / 60_000.0,
    }
}

/// One derived delay column and the pair of columns it is computed from.
#[derive(Debug, Clone)]
pub struct DelayColumn {
    pub name: &'static str,
    pub scheduled_role: Role,
    pub actual_role: Role,
    pub scheduled: Option<usize>,
    pub actual: Option<usize>,
}

impl DelayColumn {
    pub fn departure(bindings: &RoleBindings) -> Self {
        Self::bound(
            DEPARTURE_DELAY_COLUMN,
            Role::ScheduledDeparture,
            Role::ActualDeparture,
            bindings,
        )
    }

    pub fn arrival(bindings: &RoleBindings) -> Self {
        Self::bound(
            ARRIVAL_DELAY_COLUMN,
            Role::ScheduledArrival,
            Role::ActualArrival,
            bindings,
        )
    }

    fn bound(name: &'static str, scheduled_role: Role, actual_role: Role, bindings: &RoleBindings) -> Self {
        DelayColumn {
            name,
            scheduled_role,
            actual_role,
            scheduled: bindings.get(scheduled_role),
            actual: bindings.get(actual_role),
        }
    }

    /// Both source roles are bound, so rows are worth parsing.
    pub fn is_computable(&self) -> bool {
        self.scheduled.is_some() && self.actual.is_some()
    }

    /// Parses the two source cells of `row`. Returns `None` when the column is
    /// not computable for this table.
    pub fn parse_row(&self, row: &[Cell]) -> Option<(ParsedTime, ParsedTime)> {
        let (scheduled, actual) = (self.scheduled?, self.actual?);
        let parse = |idx: usize| row.get(idx).map_or(ParsedTime::Unparseable, parse_cell);
        Some((parse(scheduled), parse(actual)))
    }

    pub fn evaluate(&self, row: &[Cell]) -> f64 {
        match self.parse_row(row) {
            Some((scheduled, actual)) => delay_minutes(scheduled, actual),
            None => f64::NAN,
        }
    }
}
