//! Column role resolution.
//!
//! Flight sheets name their time columns inconsistently ("STD", "Sched
//! Departure", "Flight STD Time", ...). Each [`Role`] carries a list of name
//! fragments; a role binds to the first column, in declared order, whose name
//! contains one of them ignoring case. Bindings are resolved once per table.

use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{FlightDelayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    ScheduledDeparture,
    ActualDeparture,
    ScheduledArrival,
    ActualArrival,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::ScheduledDeparture,
        Role::ActualDeparture,
        Role::ScheduledArrival,
        Role::ActualArrival,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Role::ScheduledDeparture => "scheduled_departure",
            Role::ActualDeparture => "actual_departure",
            Role::ScheduledArrival => "scheduled_arrival",
            Role::ActualArrival => "actual_arrival",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Name fragments tried for each role. Deserializes from YAML; roles left out
/// of the document keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoleCandidates {
    pub scheduled_departure: Vec<String>,
    pub actual_departure: Vec<String>,
    pub scheduled_arrival: Vec<String>,
    pub actual_arrival: Vec<String>,
}

impl Default for RoleCandidates {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|v| v.to_string()).collect()
        }
        RoleCandidates {
            scheduled_departure: owned(&["STD", "Scheduled Departure", "Schedule Departure", "Dep Std"]),
            actual_departure: owned(&["ATD", "Actual Departure", "Actual Dep", "Departure Time"]),
            scheduled_arrival: owned(&["STA", "Scheduled Arrival", "Schedule Arrival", "Arr Sta"]),
            actual_arrival: owned(&["ATA", "Actual Arrival", "Arrival Time", "Actual Arr"]),
        }
    }
}

impl RoleCandidates {
    pub fn fragments(&self, role: Role) -> &[String] {
        match role {
            Role::ScheduledDeparture => &self.scheduled_departure,
            Role::ActualDeparture => &self.actual_departure,
            Role::ScheduledArrival => &self.scheduled_arrival,
            Role::ActualArrival => &self.actual_arrival,
        }
    }

    pub fn from_yaml_str(input: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if input.trim().is_empty() {
            return Ok(RoleCandidates::default());
        }
        serde_yaml::from_str(input)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|err| FlightDelayError::RolesConfig {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_yaml_str(&raw).map_err(|err| FlightDelayError::RolesConfig {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

/// Returns the index of the first header containing any fragment,
/// case-insensitively. Fragments are matched as written, surrounding
/// whitespace included. Empty fragments never match.
pub fn find_column<S: AsRef<str>>(headers: &[String], fragments: &[S]) -> Option<usize> {
    let needles = fragments
        .iter()
        .map(|f| f.as_ref().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>();
    if needles.is_empty() {
        return None;
    }
    headers.iter().position(|header| {
        let haystack = header.to_lowercase();
        needles.iter().any(|needle| haystack.contains(needle.as_str()))
    })
}

/// Column index bound to each role, or `None` when unbound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleBindings {
    pub scheduled_departure: Option<usize>,
    pub actual_departure: Option<usize>,
    pub scheduled_arrival: Option<usize>,
    pub actual_arrival: Option<usize>,
}

impl RoleBindings {
    pub fn resolve(headers: &[String], candidates: &RoleCandidates) -> Self {
        let bind = |role| find_column(headers, candidates.fragments(role));
        RoleBindings {
            scheduled_departure: bind(Role::ScheduledDeparture),
            actual_departure: bind(Role::ActualDeparture),
            scheduled_arrival: bind(Role::ScheduledArrival),
            actual_arrival: bind(Role::ActualArrival),
        }
    }

    pub fn get(&self, role: Role) -> Option<usize> {
        match role {
            Role::ScheduledDeparture => self.scheduled_departure,
            Role::ActualDeparture => self.actual_departure,
            Role::ScheduledArrival => self.scheduled_arrival,
            Role::ActualArrival => self.actual_arrival,
        }
    }

    pub fn column_name<'a>(&self, role: Role, headers: &'a [String]) -> Option<&'a str> {
        self.get(role)
            .and_then(|idx| headers.get(idx))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn find_column_matches_substrings_ignoring_case() {
        let cols = headers(&["Flight", "Flight std time", "ATD"]);
        assert_eq!(find_column(&cols, &["STD"]), Some(1));
        assert_eq!(find_column(&cols, &["atd"]), Some(2));
        assert_eq!(find_column(&cols, &["STA"]), None);
    }

    #[test]
    fn find_column_prefers_declared_column_order() {
        let cols = headers(&["Scheduled Departure", "STD"]);
        // The fragment order does not matter, the first matching column wins.
        assert_eq!(find_column(&cols, &["STD", "Scheduled Departure"]), Some(0));
    }

    #[test]
    fn blank_fragments_never_match() {
        let cols = headers(&["Flight", "STD"]);
        assert_eq!(find_column(&cols, &["", "  "]), None);
        assert_eq!(find_column::<&str>(&cols, &[]), None);
    }

    #[test]
    fn fragment_whitespace_is_significant() {
        let cols = headers(&["STD", "Flight STD"]);
        assert_eq!(find_column(&cols, &[" STD"]), Some(1));
        assert_eq!(find_column(&cols, &["STD"]), Some(0));
        assert_eq!(find_column(&headers(&["STD"]), &["STD "]), None);
    }

    #[test]
    fn resolve_binds_each_role_independently() {
        let cols = headers(&["Flight", "STD", "ATD", "STA", "ATA", "data"]);
        let bindings = RoleBindings::resolve(&cols, &RoleCandidates::default());
        assert_eq!(bindings.scheduled_departure, Some(1));
        assert_eq!(bindings.actual_departure, Some(2));
        assert_eq!(bindings.scheduled_arrival, Some(3));
        assert_eq!(bindings.actual_arrival, Some(4));
        assert_eq!(bindings.column_name(Role::ActualArrival, &cols), Some("ATA"));
    }

    #[test]
    fn descriptive_headers_resolve_through_longer_fragments() {
        let cols = headers(&["Actual Departure", "Schedule Arrival", "Arrival Time"]);
        let bindings = RoleBindings::resolve(&cols, &RoleCandidates::default());
        assert_eq!(bindings.scheduled_departure, None);
        assert_eq!(bindings.actual_departure, Some(0));
        assert_eq!(bindings.scheduled_arrival, Some(1));
        assert_eq!(bindings.actual_arrival, Some(2));
    }

    #[test]
    fn yaml_overrides_keep_defaults_for_missing_roles() {
        let candidates =
            RoleCandidates::from_yaml_str("scheduled_departure: [\"Sched Dep\"]\nactual_arrival: []\n")
                .unwrap();
        assert_eq!(candidates.scheduled_departure, vec!["Sched Dep".to_string()]);
        assert!(candidates.actual_arrival.is_empty());
        assert_eq!(
            candidates.actual_departure,
            RoleCandidates::default().actual_departure
        );
    }

    #[test]
    fn yaml_rejects_unknown_roles() {
        assert!(RoleCandidates::from_yaml_str("boarding: [\"BRD\"]\n").is_err());
    }

    #[test]
    fn empty_yaml_document_yields_defaults() {
        assert_eq!(
            RoleCandidates::from_yaml_str("").unwrap(),
            RoleCandidates::default()
        );
    }
}
