//! Row and record builders shared by the unit tests.

use backlog_incident_models::{IncidentKey, RawIncidentRow};

use crate::{GroupScope, Incidents, normalize};

/// A raw row for `incident_id` in the given week of `year`.
pub fn row(incident_id: &str, year: i32, week: u32, status: &str) -> RawIncidentRow {
    RawIncidentRow {
        incident_id: Some(incident_id.to_string()),
        year: year.to_string(),
        week: week.to_string(),
        status: status.to_string(),
        owner: "Ana".to_string(),
        category: "SPN".to_string(),
        sector: Some("Infra".to_string()),
        opened_at: None,
        source_file: format!("Backlog_{week}.csv"),
    }
}

/// Normalizes `(incident, year, week, status)` tuples grouped by id alone.
pub fn incidents(rows: &[(&str, i32, u32, &str)]) -> Incidents {
    normalize(
        rows.iter()
            .map(|&(id, year, week, status)| row(id, year, week, status)),
        GroupScope::Incident,
    )
    .incidents
}

/// Unscoped key shorthand.
pub fn key(incident_id: &str) -> IncidentKey {
    IncidentKey::unscoped(incident_id)
}
