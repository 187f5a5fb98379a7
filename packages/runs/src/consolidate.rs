//! Cross-snapshot consolidation.
//!
//! [`latest_snapshot`] collapses every incident to its most recent record.
//! [`mark_absent_as_resolved`] is the opt-in policy that treats incidents
//! missing from later snapshots as resolved; the run detector never infers
//! that on its own, and never counts an inferred record toward a run.

use backlog_incident_models::{IncidentRecord, IncidentStatus, PeriodKey};

use crate::Incidents;

/// Source file recorded on records synthesized by [`mark_absent_as_resolved`].
pub const INFERRED_SOURCE: &str = "<inferred>";

/// Most recent record of every incident, in incident key order.
#[must_use]
pub fn latest_snapshot(incidents: &Incidents) -> Vec<IncidentRecord> {
    incidents
        .values()
        .filter_map(|records| records.last().cloned())
        .collect()
}

/// Returns `true` for records synthesized by [`mark_absent_as_resolved`].
#[must_use]
pub fn is_inferred(record: &IncidentRecord) -> bool {
    record.source_file == INFERRED_SOURCE
}

/// Latest period present in any incident.
#[must_use]
pub fn latest_period(incidents: &Incidents) -> Option<PeriodKey> {
    incidents
        .values()
        .filter_map(|records| records.last().map(|r| r.period))
        .max()
}

/// Appends a synthetic resolved record to every unresolved incident that
/// stops appearing before `through`.
///
/// The synthetic record sits in the period right after the incident's last
/// appearance and copies its other fields. It shows up in
/// [`latest_snapshot`] but ends runs rather than extending them, since the
/// incident was not reported in that period.
#[must_use]
pub fn mark_absent_as_resolved(incidents: &Incidents, through: PeriodKey) -> Incidents {
    let mut inferred = 0_u64;

    let result = incidents
        .iter()
        .map(|(key, records)| {
            let mut records = records.clone();
            if let Some(last) = records.last()
                && last.period < through
                && !last.status.is_resolved()
            {
                let mut resolved = last.clone();
                resolved.period = last.period.successor();
                resolved.status = IncidentStatus::Resolved;
                resolved.status_label = "absent from later snapshots".to_string();
                resolved.source_file = INFERRED_SOURCE.to_string();
                records.push(resolved);
                inferred += 1;
            }
            (key.clone(), records)
        })
        .collect();

    log::info!("Inferred {inferred} incidents as resolved by absence through {through}");

    result
}

#[cfg(test)]
mod tests {
    use backlog_runs_models::{RunPolicy, StatusPredicate};

    use super::*;
    use crate::{detect_runs, evaluate_policy};
    use crate::test_support::{incidents, key};

    #[test]
    fn latest_record_per_incident() {
        let data = incidents(&[
            ("INC-1", 2025, 1, "Pendente"),
            ("INC-1", 2025, 2, "Resolvido"),
            ("INC-2", 2025, 1, "Em aberto"),
        ]);
        let latest = latest_snapshot(&data);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].status, IncidentStatus::Resolved);
        assert_eq!(latest[1].status, IncidentStatus::Open);
        assert_eq!(latest_period(&data), PeriodKey::new(2025, 2).ok());
    }

    #[test]
    fn latest_period_of_nothing() {
        assert_eq!(latest_period(&Incidents::new()), None);
    }

    #[test]
    fn absent_incidents_become_resolved() {
        let data = incidents(&[
            ("INC-1", 2025, 1, "Pendente"),
            ("INC-2", 2025, 1, "Pendente"),
            ("INC-2", 2025, 3, "Pendente"),
            ("INC-3", 2025, 2, "Resolvido"),
        ]);
        let through = PeriodKey::new(2025, 3).unwrap();
        let marked = mark_absent_as_resolved(&data, through);

        let inc1 = &marked[&key("INC-1")];
        assert_eq!(inc1.len(), 2);
        assert_eq!(inc1[1].period, PeriodKey::new(2025, 2).unwrap());
        assert_eq!(inc1[1].status, IncidentStatus::Resolved);
        assert_eq!(inc1[1].source_file, INFERRED_SOURCE);

        // Still present in the latest snapshot.
        assert_eq!(marked[&key("INC-2")].len(), 2);
        // Already resolved.
        assert_eq!(marked[&key("INC-3")].len(), 1);
    }

    #[test]
    fn inference_is_explicit() {
        let data = incidents(&[
            ("INC-1", 2025, 1, "Pendente"),
            ("INC-1", 2025, 2, "Pendente"),
        ]);
        let pending = |r: &IncidentRecord| r.status == IncidentStatus::Pending;

        // Without the transformation the run simply ends at the last snapshot.
        let runs = detect_runs(&data, &pending);
        assert_eq!(runs[0].end, PeriodKey::new(2025, 2).unwrap());

        let marked = mark_absent_as_resolved(&data, PeriodKey::new(2025, 5).unwrap());
        let runs = detect_runs(&marked, &pending);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 2);
        assert_eq!(marked[&key("INC-1")].len(), 3);
    }

    #[test]
    fn inferred_week_does_not_lengthen_any_status_runs() {
        let mut rows = Vec::new();
        for week in 1..=4 {
            rows.push(("INC-1", 2025, week, "Em andamento"));
        }
        for week in 1..=6 {
            rows.push(("INC-2", 2025, week, "Em andamento"));
        }
        let data = incidents(&rows);
        let policy = RunPolicy {
            name: "iti_aging".to_string(),
            category: None,
            predicate: StatusPredicate::Any,
            min_length: 5,
        };

        let plain = evaluate_policy(&data, &policy);
        let through = latest_period(&data).unwrap();
        let marked = mark_absent_as_resolved(&data, through);
        let inferred = evaluate_policy(&marked, &policy);

        assert_eq!(marked[&key("INC-1")].len(), 5);
        assert_eq!(plain, inferred);
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].key, key("INC-2"));
        assert_eq!(inferred[0].len(), 6);
        assert!(inferred[0].records.iter().all(|r| !is_inferred(r)));
    }

    #[test]
    fn status_not_in_skips_inferred_resolution() {
        let data = incidents(&[
            ("INC-1", 2025, 1, "Pendente"),
            ("INC-1", 2025, 2, "Pendente"),
            ("INC-2", 2025, 3, "Pendente"),
        ]);
        let policy = RunPolicy {
            name: "not_open".to_string(),
            category: None,
            predicate: StatusPredicate::StatusNotIn {
                statuses: vec![IncidentStatus::Open],
            },
            min_length: 3,
        };
        let marked = mark_absent_as_resolved(&data, PeriodKey::new(2025, 3).unwrap());
        assert!(evaluate_policy(&marked, &policy).is_empty());
    }
}
