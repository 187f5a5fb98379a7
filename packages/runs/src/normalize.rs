//! Raw snapshot rows to per-incident record sequences.
//!
//! Snapshot data is maintained by hand, so normalization is best effort:
//! rows with a missing incident id or an unparseable year/week are dropped
//! and counted rather than failing the whole load.

use std::collections::BTreeMap;

use backlog_incident_models::{IncidentKey, IncidentRecord, PeriodKey, RawIncidentRow};
use backlog_runs_models::NormalizeReport;
use chrono::NaiveDate;

use crate::Incidents;
use crate::status_mapping::map_status;

/// How incident identities are formed when grouping rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupScope {
    /// Group by incident id alone.
    #[default]
    Incident,
    /// Group by category and incident id, so the same ticket reported in two
    /// categories yields two independent sequences.
    CategoryAndIncident,
}

impl GroupScope {
    fn key(self, category: &str, incident_id: &str) -> IncidentKey {
        match self {
            Self::Incident => IncidentKey::unscoped(incident_id),
            Self::CategoryAndIncident => IncidentKey::scoped(category, incident_id),
        }
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Records per incident, sorted by period, one record per period.
    pub incidents: Incidents,
    /// What happened to the input rows.
    pub report: NormalizeReport,
}

impl Normalized {
    /// Total number of records kept across all incidents.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.incidents.values().map(Vec::len).sum()
    }
}

/// Groups raw rows by incident, coerces periods, deduplicates and sorts.
///
/// Rows are considered in iteration order: when two rows share an incident
/// and a period, the later one replaces the earlier one.
pub fn normalize<I>(rows: I, scope: GroupScope) -> Normalized
where
    I: IntoIterator<Item = RawIncidentRow>,
{
    let mut report = NormalizeReport::default();
    let mut grouped: BTreeMap<IncidentKey, BTreeMap<PeriodKey, IncidentRecord>> = BTreeMap::new();

    for row in rows {
        report.rows_seen += 1;

        let Some(incident_id) = row
            .incident_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
        else {
            log::debug!("Dropping row from {} with no incident id", row.source_file);
            report.missing_incident_id += 1;
            continue;
        };

        let Some(period) = parse_period(&row.year, &row.week) else {
            log::debug!(
                "Dropping {incident_id} from {}: unparseable period year={:?} week={:?}",
                row.source_file,
                row.year,
                row.week
            );
            report.malformed_period += 1;
            continue;
        };

        let category = row.category.trim().to_string();
        let key = scope.key(&category, &incident_id);

        let record = IncidentRecord {
            incident_id,
            period,
            status: map_status(&row.status),
            status_label: row.status.trim().to_string(),
            owner: row.owner.trim().to_string(),
            category,
            sector: non_blank(row.sector),
            opened_at: row.opened_at.as_deref().and_then(parse_opened_at),
            source_file: row.source_file,
        };

        if grouped.entry(key).or_default().insert(period, record).is_some() {
            report.duplicates_replaced += 1;
        }
    }

    let incidents: Incidents = grouped
        .into_iter()
        .map(|(key, by_period)| (key, by_period.into_values().collect()))
        .collect();

    report.records_kept = incidents.values().map(|r| r.len() as u64).sum();

    if report.skipped() > 0 {
        log::warn!(
            "Skipped {} of {} rows ({} without incident id, {} with unparseable year/week)",
            report.skipped(),
            report.rows_seen,
            report.missing_incident_id,
            report.malformed_period
        );
    }
    if report.duplicates_replaced > 0 {
        log::info!(
            "Collapsed {} duplicate rows for the same incident and week",
            report.duplicates_replaced
        );
    }

    Normalized { incidents, report }
}

/// Parses a year and week cell pair into a [`PeriodKey`].
#[must_use]
pub fn parse_period(year: &str, week: &str) -> Option<PeriodKey> {
    let year = i32::try_from(parse_whole_number(year)?).ok()?;
    let week = u32::try_from(parse_whole_number(week)?).ok()?;
    PeriodKey::new(year, week).ok()
}

/// Parses a cell holding a whole number.
///
/// Spreadsheet exports often write integers as floats (`"12.0"`); those are
/// accepted as long as the fractional part is zero.
#[allow(clippy::cast_possible_truncation)]
fn parse_whole_number(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        Some(f as i64)
    } else {
        None
    }
}

/// Parses the backlog-month cell.
///
/// Accepts ISO dates, ISO datetimes, `DD/MM/YYYY` and `MM/YYYY`.
#[must_use]
pub fn parse_opened_at(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // Month-only cells ("03/2025")
    if let Ok(date) = NaiveDate::parse_from_str(&format!("01/{s}"), "%d/%m/%Y") {
        return Some(date);
    }

    log::debug!("Unparseable backlog date {s:?}");
    None
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use backlog_incident_models::IncidentStatus;

    use super::*;
    use crate::test_support::row;

    #[test]
    fn coerces_integer_and_float_cells() {
        assert_eq!(parse_period("2025", "3"), PeriodKey::new(2025, 3).ok());
        assert_eq!(parse_period(" 2025.0 ", "12.0"), PeriodKey::new(2025, 12).ok());
        assert_eq!(parse_period("2025", "3.5"), None);
        assert_eq!(parse_period("2025", "abc"), None);
        assert_eq!(parse_period("", "3"), None);
        assert_eq!(parse_period("2025", "0"), None);
        assert_eq!(parse_period("2025", "54"), None);
        assert_eq!(parse_period("2025", "-1"), None);
    }

    #[test]
    fn drops_malformed_and_missing_id_rows() {
        let mut no_id = row("INC-1", 2025, 1, "Pendente");
        no_id.incident_id = Some("   ".to_string());
        let mut bad_week = row("INC-2", 2025, 1, "Pendente");
        bad_week.week = "semana 2".to_string();

        let normalized = normalize(
            vec![no_id, bad_week, row("INC-3", 2025, 1, "Pendente")],
            GroupScope::Incident,
        );

        assert_eq!(normalized.report.rows_seen, 3);
        assert_eq!(normalized.report.missing_incident_id, 1);
        assert_eq!(normalized.report.malformed_period, 1);
        assert_eq!(normalized.report.records_kept, 1);
        assert_eq!(normalized.incidents.len(), 1);
        assert!(
            normalized
                .incidents
                .contains_key(&IncidentKey::unscoped("INC-3"))
        );
    }

    #[test]
    fn sorts_records_by_period() {
        let normalized = normalize(
            vec![
                row("INC-1", 2026, 1, "Pendente"),
                row("INC-1", 2025, 52, "Pendente"),
                row("INC-1", 2025, 3, "Pendente"),
            ],
            GroupScope::Incident,
        );
        let periods: Vec<_> = normalized.incidents[&IncidentKey::unscoped("INC-1")]
            .iter()
            .map(|r| (r.period.year, r.period.week))
            .collect();
        assert_eq!(periods, vec![(2025, 3), (2025, 52), (2026, 1)]);
    }

    #[test]
    fn later_duplicate_wins() {
        let mut first = row("INC-1", 2025, 2, "Pendente");
        first.source_file = "Backlog_2.csv".to_string();
        let mut second = row("INC-1", 2025, 2, "Resolvido");
        second.source_file = "Backlog_2_fix.csv".to_string();

        let normalized = normalize(vec![first, second], GroupScope::Incident);
        let records = &normalized.incidents[&IncidentKey::unscoped("INC-1")];

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, IncidentStatus::Resolved);
        assert_eq!(records[0].source_file, "Backlog_2_fix.csv");
        assert_eq!(normalized.report.duplicates_replaced, 1);
    }

    #[test]
    fn category_scope_separates_incidents() {
        let mut spn = row("INC-1", 2025, 1, "Pendente");
        spn.category = "SPN".to_string();
        let mut iti = row("INC-1", 2025, 1, "Pendente");
        iti.category = "ITI".to_string();

        let scoped = normalize(vec![spn.clone(), iti.clone()], GroupScope::CategoryAndIncident);
        assert_eq!(scoped.incidents.len(), 2);
        assert_eq!(scoped.report.duplicates_replaced, 0);

        let unscoped = normalize(vec![spn, iti], GroupScope::Incident);
        assert_eq!(unscoped.incidents.len(), 1);
        assert_eq!(unscoped.report.duplicates_replaced, 1);
    }

    #[test]
    fn empty_input_is_empty_output() {
        let normalized = normalize(Vec::new(), GroupScope::Incident);
        assert!(normalized.incidents.is_empty());
        assert_eq!(normalized.report, NormalizeReport::default());
    }

    #[test]
    fn parses_backlog_dates() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1);
        assert_eq!(parse_opened_at("2025-03-01"), expected);
        assert_eq!(parse_opened_at("01/03/2025"), expected);
        assert_eq!(parse_opened_at("03/2025"), expected);
        assert_eq!(parse_opened_at("2025-03-01 00:00:00"), expected);
        assert_eq!(parse_opened_at("march"), None);
        assert_eq!(parse_opened_at(""), None);
    }

    #[test]
    fn trims_and_keeps_optional_fields() {
        let mut r = row("  INC-9 ", 2025, 4, " Pendente ");
        r.sector = Some("  ".to_string());
        r.opened_at = Some("2025-01-15".to_string());

        let normalized = normalize(vec![r], GroupScope::Incident);
        let record = &normalized.incidents[&IncidentKey::unscoped("INC-9")][0];
        assert_eq!(record.incident_id, "INC-9");
        assert_eq!(record.status_label, "Pendente");
        assert_eq!(record.sector, None);
        assert_eq!(record.opened_at, NaiveDate::from_ymd_opt(2025, 1, 15));
    }
}
