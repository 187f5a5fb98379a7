//! Status breakdowns for backlog reports.
//!
//! Counts total, resolved and pending incidents per sector, owner, category
//! or backlog month.

use std::collections::BTreeMap;

use backlog_incident_models::IncidentRecord;
use backlog_runs_models::{BreakdownDimension, BreakdownRow, percentage};

/// Label used for records with no value for the dimension.
pub const UNSET_LABEL: &str = "(unset)";

/// Counts records per value of `dimension`.
///
/// Rows are sorted by total descending, then by value. Month rows are sorted
/// chronologically instead.
#[must_use]
pub fn breakdown_by(records: &[IncidentRecord], dimension: BreakdownDimension) -> Vec<BreakdownRow> {
    let mut counts: BTreeMap<String, (u64, u64)> = BTreeMap::new();

    for record in records {
        let entry = counts.entry(dimension_value(record, dimension)).or_default();
        entry.0 += 1;
        if record.status.is_resolved() {
            entry.1 += 1;
        }
    }

    let mut rows: Vec<BreakdownRow> = counts
        .into_iter()
        .map(|(value, (total, resolved))| BreakdownRow {
            value,
            total,
            resolved,
            pending: total - resolved,
        })
        .collect();

    if dimension != BreakdownDimension::Month {
        rows.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.value.cmp(&b.value)));
    }

    rows
}

fn dimension_value(record: &IncidentRecord, dimension: BreakdownDimension) -> String {
    let value = match dimension {
        BreakdownDimension::Sector => record.sector.clone(),
        BreakdownDimension::Owner => Some(record.owner.clone()),
        BreakdownDimension::Category => Some(record.category.clone()),
        BreakdownDimension::Month => record.opened_at.map(|d| d.format("%Y-%m").to_string()),
    };
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNSET_LABEL.to_string())
}

/// Folds rows whose share of the grand total is below `min_share_pct` into a
/// single trailing row named `label`.
#[must_use]
pub fn collapse_minor_shares(rows: Vec<BreakdownRow>, min_share_pct: f64, label: &str) -> Vec<BreakdownRow> {
    let grand_total: u64 = rows.iter().map(|r| r.total).sum();

    let (mut kept, minor): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|r| percentage(r.total, grand_total) >= min_share_pct);

    if !minor.is_empty() {
        kept.push(minor.into_iter().fold(
            BreakdownRow {
                value: label.to_string(),
                total: 0,
                resolved: 0,
                pending: 0,
            },
            |mut acc, r| {
                acc.total += r.total;
                acc.resolved += r.resolved;
                acc.pending += r.pending;
                acc
            },
        ));
    }

    kept
}
