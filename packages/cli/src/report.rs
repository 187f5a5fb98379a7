//! Report shapes printed by the commands, as tables or as JSON.

use backlog_incident_models::IncidentRecord;
use backlog_runs_models::{
    BreakdownDimension, BreakdownRow, GroupKey, NormalizeReport, Run, RunPolicy, StatusPredicate,
};
use serde::Serialize;

/// Output of the `runs` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunsReport {
    /// Row counts from normalization.
    pub normalize: NormalizeReport,
    /// One entry per evaluated policy.
    pub policies: Vec<PolicyReport>,
}

/// Qualifying runs of one policy.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyReport {
    /// Policy name.
    pub policy: String,
    /// Category the policy is restricted to, if any.
    pub category: Option<String>,
    /// Status test a snapshot must pass to count toward a run.
    pub predicate: StatusPredicate,
    /// Minimum run length in weeks.
    pub min_length: i64,
    /// Qualifying runs across all groups.
    pub run_count: usize,
    /// Qualifying runs, grouped for presentation.
    pub groups: Vec<RunGroup>,
}

impl PolicyReport {
    #[must_use]
    pub fn new(policy: &RunPolicy, groups: Vec<RunGroup>) -> Self {
        Self {
            policy: policy.name.clone(),
            category: policy.category.clone(),
            predicate: policy.predicate.clone(),
            min_length: policy.min_length,
            run_count: groups.iter().map(|g| g.runs.len()).sum(),
            groups,
        }
    }
}

/// Runs sharing a [`GroupKey`], or all runs when ungrouped.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunGroup {
    /// Shared key, absent when runs are not grouped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<GroupKey>,
    /// Display form of the key (`all` when ungrouped).
    pub label: String,
    /// Runs in detection order.
    pub runs: Vec<Run>,
}

impl RunGroup {
    #[must_use]
    pub fn new(key: Option<GroupKey>, runs: Vec<Run>) -> Self {
        let label = key
            .as_ref()
            .map_or_else(|| "all".to_string(), ToString::to_string);
        Self { key, label, runs }
    }
}

/// Output of the `latest` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReport {
    /// Incidents in the report.
    pub total: usize,
    /// Incidents whose latest status is resolved or closed.
    pub resolved: usize,
    /// Incidents still unresolved.
    pub pending: usize,
    /// Latest record of every incident, in incident key order.
    pub incidents: Vec<IncidentRecord>,
}

impl LatestReport {
    #[must_use]
    pub fn new(incidents: Vec<IncidentRecord>) -> Self {
        let resolved = incidents.iter().filter(|r| r.status.is_resolved()).count();
        Self {
            total: incidents.len(),
            resolved,
            pending: incidents.len() - resolved,
            incidents,
        }
    }
}

/// Output of the `breakdown` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownReport {
    /// Dimension the incidents were counted by.
    pub dimension: BreakdownDimension,
    /// Counts per value of the dimension.
    pub rows: Vec<BreakdownRow>,
}

impl BreakdownReport {
    #[must_use]
    pub const fn new(dimension: BreakdownDimension, rows: Vec<BreakdownRow>) -> Self {
        Self { dimension, rows }
    }
}

/// One table line for a run.
#[must_use]
pub fn run_line(run: &Run) -> String {
    let (status, owner) = run
        .last_record()
        .map_or(("", ""), |r| (r.status_label.as_str(), r.owner.as_str()));
    format!(
        "{:<24} {:<9} {:<9} {:>5}  {:<16} {}",
        run.key.to_string(),
        run.start.to_string(),
        run.end.to_string(),
        run.len(),
        status,
        owner
    )
}

pub fn print_runs(report: &RunsReport) {
    let skipped = report.normalize.skipped();
    if skipped > 0 {
        println!(
            "Skipped {skipped} rows ({} without incident id, {} with a bad year/week)",
            report.normalize.missing_incident_id, report.normalize.malformed_period
        );
    }

    for policy in &report.policies {
        println!();
        println!(
            "== {} ({}, {}, >= {} weeks): {} runs",
            policy.policy,
            policy.category.as_deref().unwrap_or("all categories"),
            policy.predicate,
            policy.min_length,
            policy.run_count
        );

        if policy.run_count == 0 {
            println!("No incidents found.");
            continue;
        }

        for group in &policy.groups {
            if group.key.is_some() {
                println!("-- {} ({} runs)", group.label, group.runs.len());
            }
            println!(
                "{:<24} {:<9} {:<9} {:>5}  {:<16} OWNER",
                "INCIDENT", "START", "END", "WEEKS", "STATUS"
            );
            for run in &group.runs {
                println!("{}", run_line(run));
            }
        }
    }
}

pub fn print_latest(report: &LatestReport) {
    if report.incidents.is_empty() {
        println!("No incidents found.");
        return;
    }

    println!(
        "{:<16} {:<8} {:<9} {:<16} {:<20} SECTOR",
        "INCIDENT", "CATEGORY", "PERIOD", "STATUS", "OWNER"
    );
    println!("{}", "-".repeat(90));
    for record in &report.incidents {
        println!(
            "{:<16} {:<8} {:<9} {:<16} {:<20} {}",
            record.incident_id,
            record.category,
            record.period.to_string(),
            record.status_label,
            record.owner,
            record.sector.as_deref().unwrap_or("")
        );
    }
    println!();
    println!(
        "Total: {}  Resolved: {}  Pending: {}",
        report.total, report.resolved, report.pending
    );
}

pub fn print_breakdown(report: &BreakdownReport) {
    if report.rows.is_empty() {
        println!("No incidents found.");
        return;
    }

    println!(
        "{:<24} {:>6} {:>9} {:>7} {:>8} {:>7}",
        report.dimension.as_ref().to_uppercase(),
        "TOTAL",
        "RESOLVED",
        "%",
        "PENDING",
        "%"
    );
    println!("{}", "-".repeat(66));
    for row in &report.rows {
        println!(
            "{:<24} {:>6} {:>9} {:>6.1}% {:>8} {:>6.1}%",
            row.value,
            row.total,
            row.resolved,
            row.resolved_pct(),
            row.pending,
            row.pending_pct()
        );
    }
}
