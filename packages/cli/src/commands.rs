//! Command implementations shared by the subcommands and the interactive
//! menu.

use backlog_cli_utils::{IndicatifProgress, MultiProgress};
use backlog_incident_models::IncidentStatus;
use backlog_runs::{
    GroupScope, Incidents, breakdown_by, collapse_minor_shares, evaluate_policy, latest_period,
    latest_snapshot, map_status, mark_absent_as_resolved, normalize, summarize_by,
};
use backlog_runs_models::{BreakdownDimension, GroupBy, NormalizeReport, RunPolicy, StatusPredicate};
use backlog_source::{BacklogConfig, SnapshotInput, load_snapshots};

use crate::report::{self, BreakdownReport, LatestReport, PolicyReport, RunGroup, RunsReport};

/// Label of the row that minor breakdown values are folded into.
pub const OTHERS_LABEL: &str = "Outros";

/// Name given to a policy assembled from command-line filters.
pub const AD_HOC_POLICY: &str = "ad_hoc";

/// Options of the `runs` command.
#[derive(Debug, Clone, Default)]
pub struct RunsOptions {
    /// Evaluate only the configured policies with these names.
    pub policies: Vec<String>,
    /// Ad-hoc filter: statuses that count toward a run.
    pub statuses: Vec<IncidentStatus>,
    /// Ad-hoc filter: minimum run length.
    pub min_length: Option<i64>,
    /// Group runs for presentation.
    pub group_by: Option<GroupBy>,
    /// Group incidents by id alone, ignoring the configured scope.
    pub no_scope: bool,
    /// Treat incidents missing from later snapshots as resolved.
    pub infer_resolved: bool,
    /// Print JSON instead of tables.
    pub json: bool,
}

/// Loads and normalizes snapshots, optionally inferring resolution by
/// absence.
///
/// # Errors
///
/// Returns an error if any snapshot cannot be loaded.
pub fn load_incidents(
    inputs: &[SnapshotInput],
    config: &BacklogConfig,
    scope: GroupScope,
    infer_resolved: bool,
    multi: &MultiProgress,
) -> Result<(Incidents, NormalizeReport), Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::snapshots_bar(multi, "Reading snapshots...");
    let loaded = load_snapshots(inputs, config, &progress)?;

    let normalized = normalize(loaded.rows, scope);
    log::info!(
        "{} incidents with {} records ({} rows skipped, {} duplicates replaced)",
        normalized.incidents.len(),
        normalized.record_count(),
        normalized.report.skipped(),
        normalized.report.duplicates_replaced,
    );

    let incidents = match latest_period(&normalized.incidents) {
        Some(through) if infer_resolved => mark_absent_as_resolved(&normalized.incidents, through),
        _ => normalized.incidents,
    };

    Ok((incidents, normalized.report))
}

/// Grouping scope to use given the configuration and the `--no-scope` flag.
#[must_use]
pub const fn scope_for(config: &BacklogConfig, no_scope: bool) -> GroupScope {
    if config.scope_by_category && !no_scope {
        GroupScope::CategoryAndIncident
    } else {
        GroupScope::Incident
    }
}

/// Parses a status argument, accepting both canonical names
/// (`PENDING`, `in_progress`) and snapshot labels (`Pendente`).
///
/// # Errors
///
/// Returns a message if the value names no known status.
pub fn parse_status(value: &str) -> Result<IncidentStatus, String> {
    value.parse::<IncidentStatus>().or_else(|_| {
        match map_status(value) {
            IncidentStatus::Unknown => Err(format!(
                "unknown status '{value}' (expected one of {})",
                IncidentStatus::all()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            status => Ok(status),
        }
    })
}

/// Parses a `--group-by` argument.
///
/// # Errors
///
/// Returns a message if the value names no grouping.
pub fn parse_group_by(value: &str) -> Result<GroupBy, String> {
    value
        .parse()
        .map_err(|_| format!("unknown grouping '{value}' (expected month, period, owner or category)"))
}

/// Parses a `--by` breakdown dimension.
///
/// # Errors
///
/// Returns a message if the value names no dimension.
pub fn parse_dimension(value: &str) -> Result<BreakdownDimension, String> {
    value
        .parse()
        .map_err(|_| format!("unknown dimension '{value}' (expected sector, owner, category or month)"))
}

/// Policies the `runs` command evaluates.
///
/// Ad-hoc filters take precedence, then the named policies, then every
/// configured policy. An ad-hoc filter without statuses counts every
/// unresolved snapshot.
///
/// # Errors
///
/// Returns a message if a named policy is not configured.
pub fn select_policies(config: &BacklogConfig, options: &RunsOptions) -> Result<Vec<RunPolicy>, String> {
    if !options.statuses.is_empty() || options.min_length.is_some() {
        let predicate = if options.statuses.is_empty() {
            StatusPredicate::Unresolved
        } else {
            StatusPredicate::StatusIn {
                statuses: options.statuses.clone(),
            }
        };
        return Ok(vec![RunPolicy {
            name: AD_HOC_POLICY.to_string(),
            category: None,
            predicate,
            min_length: options.min_length.unwrap_or(1),
        }]);
    }

    if !options.policies.is_empty() {
        return options
            .policies
            .iter()
            .map(|name| {
                config.policy(name).cloned().ok_or_else(|| {
                    format!(
                        "unknown policy '{name}' (configured: {})",
                        config
                            .policies
                            .iter()
                            .map(|p| p.name.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                })
            })
            .collect();
    }

    Ok(config.policies.clone())
}

/// Runs the `runs` command.
///
/// # Errors
///
/// Returns an error if loading fails or the policy selection is invalid.
pub fn runs(
    inputs: &[SnapshotInput],
    config: &BacklogConfig,
    options: &RunsOptions,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let policies = select_policies(config, options)?;
    if policies.is_empty() {
        println!("No policies configured. Pass --status or --min-length for an ad-hoc search.");
        return Ok(());
    }

    let scope = scope_for(config, options.no_scope);
    let (incidents, normalize_report) =
        load_incidents(inputs, config, scope, options.infer_resolved, multi)?;

    let policies = policies
        .iter()
        .map(|policy| {
            let runs = evaluate_policy(&incidents, policy);
            let groups = match options.group_by {
                Some(by) => summarize_by(runs, by)
                    .into_iter()
                    .map(|(key, runs)| RunGroup::new(Some(key), runs))
                    .collect(),
                None => vec![RunGroup::new(None, runs)],
            };
            PolicyReport::new(policy, groups)
        })
        .collect();

    let report = RunsReport {
        normalize: normalize_report,
        policies,
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_runs(&report);
    }

    Ok(())
}

/// Runs the `latest` command.
///
/// # Errors
///
/// Returns an error if loading fails.
pub fn latest(
    inputs: &[SnapshotInput],
    config: &BacklogConfig,
    no_scope: bool,
    infer_resolved: bool,
    json: bool,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let scope = scope_for(config, no_scope);
    let (incidents, _) = load_incidents(inputs, config, scope, infer_resolved, multi)?;
    let report = LatestReport::new(latest_snapshot(&incidents));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_latest(&report);
    }

    Ok(())
}

/// Runs the `breakdown` command.
///
/// # Errors
///
/// Returns an error if loading fails.
pub fn breakdown(
    inputs: &[SnapshotInput],
    config: &BacklogConfig,
    by: BreakdownDimension,
    min_share: Option<f64>,
    json: bool,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let scope = scope_for(config, false);
    let (incidents, _) = load_incidents(inputs, config, scope, false, multi)?;

    let mut rows = breakdown_by(&latest_snapshot(&incidents), by);
    if let Some(min_share) = min_share {
        rows = collapse_minor_shares(rows, min_share, OTHERS_LABEL);
    }
    let report = BreakdownReport::new(by, rows);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_breakdown(&report);
    }

    Ok(())
}

/// Runs the `policies` command.
pub fn list_policies(config: &BacklogConfig) {
    if config.policies.is_empty() {
        println!("No policies configured.");
        return;
    }

    println!("{:<20} {:<10} {:>6}  PREDICATE", "NAME", "CATEGORY", "WEEKS");
    println!("{}", "-".repeat(60));
    for policy in &config.policies {
        println!(
            "{:<20} {:<10} {:>6}  {}",
            policy.name,
            policy.category.as_deref().unwrap_or("*"),
            policy.min_length,
            policy.predicate
        );
    }
}
