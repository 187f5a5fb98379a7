//! Evaluation of configured aging policies.

use backlog_runs_models::{Run, RunPolicy};

use crate::detect::{StatusFilter, detect_runs, filter_by_length};
use crate::Incidents;

/// Qualifying runs found for one policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRuns<'a> {
    /// The policy that was evaluated.
    pub policy: &'a RunPolicy,
    /// Runs that reached the policy's minimum length.
    pub runs: Vec<Run>,
}

/// Detects the runs that satisfy `policy`.
#[must_use]
pub fn evaluate_policy(incidents: &Incidents, policy: &RunPolicy) -> Vec<Run> {
    let filter = StatusFilter::new(&policy.predicate).in_category(policy.category.as_deref());
    let runs = detect_runs(incidents, &filter);
    let total = runs.len();
    let runs = filter_by_length(runs, policy.min_length);

    log::debug!(
        "Policy {}: {} of {total} runs reach {} periods",
        policy.name,
        runs.len(),
        policy.min_length
    );

    runs
}

/// Evaluates every policy against the same incidents.
#[must_use]
pub fn evaluate_policies<'a>(incidents: &Incidents, policies: &'a [RunPolicy]) -> Vec<PolicyRuns<'a>> {
    policies
        .iter()
        .map(|policy| PolicyRuns {
            policy,
            runs: evaluate_policy(incidents, policy),
        })
        .collect()
}
