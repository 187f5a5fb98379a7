#![allow(clippy::module_name_repetitions)]

//! Interactive menu for the backlog tool.
//!
//! Prompts with `dialoguer` for an action, the snapshot files and the
//! action's options, then runs the same code as the subcommands.

use backlog_cli_utils::MultiProgress;
use backlog_runs_models::{BreakdownDimension, GroupBy};
use backlog_source::{BacklogConfig, SnapshotInput};
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::commands::{self, RunsOptions};

/// Actions offered by the menu.
enum Action {
    PolicyRuns,
    AdHocRuns,
    Latest,
    Breakdown,
    ListPolicies,
}

impl Action {
    const ALL: &[Self] = &[
        Self::PolicyRuns,
        Self::AdHocRuns,
        Self::Latest,
        Self::Breakdown,
        Self::ListPolicies,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::PolicyRuns => "Find aging incidents (configured policies)",
            Self::AdHocRuns => "Find runs with a custom status filter",
            Self::Latest => "Show latest status per incident",
            Self::Breakdown => "Status breakdown",
            Self::ListPolicies => "List policies",
        }
    }
}

const GROUPINGS: &[Option<GroupBy>] = &[
    None,
    Some(GroupBy::Month),
    Some(GroupBy::Period),
    Some(GroupBy::Owner),
    Some(GroupBy::Category),
];

const DIMENSIONS: &[BreakdownDimension] = &[
    BreakdownDimension::Owner,
    BreakdownDimension::Sector,
    BreakdownDimension::Category,
    BreakdownDimension::Month,
];

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if a prompt fails or the chosen action fails.
pub fn run(config: &BacklogConfig, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Backlog Runs");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::PolicyRuns => {
            let inputs = prompt_inputs()?;
            let mut options = prompt_run_options()?;
            if !config.policies.is_empty() {
                let names: Vec<&str> = config.policies.iter().map(|p| p.name.as_str()).collect();
                let selected = MultiSelect::new()
                    .with_prompt("Policies (space=toggle, enter=confirm, none=all)")
                    .items(&names)
                    .interact()?;
                options.policies = selected.iter().map(|&i| names[i].to_string()).collect();
            }
            commands::runs(&inputs, config, &options, multi)?;
        }
        Action::AdHocRuns => {
            let inputs = prompt_inputs()?;
            let mut options = prompt_run_options()?;

            let raw: String = Input::new()
                .with_prompt("Statuses that count (comma-separated, empty for any unresolved)")
                .allow_empty(true)
                .interact_text()?;
            options.statuses = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(commands::parse_status)
                .collect::<Result<_, _>>()?;

            let min_length: i64 = Input::new()
                .with_prompt("Minimum consecutive weeks")
                .default(3)
                .interact_text()?;
            options.min_length = Some(min_length);

            commands::runs(&inputs, config, &options, multi)?;
        }
        Action::Latest => {
            let inputs = prompt_inputs()?;
            let infer_resolved = prompt_infer_resolved()?;
            commands::latest(&inputs, config, false, infer_resolved, false, multi)?;
        }
        Action::Breakdown => {
            let inputs = prompt_inputs()?;
            let labels: Vec<&str> = DIMENSIONS
                .iter()
                .map(<BreakdownDimension as AsRef<str>>::as_ref)
                .collect();
            let by = Select::new()
                .with_prompt("Break down by")
                .items(&labels)
                .default(0)
                .interact()?;
            let min_share: f64 = Input::new()
                .with_prompt("Fold values below this share into \"Outros\" (percent, 0 to keep all)")
                .default(0.0)
                .interact_text()?;
            let min_share = (min_share > 0.0).then_some(min_share);
            commands::breakdown(&inputs, config, DIMENSIONS[by], min_share, false, multi)?;
        }
        Action::ListPolicies => commands::list_policies(config),
    }

    Ok(())
}

/// Prompts for snapshot files until at least one valid input is given.
fn prompt_inputs() -> Result<Vec<SnapshotInput>, Box<dyn std::error::Error>> {
    loop {
        let raw: String = Input::new()
            .with_prompt("Snapshot files (space-separated, CATEGORY=PATH to force a category)")
            .interact_text()?;

        match parse_inputs(&raw) {
            Ok(inputs) if !inputs.is_empty() => return Ok(inputs),
            Ok(_) => println!("At least one snapshot file is required."),
            Err(e) => println!("{e}"),
        }
    }
}

fn parse_inputs(raw: &str) -> Result<Vec<SnapshotInput>, backlog_source::SourceError> {
    raw.split_whitespace().map(str::parse).collect()
}

fn prompt_run_options() -> Result<RunsOptions, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = GROUPINGS
        .iter()
        .map(|g| g.as_ref().map_or("no grouping", <GroupBy as AsRef<str>>::as_ref))
        .collect();
    let grouping = Select::new()
        .with_prompt("Group runs by")
        .items(&labels)
        .default(0)
        .interact()?;

    let no_scope = !Confirm::new()
        .with_prompt("Track the same incident separately per category?")
        .default(true)
        .interact()?;

    Ok(RunsOptions {
        group_by: GROUPINGS[grouping],
        no_scope,
        infer_resolved: prompt_infer_resolved()?,
        ..RunsOptions::default()
    })
}

fn prompt_infer_resolved() -> Result<bool, dialoguer::Error> {
    Confirm::new()
        .with_prompt("Treat incidents missing from the latest snapshot as resolved?")
        .default(false)
        .interact()
}
