#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for backlog run detection.
//!
//! Reads weekly backlog snapshots (CSV exports, one per week and sheet),
//! finds incidents that stayed in a status for several consecutive weeks
//! and prints status reports. Without a subcommand an interactive menu
//! guides the user through the same actions.
//!
//! Logging goes through `indicatif-log-bridge` (via
//! [`backlog_cli_utils::init_logger`]) so log lines and the snapshot
//! progress bar never fight for the terminal.

mod commands;
mod interactive;
mod report;

use std::path::PathBuf;

use backlog_incident_models::IncidentStatus;
use backlog_runs_models::{BreakdownDimension, GroupBy};
use backlog_source::{BacklogConfig, SnapshotInput};
use clap::{Parser, Subcommand};

use crate::commands::RunsOptions;

#[derive(Parser)]
#[command(name = "backlog", about = "Backlog aging and run detection over weekly snapshots")]
struct Cli {
    /// Configuration file (defaults to `BACKLOG_CONFIG`, then the built-in config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find incidents that stayed in a status for consecutive weeks
    Runs {
        /// Snapshot files, optionally prefixed with a category (`SPN=Backlog_22.csv`)
        #[arg(required = true)]
        inputs: Vec<SnapshotInput>,
        /// Evaluate only this configured policy (repeatable)
        #[arg(long = "policy")]
        policies: Vec<String>,
        /// Ad-hoc filter: status that counts toward a run (repeatable)
        #[arg(long = "status", value_parser = commands::parse_status)]
        statuses: Vec<IncidentStatus>,
        /// Ad-hoc filter: minimum run length in weeks (zero or less keeps every run)
        #[arg(long, allow_negative_numbers = true)]
        min_length: Option<i64>,
        /// Group runs by month, period, owner or category
        #[arg(long, value_parser = commands::parse_group_by)]
        group_by: Option<GroupBy>,
        /// Group incidents by id alone, even across categories
        #[arg(long)]
        no_scope: bool,
        /// Treat incidents missing from later snapshots as resolved
        #[arg(long)]
        infer_resolved: bool,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Show the latest status of every incident
    Latest {
        /// Snapshot files, optionally prefixed with a category
        #[arg(required = true)]
        inputs: Vec<SnapshotInput>,
        /// Group incidents by id alone, even across categories
        #[arg(long)]
        no_scope: bool,
        /// Treat incidents missing from later snapshots as resolved
        #[arg(long)]
        infer_resolved: bool,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Count resolved and pending incidents per sector, owner, category or month
    Breakdown {
        /// Snapshot files, optionally prefixed with a category
        #[arg(required = true)]
        inputs: Vec<SnapshotInput>,
        /// Dimension to break down by
        #[arg(long, value_parser = commands::parse_dimension)]
        by: BreakdownDimension,
        /// Fold values below this share (percent) into "Outros"
        #[arg(long)]
        min_share: Option<f64>,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// List configured aging policies
    Policies,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = backlog_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = BacklogConfig::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return interactive::run(&config, &multi);
    };

    match command {
        Commands::Runs {
            inputs,
            policies,
            statuses,
            min_length,
            group_by,
            no_scope,
            infer_resolved,
            json,
        } => {
            let options = RunsOptions {
                policies,
                statuses,
                min_length,
                group_by,
                no_scope,
                infer_resolved,
                json,
            };
            commands::runs(&inputs, &config, &options, &multi)?;
        }
        Commands::Latest {
            inputs,
            no_scope,
            infer_resolved,
            json,
        } => commands::latest(&inputs, &config, no_scope, infer_resolved, json, &multi)?,
        Commands::Breakdown {
            inputs,
            by,
            min_share,
            json,
        } => commands::breakdown(&inputs, &config, by, min_share, json, &multi)?,
        Commands::Policies => commands::list_policies(&config),
    }

    Ok(())
}
