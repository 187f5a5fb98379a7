#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Backlog snapshot ingestion.
//!
//! Weekly backlog snapshots arrive as CSV exports of hand-maintained
//! spreadsheets. This crate maps their columns onto the explicit
//! [`RawIncidentRow`](backlog_incident_models::RawIncidentRow) schema,
//! reports snapshots that lack a required column as configuration errors,
//! and loads the [`BacklogConfig`] that drives the whole toolchain.

pub mod columns;
pub mod config;
pub mod progress;
pub mod snapshot;

pub use columns::{ColumnMapping, ResolvedColumns};
pub use config::BacklogConfig;
pub use snapshot::{LoadResult, SnapshotInput, load_snapshot_file, load_snapshots, read_snapshot};

/// Errors that can occur while loading configuration or snapshots.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error (file open/read).
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// File being read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// CSV parsing failed.
    #[error("CSV parse error in {file}: {source}")]
    Csv {
        /// Snapshot being parsed.
        file: String,
        /// Underlying error.
        source: csv::Error,
    },

    /// TOML configuration could not be parsed.
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration is syntactically valid but unusable.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// A snapshot has no header for a required field.
    #[error("{file}: no column for required field '{field}' (tried {candidates})")]
    MissingColumn {
        /// Snapshot being parsed.
        file: String,
        /// Field that could not be mapped.
        field: &'static str,
        /// Header names that were tried.
        candidates: String,
    },

    /// A snapshot input argument could not be understood.
    #[error("Invalid snapshot input '{input}': {message}")]
    InvalidInput {
        /// The argument as given.
        input: String,
        /// Description of what went wrong.
        message: String,
    },
}
