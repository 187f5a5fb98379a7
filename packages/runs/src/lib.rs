#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Consecutive-period run detection over weekly incident snapshots.
//!
//! The pipeline is a handful of pure functions:
//!
//! 1. [`normalize`] groups raw snapshot rows by incident, coerces the
//!    period fields, drops bad rows and deduplicates per period.
//! 2. [`detect_runs`] scans each incident once and cuts its records into
//!    maximal runs of consecutive periods where a [`RunPredicate`] holds.
//! 3. [`filter_by_length`] keeps runs that reach a threshold.
//! 4. [`summarize`] groups the survivors for presentation.
//!
//! Nothing here keeps state between calls or performs I/O.

pub mod breakdown;
pub mod consolidate;
pub mod detect;
pub mod normalize;
pub mod policy;
pub mod status_mapping;
pub mod summarize;

#[cfg(test)]
mod test_support;

use std::collections::BTreeMap;

use backlog_incident_models::{IncidentKey, IncidentRecord};

pub use breakdown::{breakdown_by, collapse_minor_shares};
pub use consolidate::{
    INFERRED_SOURCE, is_inferred, latest_period, latest_snapshot, mark_absent_as_resolved,
};
pub use detect::{RunPredicate, StatusFilter, detect_runs, filter_by_length};
pub use normalize::{GroupScope, Normalized, normalize};
pub use policy::{PolicyRuns, evaluate_policies, evaluate_policy};
pub use status_mapping::map_status;
pub use summarize::{group_key, summarize, summarize_by};

/// Normalized records per incident, each sequence sorted by period with at
/// most one record per period.
pub type Incidents = BTreeMap<IncidentKey, Vec<IncidentRecord>>;
