#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Run, policy and report result types for backlog run detection.
//!
//! A [`Run`] is a maximal stretch of consecutive weekly snapshots in which
//! an incident satisfies a [`StatusPredicate`]. [`RunPolicy`] pairs a
//! predicate with the minimum run length that makes a run worth reporting.

use backlog_incident_models::{IncidentKey, IncidentRecord, IncidentStatus, PeriodKey};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A maximal sequence of consecutive periods for one incident in which the
/// predicate held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    /// Incident the run belongs to.
    pub key: IncidentKey,
    /// First period of the run.
    pub start: PeriodKey,
    /// Last period of the run.
    pub end: PeriodKey,
    /// Snapshot records backing the run, one per period, in period order.
    pub records: Vec<IncidentRecord>,
}

impl Run {
    /// Number of periods covered by the run.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the run holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recent record of the run.
    #[must_use]
    pub fn last_record(&self) -> Option<&IncidentRecord> {
        self.records.last()
    }

    /// Iterates over the periods of the run.
    pub fn periods(&self) -> impl Iterator<Item = PeriodKey> + '_ {
        self.records.iter().map(|r| r.period)
    }
}

/// Serializable status predicate used by configured [`RunPolicy`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusPredicate {
    /// Every snapshot counts, whatever the status.
    Any,
    /// Any status except resolved or closed.
    Unresolved,
    /// Only the listed statuses count.
    StatusIn {
        /// Statuses that count toward a run.
        statuses: Vec<IncidentStatus>,
    },
    /// Every status except the listed ones counts.
    StatusNotIn {
        /// Statuses that break a run.
        statuses: Vec<IncidentStatus>,
    },
}

impl StatusPredicate {
    /// Evaluates the predicate for a status.
    #[must_use]
    pub fn matches(&self, status: IncidentStatus) -> bool {
        match self {
            Self::Any => true,
            Self::Unresolved => !status.is_resolved(),
            Self::StatusIn { statuses } => statuses.contains(&status),
            Self::StatusNotIn { statuses } => !statuses.contains(&status),
        }
    }
}

impl std::fmt::Display for StatusPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let join = |statuses: &[IncidentStatus]| {
            statuses
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("|")
        };
        match self {
            Self::Any => write!(f, "any status"),
            Self::Unresolved => write!(f, "unresolved"),
            Self::StatusIn { statuses } => write!(f, "status in {}", join(statuses)),
            Self::StatusNotIn { statuses } => write!(f, "status not in {}", join(statuses)),
        }
    }
}

/// A named aging rule: which snapshots count and how many consecutive ones
/// make an incident worth reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPolicy {
    /// Policy name (e.g. `"spn_pending"`).
    pub name: String,
    /// Category the policy applies to. `None` applies to every category.
    #[serde(default)]
    pub category: Option<String>,
    /// Which snapshots count toward a run.
    pub predicate: StatusPredicate,
    /// Minimum run length in periods. Zero or negative disables filtering.
    pub min_length: i64,
}

impl RunPolicy {
    /// Returns `true` if the policy applies to records of `category`.
    #[must_use]
    pub fn applies_to(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| c.eq_ignore_ascii_case(category))
    }
}

/// Common ways of grouping runs for presentation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GroupBy {
    /// Year and four-week bucket of the run's last period.
    Month,
    /// The run's last period.
    Period,
    /// Owner on the run's most recent record.
    Owner,
    /// Category on the run's most recent record.
    Category,
}

/// Group a run was placed in by [`GroupBy`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupKey {
    /// Year and four-week bucket.
    Month {
        /// Year of the run's last period.
        year: i32,
        /// Four-week bucket of the run's last period.
        bucket: u32,
    },
    /// A single reporting period.
    Period {
        /// The run's last period.
        period: PeriodKey,
    },
    /// An owner name.
    Owner {
        /// Owner on the run's most recent record.
        owner: String,
    },
    /// A category name.
    Category {
        /// Category on the run's most recent record.
        category: String,
    },
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Month { year, bucket } => write!(f, "{year} - month {bucket}"),
            Self::Period { period } => write!(f, "{period}"),
            Self::Owner { owner } => write!(f, "owner {owner}"),
            Self::Category { category } => write!(f, "category {category}"),
        }
    }
}

/// Counts collected while normalizing raw snapshot rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    /// Rows handed to normalization.
    pub rows_seen: u64,
    /// Rows kept after deduplication.
    pub records_kept: u64,
    /// Rows replaced by a later row for the same incident and period.
    pub duplicates_replaced: u64,
    /// Rows dropped because the incident id was missing.
    pub missing_incident_id: u64,
    /// Rows dropped because the year or week could not be parsed.
    pub malformed_period: u64,
}

impl NormalizeReport {
    /// Total rows dropped for bad data (not counting duplicates).
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.missing_incident_id + self.malformed_period
    }
}

/// Dimension a status breakdown is computed over.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BreakdownDimension {
    /// Business sector.
    Sector,
    /// Responsible owner.
    Owner,
    /// Backlog category.
    Category,
    /// Month the incident entered the backlog (`YYYY-MM`).
    Month,
}

/// Totals for one value of a [`BreakdownDimension`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRow {
    /// The dimension value (sector name, owner, month, ...).
    pub value: String,
    /// Incidents with this value.
    pub total: u64,
    /// Of those, resolved or closed.
    pub resolved: u64,
    /// Of those, not yet resolved.
    pub pending: u64,
}

impl BreakdownRow {
    /// Resolved share of the row's total, in percent.
    #[must_use]
    pub fn resolved_pct(&self) -> f64 {
        percentage(self.resolved, self.total)
    }

    /// Pending share of the row's total, in percent.
    #[must_use]
    pub fn pending_pct(&self) -> f64 {
        percentage(self.pending, self.total)
    }
}

/// `part` as a percentage of `total`, `0.0` for an empty total.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
