#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident status, reporting period and snapshot record types.
//!
//! Every backlog snapshot row is read into a [`RawIncidentRow`] at the
//! ingestion boundary and normalized into an [`IncidentRecord`]: a typed
//! status, a [`PeriodKey`] and the file it came from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Highest week number accepted in a [`PeriodKey`].
pub const MAX_WEEK: u32 = 53;

/// Week after which the successor of a period rolls into the next year.
///
/// Reporting years are treated as 52 weeks long. A week 53 value is accepted
/// but never reached by [`PeriodKey::successor`].
pub const WEEKS_PER_YEAR: u32 = 52;

/// Workflow status of an incident in a snapshot.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum IncidentStatus {
    /// Reported but nobody has picked it up yet
    Open,
    /// Waiting on a third party or the requester
    Pending,
    /// Actively being worked
    InProgress,
    /// Fixed, waiting for confirmation or already confirmed
    Resolved,
    /// Closed for good
    Closed,
    /// Status label that does not map to any known status
    Unknown,
}

impl IncidentStatus {
    /// Returns `true` for statuses that end an incident's backlog life.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Open,
            Self::Pending,
            Self::InProgress,
            Self::Resolved,
            Self::Closed,
            Self::Unknown,
        ]
    }
}

/// Error returned when a year/week pair is not a valid [`PeriodKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPeriodError {
    /// The year that was provided.
    pub year: i32,
    /// The invalid week that was provided.
    pub week: u32,
}

impl std::fmt::Display for InvalidPeriodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid week {} in year {}: expected 1-{MAX_WEEK}",
            self.week, self.year
        )
    }
}

impl std::error::Error for InvalidPeriodError {}

/// A reporting period: one weekly snapshot.
///
/// Ordered by year, then week.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PeriodKey {
    /// Reporting year.
    pub year: i32,
    /// Week number within the year (1-53).
    pub week: u32,
}

impl PeriodKey {
    /// Creates a period from a year and week number.
    ///
    /// # Errors
    ///
    /// Returns an error if the week is not in the range 1-53.
    pub const fn new(year: i32, week: u32) -> Result<Self, InvalidPeriodError> {
        if week == 0 || week > MAX_WEEK {
            return Err(InvalidPeriodError { year, week });
        }
        Ok(Self { year, week })
    }

    /// Returns the period that immediately follows this one.
    ///
    /// Week 52 (and the occasional week 53) rolls over into week 1 of the
    /// next year.
    #[must_use]
    pub const fn successor(self) -> Self {
        if self.week < WEEKS_PER_YEAR {
            Self {
                year: self.year,
                week: self.week + 1,
            }
        } else {
            Self {
                year: self.year + 1,
                week: 1,
            }
        }
    }

    /// Returns `true` if `next` directly follows this period.
    #[must_use]
    pub fn is_followed_by(self, next: Self) -> bool {
        self.successor() == next
    }

    /// Four-week reporting bucket the week falls into (weeks 1-4 are
    /// bucket 1, weeks 5-8 bucket 2, and so on).
    #[must_use]
    pub const fn month_bucket(self) -> u32 {
        self.week.saturating_sub(1) / 4 + 1
    }
}

impl std::fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Identity of an incident for grouping.
///
/// When grouping is scoped by category the same ticket number reported under
/// two categories is tracked as two independent incidents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentKey {
    /// Category scope, `None` when grouping by incident id alone.
    pub category: Option<String>,
    /// Ticket identifier.
    pub incident_id: String,
}

impl IncidentKey {
    /// Key for an incident tracked across all categories.
    #[must_use]
    pub fn unscoped(incident_id: impl Into<String>) -> Self {
        Self {
            category: None,
            incident_id: incident_id.into(),
        }
    }

    /// Key for an incident tracked within a single category.
    #[must_use]
    pub fn scoped(category: impl Into<String>, incident_id: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            incident_id: incident_id.into(),
        }
    }
}

impl std::fmt::Display for IncidentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{category}/{}", self.incident_id),
            None => f.write_str(&self.incident_id),
        }
    }
}

/// One incident as seen in one weekly snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    /// Ticket identifier.
    pub incident_id: String,
    /// Reporting period of the snapshot the row came from.
    pub period: PeriodKey,
    /// Mapped status.
    pub status: IncidentStatus,
    /// Status text exactly as it appeared in the snapshot.
    pub status_label: String,
    /// Person or team responsible for the incident.
    pub owner: String,
    /// Backlog category (the snapshot sheet, e.g. `SPN` or `ITI`).
    pub category: String,
    /// Business sector the incident belongs to, when reported.
    pub sector: Option<String>,
    /// Month the incident entered the backlog, when reported.
    pub opened_at: Option<NaiveDate>,
    /// Snapshot file the row was loaded from.
    pub source_file: String,
}

/// A snapshot row as read from a tabular source, before any coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIncidentRow {
    /// Ticket identifier. `None` when the cell was empty or the column absent.
    pub incident_id: Option<String>,
    /// Year cell text.
    pub year: String,
    /// Week cell text.
    pub week: String,
    /// Status cell text.
    pub status: String,
    /// Owner cell text.
    pub owner: String,
    /// Category, taken from the category column or the input's override.
    pub category: String,
    /// Sector cell text.
    pub sector: Option<String>,
    /// Backlog-month cell text.
    pub opened_at: Option<String>,
    /// Snapshot file the row was read from.
    pub source_file: String,
}
