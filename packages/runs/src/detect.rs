//! Run detection.
//!
//! Each incident's records are scanned once with a two-state machine: no
//! open run, or a run open from `start` through `last`. A record extends
//! the open run only when the predicate holds and its period is the
//! successor of `last`; otherwise the open run is closed. Records inferred
//! by [`crate::mark_absent_as_resolved`] only ever close runs.

use backlog_incident_models::{IncidentKey, IncidentRecord, PeriodKey};
use backlog_runs_models::{Run, StatusPredicate};

use crate::Incidents;
use crate::consolidate::is_inferred;

/// Decides whether a snapshot record counts toward a run.
///
/// Implemented for any `Fn(&IncidentRecord) -> bool` and for
/// [`StatusFilter`].
pub trait RunPredicate {
    /// Returns `true` if the record counts toward a run.
    fn matches(&self, record: &IncidentRecord) -> bool;
}

impl<F> RunPredicate for F
where
    F: Fn(&IncidentRecord) -> bool,
{
    fn matches(&self, record: &IncidentRecord) -> bool {
        self(record)
    }
}

/// A [`StatusPredicate`] optionally restricted to one category.
#[derive(Debug, Clone, Copy)]
pub struct StatusFilter<'a> {
    /// Status test applied to every record.
    pub predicate: &'a StatusPredicate,
    /// When set, records of other categories never count.
    pub category: Option<&'a str>,
}

impl<'a> StatusFilter<'a> {
    /// Filter on status alone.
    #[must_use]
    pub const fn new(predicate: &'a StatusPredicate) -> Self {
        Self {
            predicate,
            category: None,
        }
    }

    /// Restricts the filter to records of `category` (case-insensitive).
    #[must_use]
    pub const fn in_category(mut self, category: Option<&'a str>) -> Self {
        self.category = category;
        self
    }
}

impl RunPredicate for StatusFilter<'_> {
    fn matches(&self, record: &IncidentRecord) -> bool {
        self.category
            .is_none_or(|c| c.eq_ignore_ascii_case(&record.category))
            && self.predicate.matches(record.status)
    }
}

/// A run being built.
struct OpenRun {
    start: PeriodKey,
    last: PeriodKey,
    records: Vec<IncidentRecord>,
}

impl OpenRun {
    fn start(record: &IncidentRecord) -> Self {
        Self {
            start: record.period,
            last: record.period,
            records: vec![record.clone()],
        }
    }

    fn close(self, key: &IncidentKey) -> Run {
        Run {
            key: key.clone(),
            start: self.start,
            end: self.last,
            records: self.records,
        }
    }
}

/// Cuts every incident's records into maximal runs where `predicate` holds.
///
/// Runs come out grouped by incident (in key order) and, within an
/// incident, in period order. Records must be sorted by period, as
/// produced by [`crate::normalize`]. Records synthesized by
/// [`crate::mark_absent_as_resolved`] never count, whatever the predicate.
///
/// On unnormalized input a record repeating the open run's last period
/// replaces that period's record: it stays in the run when the predicate
/// holds and is cut from it otherwise.
pub fn detect_runs<P>(incidents: &Incidents, predicate: &P) -> Vec<Run>
where
    P: RunPredicate + ?Sized,
{
    let mut runs = Vec::new();
    for (key, records) in incidents {
        scan_incident(key, records, predicate, &mut runs);
    }
    runs
}

fn scan_incident<P>(key: &IncidentKey, records: &[IncidentRecord], predicate: &P, out: &mut Vec<Run>)
where
    P: RunPredicate + ?Sized,
{
    let mut open: Option<OpenRun> = None;

    for record in records {
        if is_inferred(record) || !predicate.matches(record) {
            if let Some(mut run) = open.take() {
                if run.last == record.period {
                    run.records.pop();
                }
                if let Some(previous) = run.records.last() {
                    run.last = previous.period;
                    out.push(run.close(key));
                }
            }
            continue;
        }

        open = Some(match open.take() {
            None => OpenRun::start(record),
            Some(mut run) if run.last.is_followed_by(record.period) => {
                run.last = record.period;
                run.records.push(record.clone());
                run
            }
            // Same period twice: the later record wins without lengthening the run.
            Some(mut run) if run.last == record.period => {
                run.records.pop();
                run.records.push(record.clone());
                run
            }
            Some(run) => {
                out.push(run.close(key));
                OpenRun::start(record)
            }
        });
    }

    if let Some(run) = open {
        out.push(run.close(key));
    }
}

/// Keeps runs at least `min_length` periods long.
///
/// A threshold of zero or less keeps every run.
#[must_use]
pub fn filter_by_length(runs: Vec<Run>, min_length: i64) -> Vec<Run> {
    if min_length <= 0 {
        return runs;
    }
    runs.into_iter()
        .filter(|run| i64::try_from(run.len()).unwrap_or(i64::MAX) >= min_length)
        .collect()
}
