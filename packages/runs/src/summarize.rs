//! Grouping of qualifying runs for presentation.

use std::collections::BTreeMap;

use backlog_runs_models::{GroupBy, GroupKey, Run};

/// Groups runs by a caller-supplied key.
///
/// Groups are ordered by key; runs inside a group keep the order they were
/// passed in.
pub fn summarize<K, F, I>(runs: I, mut key_fn: F) -> BTreeMap<K, Vec<Run>>
where
    K: Ord,
    F: FnMut(&Run) -> K,
    I: IntoIterator<Item = Run>,
{
    let mut groups: BTreeMap<K, Vec<Run>> = BTreeMap::new();
    for run in runs {
        groups.entry(key_fn(&run)).or_default().push(run);
    }
    groups
}

/// Groups runs by one of the common [`GroupBy`] keys.
pub fn summarize_by<I>(runs: I, by: GroupBy) -> BTreeMap<GroupKey, Vec<Run>>
where
    I: IntoIterator<Item = Run>,
{
    summarize(runs, |run| group_key(run, by))
}

/// Computes the [`GroupKey`] of a run.
#[must_use]
pub fn group_key(run: &Run, by: GroupBy) -> GroupKey {
    match by {
        GroupBy::Month => GroupKey::Month {
            year: run.end.year,
            bucket: run.end.month_bucket(),
        },
        GroupBy::Period => GroupKey::Period { period: run.end },
        GroupBy::Owner => GroupKey::Owner {
            owner: run
                .last_record()
                .map(|r| r.owner.clone())
                .unwrap_or_default(),
        },
        GroupBy::Category => GroupKey::Category {
            category: run
                .last_record()
                .map(|r| r.category.clone())
                .unwrap_or_default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use backlog_incident_models::IncidentRecord;

    use super::*;
    use crate::detect_runs;
    use crate::test_support::incidents;

    fn all(_: &IncidentRecord) -> bool {
        true
    }

    #[test]
    fn groups_by_end_month_bucket() {
        let data = incidents(&[
            ("INC-1", 2025, 1, "Pendente"),
            ("INC-1", 2025, 2, "Pendente"),
            ("INC-2", 2025, 4, "Pendente"),
            ("INC-3", 2025, 5, "Pendente"),
        ]);
        let groups = summarize_by(detect_runs(&data, &all), GroupBy::Month);

        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::Month { year: 2025, bucket: 1 },
                GroupKey::Month { year: 2025, bucket: 2 },
            ]
        );
        let first: Vec<_> = groups[&keys[0]]
            .iter()
            .map(|r| r.key.incident_id.as_str())
            .collect();
        assert_eq!(first, vec!["INC-1", "INC-2"]);
    }

    #[test]
    fn groups_by_owner_of_latest_record() {
        let mut data = incidents(&[
            ("INC-1", 2025, 1, "Pendente"),
            ("INC-1", 2025, 2, "Pendente"),
            ("INC-2", 2025, 1, "Pendente"),
        ]);
        for records in data.values_mut() {
            for record in records.iter_mut() {
                if record.period.week == 2 {
                    record.owner = "Bruno".to_string();
                }
            }
        }

        let groups = summarize_by(detect_runs(&data, &all), GroupBy::Owner);
        assert_eq!(
            groups[&GroupKey::Owner { owner: "Bruno".to_string() }].len(),
            1
        );
        assert_eq!(
            groups[&GroupKey::Owner { owner: "Ana".to_string() }].len(),
            1
        );
    }

    #[test]
    fn custom_key_keeps_scan_order() {
        let data = incidents(&[
            ("INC-3", 2025, 1, "Pendente"),
            ("INC-1", 2025, 1, "Pendente"),
            ("INC-2", 2025, 1, "Pendente"),
        ]);
        let groups = summarize(detect_runs(&data, &all), |run| run.len());
        let ids: Vec<_> = groups[&1]
            .iter()
            .map(|r| r.key.incident_id.as_str())
            .collect();
        assert_eq!(ids, vec!["INC-1", "INC-2", "INC-3"]);
    }

    #[test]
    fn empty_runs_summarize_to_nothing() {
        assert!(summarize_by(Vec::new(), GroupBy::Period).is_empty());
    }
}
