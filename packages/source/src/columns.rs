//! Snapshot column mapping.
//!
//! Spreadsheet column names drift between weeks ("Responsavel",
//! "Responsável", " Responsavel "), so each field lists candidate header
//! names tried in order. Matching folds case, surrounding whitespace and
//! Portuguese accents.

use serde::{Deserialize, Serialize};

use crate::SourceError;

/// Candidate header names for every snapshot field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Incident identifier (required).
    pub incident_id: Vec<String>,
    /// Reporting year (required).
    pub year: Vec<String>,
    /// Reporting week (required).
    pub week: Vec<String>,
    /// Status label (required).
    pub status: Vec<String>,
    /// Responsible owner.
    #[serde(default)]
    pub owner: Vec<String>,
    /// Backlog category.
    #[serde(default)]
    pub category: Vec<String>,
    /// Business sector.
    #[serde(default)]
    pub sector: Vec<String>,
    /// Month the incident entered the backlog.
    #[serde(default)]
    pub opened_at: Vec<String>,
}

/// Column positions of a [`ColumnMapping`] within one snapshot's header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedColumns {
    /// Incident identifier column.
    pub incident_id: usize,
    /// Year column.
    pub year: usize,
    /// Week column.
    pub week: usize,
    /// Status column.
    pub status: usize,
    /// Owner column, if present.
    pub owner: Option<usize>,
    /// Category column, if present.
    pub category: Option<usize>,
    /// Sector column, if present.
    pub sector: Option<usize>,
    /// Backlog-month column, if present.
    pub opened_at: Option<usize>,
}

impl ResolvedColumns {
    /// Locates every mapped field in `headers`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumn`] if a required field has no
    /// matching header.
    pub fn resolve(headers: &[String], mapping: &ColumnMapping, file: &str) -> Result<Self, SourceError> {
        let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();

        let required = |field: &'static str, candidates: &[String]| {
            find_column(&folded, candidates).ok_or_else(|| SourceError::MissingColumn {
                file: file.to_string(),
                field,
                candidates: candidates.join(", "),
            })
        };

        let resolved = Self {
            incident_id: required("incident_id", &mapping.incident_id)?,
            year: required("year", &mapping.year)?,
            week: required("week", &mapping.week)?,
            status: required("status", &mapping.status)?,
            owner: find_column(&folded, &mapping.owner),
            category: find_column(&folded, &mapping.category),
            sector: find_column(&folded, &mapping.sector),
            opened_at: find_column(&folded, &mapping.opened_at),
        };

        for (field, column) in [
            ("owner", resolved.owner),
            ("category", resolved.category),
            ("sector", resolved.sector),
            ("opened_at", resolved.opened_at),
        ] {
            if column.is_none() {
                log::debug!("{file}: optional field '{field}' not present");
            }
        }

        Ok(resolved)
    }
}

/// Returns the index of the first candidate present in `folded_headers`.
fn find_column(folded_headers: &[String], candidates: &[String]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        let wanted = fold_header(candidate);
        folded_headers.iter().position(|h| *h == wanted)
    })
}

/// Lowercases, trims and strips Portuguese diacritics from a header.
#[must_use]
pub fn fold_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            '_' => ' ',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BacklogConfig;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn folds_accents_case_and_whitespace() {
        assert_eq!(fold_header(" Responsável "), "responsavel");
        assert_eq!(fold_header("SEMANA"), "semana");
        assert_eq!(fold_header("\u{feff}Incidente"), "incidente");
        assert_eq!(fold_header("Opened_At"), "opened at");
    }

    #[test]
    fn resolves_portuguese_headers() {
        let mapping = BacklogConfig::embedded().unwrap().columns;
        let cols = ResolvedColumns::resolve(
            &headers(&["Setor", "Responsável", "Semana", "Incidente", "Backlog", "Status", "Ano"]),
            &mapping,
            "Backlog_5.csv",
        )
        .unwrap();

        assert_eq!(cols.incident_id, 3);
        assert_eq!(cols.year, 6);
        assert_eq!(cols.week, 2);
        assert_eq!(cols.status, 5);
        assert_eq!(cols.owner, Some(1));
        assert_eq!(cols.sector, Some(0));
        assert_eq!(cols.opened_at, Some(4));
        assert_eq!(cols.category, None);
    }

    #[test]
    fn first_candidate_wins() {
        let mapping = BacklogConfig::embedded().unwrap().columns;
        let cols = ResolvedColumns::resolve(
            &headers(&["ID", "Incidente", "Ano", "Semana", "Status"]),
            &mapping,
            "x.csv",
        )
        .unwrap();
        assert_eq!(cols.incident_id, 1);
    }

    #[test]
    fn missing_required_column_is_a_config_error() {
        let mapping = BacklogConfig::embedded().unwrap().columns;
        let err = ResolvedColumns::resolve(
            &headers(&["Incidente", "Ano", "Status"]),
            &mapping,
            "Backlog_7.csv",
        )
        .unwrap_err();

        match err {
            SourceError::MissingColumn { file, field, candidates } => {
                assert_eq!(file, "Backlog_7.csv");
                assert_eq!(field, "week");
                assert_eq!(candidates, "Semana, Week");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
