//! Weekly snapshot CSV reading.
//!
//! Each snapshot is a CSV export of one backlog sheet. Headers are mapped
//! through a [`ColumnMapping`], blank rows are skipped, and every other row
//! becomes a [`RawIncidentRow`] tagged with its source file. Validation of
//! the year, week and status cells happens later, during normalization.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};

use backlog_incident_models::RawIncidentRow;

use crate::SourceError;
use crate::columns::{ColumnMapping, ResolvedColumns};
use crate::config::BacklogConfig;
use crate::progress::ProgressCallback;

/// A snapshot file to load, optionally forcing every row's category.
///
/// Parsed from `PATH` or `CATEGORY=PATH` (e.g. `SPN=Backlog_22.csv`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInput {
    /// Snapshot file.
    pub path: PathBuf,
    /// Category assigned to every row, overriding the category column.
    pub category: Option<String>,
}

impl SnapshotInput {
    /// Name recorded as the rows' source file.
    #[must_use]
    pub fn source_file(&self) -> String {
        file_label(&self.path)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

impl FromStr for SnapshotInput {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| SourceError::InvalidInput {
            input: s.to_string(),
            message: message.to_string(),
        };

        let (category, path) = match s.split_once('=') {
            Some((category, path))
                if !category.is_empty() && !category.contains(['/', '\\', '.']) =>
            {
                (Some(category.trim().to_string()), path)
            }
            _ => (None, s),
        };

        if path.trim().is_empty() {
            return Err(invalid("missing snapshot path"));
        }

        Ok(Self {
            path: PathBuf::from(path.trim()),
            category,
        })
    }
}

/// Rows loaded from a set of snapshot inputs.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Rows in input order, then file order.
    pub rows: Vec<RawIncidentRow>,
    /// Number of files read.
    pub files: u64,
    /// Time spent reading.
    pub duration: Duration,
}

/// Parses one snapshot from any reader.
///
/// `category_override`, when given, replaces the category column for every
/// row.
///
/// # Errors
///
/// Returns an error if the CSV is malformed, has no header row, or lacks a
/// column for a required field.
pub fn read_snapshot<R: Read>(
    reader: R,
    source_file: &str,
    mapping: &ColumnMapping,
    delimiter: u8,
    category_override: Option<&str>,
) -> Result<Vec<RawIncidentRow>, SourceError> {
    let csv_error = |e: csv::Error| SourceError::Csv {
        file: source_file.to_string(),
        source: e,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(SourceError::Config {
            message: format!("{source_file}: CSV file contains no header row"),
        });
    }

    let columns = ResolvedColumns::resolve(&headers, mapping, source_file)?;

    let mut rows = Vec::new();
    let mut blank = 0_u64;

    for result in reader.records() {
        let record = result.map_err(csv_error)?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            blank += 1;
            continue;
        }

        let cell = |index: usize| record.get(index).unwrap_or("").trim().to_owned();
        let optional = |index: Option<usize>| index.map(cell).filter(|v| !v.is_empty());

        let category = category_override.map_or_else(
            || optional(columns.category).unwrap_or_default(),
            ToString::to_string,
        );

        rows.push(RawIncidentRow {
            incident_id: optional(Some(columns.incident_id)),
            year: cell(columns.year),
            week: cell(columns.week),
            status: cell(columns.status),
            owner: optional(columns.owner).unwrap_or_default(),
            category,
            sector: optional(columns.sector),
            opened_at: optional(columns.opened_at),
            source_file: source_file.to_string(),
        });
    }

    if blank > 0 {
        log::debug!("{source_file}: skipped {blank} blank rows");
    }
    log::info!("Read {} rows from {source_file}", rows.len());

    Ok(rows)
}

/// Opens and parses one snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_snapshot_file(
    path: &Path,
    mapping: &ColumnMapping,
    delimiter: u8,
    category_override: Option<&str>,
) -> Result<Vec<RawIncidentRow>, SourceError> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    read_snapshot(
        std::io::BufReader::new(file),
        &file_label(path),
        mapping,
        delimiter,
        category_override,
    )
}

/// Loads every input in order.
///
/// Input order is the order rows are seen in, so a later snapshot's row wins
/// when two rows share an incident and period.
///
/// # Errors
///
/// Returns the first error encountered; nothing is returned for the inputs
/// that were already read.
pub fn load_snapshots(
    inputs: &[SnapshotInput],
    config: &BacklogConfig,
    progress: &dyn ProgressCallback,
) -> Result<LoadResult, SourceError> {
    let start = Instant::now();
    let delimiter = config.delimiter_byte()?;

    progress.set_total(inputs.len() as u64);

    let mut rows = Vec::new();
    let mut files = 0_u64;

    for input in inputs {
        progress.set_message(input.source_file());

        let mut loaded = load_snapshot_file(
            &input.path,
            &config.columns,
            delimiter,
            input.category.as_deref(),
        )?;
        rows.append(&mut loaded);

        files += 1;
        progress.inc(1);
    }

    let duration = start.elapsed();
    progress.finish(format!("{} rows from {files} snapshots", rows.len()));
    log::info!(
        "Loaded {} rows from {files} snapshots, took {:.1}s",
        rows.len(),
        duration.as_secs_f64()
    );

    Ok(LoadResult {
        rows,
        files,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;

    fn mapping() -> ColumnMapping {
        BacklogConfig::embedded().unwrap().columns
    }

    const SNAPSHOT: &str = "\
Incidente,Ano,Semana,Status,Responsável,Aba,Setor,Backlog
INC-1,2025,3,Pendente,Ana,SPN,Infra,01/2025
INC-2,2025,3,Resolvido,Bruno,SPN,,
,,,,,,,
,2025,3,Pendente,Caio,SPN,Rede,
";

    #[test]
    fn reads_rows_and_skips_blank_lines() {
        let rows = read_snapshot(SNAPSHOT.as_bytes(), "Backlog_3.csv", &mapping(), b',', None).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].incident_id.as_deref(), Some("INC-1"));
        assert_eq!(rows[0].year, "2025");
        assert_eq!(rows[0].week, "3");
        assert_eq!(rows[0].status, "Pendente");
        assert_eq!(rows[0].owner, "Ana");
        assert_eq!(rows[0].category, "SPN");
        assert_eq!(rows[0].sector.as_deref(), Some("Infra"));
        assert_eq!(rows[0].opened_at.as_deref(), Some("01/2025"));
        assert_eq!(rows[0].source_file, "Backlog_3.csv");

        assert_eq!(rows[1].sector, None);
        assert_eq!(rows[1].opened_at, None);
        // Missing ids survive ingestion and are counted during normalization.
        assert_eq!(rows[2].incident_id, None);
    }

    #[test]
    fn category_override_wins() {
        let rows = read_snapshot(SNAPSHOT.as_bytes(), "x.csv", &mapping(), b',', Some("ITI")).unwrap();
        assert!(rows.iter().all(|r| r.category == "ITI"));
    }

    #[test]
    fn semicolon_delimiter_and_short_rows() {
        let data = "Ticket;Year;Week;State\nA-1;2024;52;Open\nA-2;2024\n";
        let rows = read_snapshot(data.as_bytes(), "x.csv", &mapping(), b';', None).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, "Open");
        assert_eq!(rows[0].owner, "");
        assert_eq!(rows[0].category, "");
        assert_eq!(rows[1].week, "");
        assert_eq!(rows[1].status, "");
    }

    #[test]
    fn missing_required_column_fails() {
        let data = "Incidente,Ano,Status\nINC-1,2025,Pendente\n";
        let err = read_snapshot(data.as_bytes(), "x.csv", &mapping(), b',', None).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn { field: "week", .. }));
    }

    #[test]
    fn empty_file_has_no_header() {
        let err = read_snapshot(&b""[..], "x.csv", &mapping(), b',', None).unwrap_err();
        assert!(matches!(err, SourceError::Config { .. }));
    }

    #[test]
    fn parses_snapshot_inputs() {
        let plain: SnapshotInput = "data/Backlog_22.csv".parse().unwrap();
        assert_eq!(plain.path, PathBuf::from("data/Backlog_22.csv"));
        assert_eq!(plain.category, None);
        assert_eq!(plain.source_file(), "Backlog_22.csv");

        let scoped: SnapshotInput = "SPN=data/Backlog_22.csv".parse().unwrap();
        assert_eq!(scoped.category.as_deref(), Some("SPN"));
        assert_eq!(scoped.path, PathBuf::from("data/Backlog_22.csv"));

        let with_equals: SnapshotInput = "./a=b.csv".parse().unwrap();
        assert_eq!(with_equals.category, None);
        assert_eq!(with_equals.path, PathBuf::from("./a=b.csv"));

        assert!("SPN=".parse::<SnapshotInput>().is_err());
        assert!("  ".parse::<SnapshotInput>().is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let inputs = vec![SnapshotInput {
            path: PathBuf::from("/nonexistent/backlog/Backlog_1.csv"),
            category: None,
        }];
        let config = BacklogConfig::embedded().unwrap();
        let err = load_snapshots(&inputs, &config, &NullProgress).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn no_inputs_loads_nothing() {
        let config = BacklogConfig::embedded().unwrap();
        let result = load_snapshots(&[], &config, &NullProgress).unwrap();
        assert!(result.rows.is_empty());
        assert_eq!(result.files, 0);
    }

    #[test]
    fn later_snapshot_wins_and_category_prefix_applies() {
        use backlog_incident_models::{IncidentKey, IncidentStatus};
        use backlog_runs::{GroupScope, normalize};

        let tmp = std::env::temp_dir().join("backlog_source_test_snapshots");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let first = tmp.join("Backlog_9a.csv");
        let second = tmp.join("Backlog_9b.csv");
        std::fs::write(
            &first,
            "Incidente,Ano,Semana,Status,Aba\nINC-1,2025,9,Pendente,SPN\nINC-2,2025,9,Pendente,SPN\n",
        )
        .unwrap();
        std::fs::write(&second, "Incidente,Ano,Semana,Status,Aba\nINC-1,2025,9,Resolvido,SPN\n").unwrap();

        let config = BacklogConfig::embedded().unwrap();
        let input = |path: &Path| SnapshotInput {
            path: path.to_path_buf(),
            category: None,
        };

        for (inputs, status, source) in [
            (
                [input(&first), input(&second)],
                IncidentStatus::Resolved,
                "Backlog_9b.csv",
            ),
            (
                [input(&second), input(&first)],
                IncidentStatus::Pending,
                "Backlog_9a.csv",
            ),
        ] {
            let loaded = load_snapshots(&inputs, &config, &NullProgress).unwrap();
            assert_eq!(loaded.files, 2);
            assert_eq!(loaded.rows.len(), 3);

            let normalized = normalize(loaded.rows, GroupScope::Incident);
            assert_eq!(normalized.report.duplicates_replaced, 1);
            let records = &normalized.incidents[&IncidentKey::unscoped("INC-1")];
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].status, status);
            assert_eq!(records[0].source_file, source);
        }

        let prefixed: SnapshotInput = format!("ITI={}", second.display()).parse().unwrap();
        let loaded = load_snapshots(&[input(&first), prefixed], &config, &NullProgress).unwrap();
        let normalized = normalize(loaded.rows, GroupScope::CategoryAndIncident);
        assert_eq!(normalized.report.duplicates_replaced, 0);
        let spn = &normalized.incidents[&IncidentKey::scoped("SPN", "INC-1")];
        let iti = &normalized.incidents[&IncidentKey::scoped("ITI", "INC-1")];
        assert_eq!(spn[0].status, IncidentStatus::Pending);
        assert_eq!(iti[0].status, IncidentStatus::Resolved);
        assert_eq!(iti[0].category, "ITI");

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
