//! Backlog configuration.
//!
//! The default configuration is baked into the binary at compile time via
//! [`include_str!`]. A different file can be supplied on the command line or
//! through the `BACKLOG_CONFIG` environment variable.

use std::path::Path;

use backlog_runs_models::RunPolicy;
use serde::{Deserialize, Serialize};

use crate::SourceError;
use crate::columns::ColumnMapping;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "BACKLOG_CONFIG";

/// Configuration embedded at compile time.
const DEFAULT_CONFIG: &str = include_str!("../config/backlog.toml");

/// Column mapping, CSV dialect and aging policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogConfig {
    /// Candidate header names per field.
    pub columns: ColumnMapping,
    /// CSV field delimiter. Defaults to `,`.
    #[serde(default)]
    pub delimiter: Option<char>,
    /// Group incidents by category and id rather than id alone.
    #[serde(default = "default_scope_by_category")]
    pub scope_by_category: bool,
    /// Aging policies evaluated when no ad-hoc filter is given.
    #[serde(default)]
    pub policies: Vec<RunPolicy>,
}

const fn default_scope_by_category() -> bool {
    true
}

impl BacklogConfig {
    /// Parses the configuration embedded in the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded TOML is invalid.
    pub fn embedded() -> Result<Self, SourceError> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Loads the configuration from `path`, then from the file named by
    /// [`CONFIG_ENV_VAR`], then from the embedded default.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, SourceError> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty());

        let path = match (path, from_env.as_deref()) {
            (Some(path), _) => path,
            (None, Some(env_path)) => Path::new(env_path),
            (None, None) => {
                log::debug!("Using embedded backlog configuration");
                return Self::embedded();
            }
        };

        log::info!("Loading backlog configuration from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        parse_config(&contents)
    }

    /// Delimiter as the single byte the CSV reader expects.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the delimiter is not ASCII.
    pub fn delimiter_byte(&self) -> Result<u8, SourceError> {
        let delimiter = self.delimiter.unwrap_or(',');
        u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| SourceError::Config {
                message: format!("delimiter '{delimiter}' is not a single ASCII character"),
            })
    }

    /// Looks up a policy by name, ignoring case.
    #[must_use]
    pub fn policy(&self, name: &str) -> Option<&RunPolicy> {
        self.policies
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Parses and validates a TOML configuration.
///
/// # Errors
///
/// Returns an error if the TOML is malformed, a required column list is
/// empty, or two policies share a name.
pub fn parse_config(toml_str: &str) -> Result<BacklogConfig, SourceError> {
    let config: BacklogConfig = toml::de::from_str(toml_str)?;

    for (field, candidates) in [
        ("incident_id", &config.columns.incident_id),
        ("year", &config.columns.year),
        ("week", &config.columns.week),
        ("status", &config.columns.status),
    ] {
        if candidates.is_empty() {
            return Err(SourceError::Config {
                message: format!("columns.{field} must list at least one header name"),
            });
        }
    }

    for (i, policy) in config.policies.iter().enumerate() {
        if config.policies[..i]
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&policy.name))
        {
            return Err(SourceError::Config {
                message: format!("duplicate policy name '{}'", policy.name),
            });
        }
    }

    Ok(config)
}
