//! Explicit run configuration.
//!
//! A [`Config`] is built once in `main` (file, then CLI overrides) and passed
//! by reference to each pipeline. Nothing reads settings from globals.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{EtlError, Result};

const DEFAULT_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub sources: SourceConfig,
    pub output: OutputConfig,
    pub pipeline: PipelineConfig,
}

/// Where the SQLite database lives
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub athlete_events: PathBuf,
    pub noc_regions: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub results_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Rows per insert transaction
    pub batch_size: usize,
    /// Medal value for non-medal participations written by `load`
    pub load_missing_medal: MissingMedal,
    /// Medal value for non-medal participations written by `clean`
    pub clean_missing_medal: MissingMedal,
}

/// How a participation without a medal is stored
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MissingMedal {
    /// SQL NULL
    Null,
    /// The literal "No Medal"
    NoMedal,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::in_dir(Path::new("data"))
    }
}

impl SourceConfig {
    /// Standard file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            athlete_events: dir.join("athlete_events.csv"),
            noc_regions: dir.join("noc_regions.csv"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("analysis_results"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            load_missing_medal: MissingMedal::Null,
            clean_missing_medal: MissingMedal::NoMedal,
        }
    }
}

impl Config {
    /// Parse a TOML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EtlError::Config(format!("cannot read {:?}: {}", path, e)))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| EtlError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.batch_size == 0 {
            return Err(EtlError::Config("pipeline.batch_size must be > 0".into()));
        }
        Ok(())
    }
}

/// Database file in the platform data directory, or `olympics.db` in the
/// working directory if none can be determined
fn default_database_path() -> PathBuf {
    ProjectDirs::from("", "", "olympics-etl")
        .map(|dirs| dirs.data_dir().join("olympics.db"))
        .unwrap_or_else(|| PathBuf::from("olympics.db"))
}
