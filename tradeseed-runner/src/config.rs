//! Serializable generation configuration.
//!
//! A `SeedConfig` names the datasets to produce, the master seed they are
//! derived from, and where the files go. It loads from TOML; every field
//! has a default, so an empty file reproduces the stock A/B/C run.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tradeseed_core::schedule::{Archetype, ArchetypeProfile, PhaseSchedule, ScheduleError};

use crate::backup::BackupConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown archetype '{0}': not a built-in and no [[profile]] with that name")]
    UnknownArchetype(String),

    #[error("duplicate dataset file name '{0}'")]
    DuplicateFileName(String),

    #[error("write_attempts must be at least 1")]
    ZeroWriteAttempts,

    #[error("invalid [backup] section: {0}")]
    InvalidBackup(&'static str),

    #[error("profile '{name}': {source}")]
    InvalidProfile {
        name: String,
        source: ScheduleError,
    },
}

/// One output file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetConfig {
    /// Built-in archetype (`A`, `B`, `C`) or the name of a `[[profile]]`.
    pub archetype: String,

    /// Trade count; defaults to the profile's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trades: Option<usize>,

    /// File name under `output_dir`; defaults to `{archetype}.csv`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl DatasetConfig {
    pub fn builtin(archetype: Archetype) -> Self {
        Self {
            archetype: archetype.label().to_string(),
            trades: None,
            file_name: None,
        }
    }

    pub fn file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("{}.csv", self.archetype))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Generation time the history window is measured back from.
    /// Defaults to the current local time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<NaiveDateTime>,

    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,

    /// Run datasets on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    #[serde(default = "default_datasets", rename = "dataset")]
    pub datasets: Vec<DatasetConfig>,

    #[serde(default, rename = "profile", skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<ArchetypeProfile>,

    #[serde(default)]
    pub backup: BackupConfig,
}

fn default_seed() -> u64 {
    42
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("public/demo")
}

fn default_write_attempts() -> u32 {
    3
}

fn default_parallel() -> bool {
    true
}

fn default_datasets() -> Vec<DatasetConfig> {
    Archetype::ALL.into_iter().map(DatasetConfig::builtin).collect()
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            output_dir: default_output_dir(),
            anchor: None,
            write_attempts: default_write_attempts(),
            parallel: default_parallel(),
            datasets: default_datasets(),
            profiles: Vec::new(),
            backup: BackupConfig::default(),
        }
    }
}

impl SeedConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve every dataset's archetype, reject duplicate file names and
    /// check the backup section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_attempts == 0 {
            return Err(ConfigError::ZeroWriteAttempts);
        }
        self.backup.validate()?;
        let mut seen = std::collections::HashSet::new();
        for dataset in &self.datasets {
            self.resolve_schedule(&dataset.archetype)?;
            let name = dataset.file_name();
            if !seen.insert(name.clone()) {
                return Err(ConfigError::DuplicateFileName(name));
            }
        }
        Ok(())
    }

    /// Custom profiles shadow built-ins with the same name.
    pub fn resolve_schedule(&self, name: &str) -> Result<PhaseSchedule, ConfigError> {
        if let Some(profile) = self.profiles.iter().find(|p| p.name == name) {
            return PhaseSchedule::new(profile.clone()).map_err(|source| {
                ConfigError::InvalidProfile {
                    name: name.to_string(),
                    source,
                }
            });
        }
        let archetype: Archetype = name
            .parse()
            .map_err(|_| ConfigError::UnknownArchetype(name.to_string()))?;
        archetype
            .schedule()
            .map_err(|source| ConfigError::InvalidProfile {
                name: name.to_string(),
                source,
            })
    }

    /// Anchor truncated to whole seconds, falling back to `now`.
    pub fn anchor_or(&self, now: NaiveDateTime) -> NaiveDateTime {
        use chrono::SubsecRound;
        self.anchor.unwrap_or(now).trunc_subsecs(0)
    }
}
