//! Dataset runner: resolves config into jobs, generates, writes files.
//!
//! Jobs are independent: each owns its schedule and draws from its own RNG
//! stream, so the rayon and sequential paths produce identical output.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tradeseed_core::rng::RngHierarchy;
use tradeseed_core::schedule::PhaseSchedule;
use tradeseed_core::{GeneratedRun, TradeGenerator};

use crate::config::{ConfigError, SeedConfig};
use crate::export::{write_atomic, write_trades, ExportError};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
    #[error("manifest serialization: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Current schema version for the run manifest.
pub const SCHEMA_VERSION: u32 = 1;

pub const MANIFEST_FILE: &str = "manifest.json";

/// One dataset to generate.
#[derive(Debug, Clone)]
pub struct DatasetJob {
    pub archetype: String,
    pub schedule: PhaseSchedule,
    pub trades: usize,
    pub file_name: String,
    /// Occurrence of this archetype among earlier jobs; picks the RNG stream.
    pub iteration: u64,
}

#[derive(Debug, Clone)]
pub struct DatasetOutput {
    pub job: DatasetJob,
    pub sub_seed: u64,
    pub run: GeneratedRun,
}

/// Record of what a run produced, written next to the trade logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub seed: u64,
    pub anchor: NaiveDateTime,
    pub datasets: Vec<ManifestEntry>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub archetype: String,
    pub file: PathBuf,
    pub trades: usize,
    pub sub_seed: u64,
    pub profile_fingerprint: String,
    pub final_target: f64,
    pub final_profit: i64,
}

pub struct Runner {
    config: SeedConfig,
    anchor: NaiveDateTime,
    parallel: bool,
}

impl Runner {
    /// Validates `config`; `anchor` is used when the config does not pin one.
    pub fn new(config: SeedConfig, now: NaiveDateTime) -> Result<Self, RunError> {
        config.validate()?;
        let anchor = config.anchor_or(now);
        let parallel = config.parallel;
        Ok(Self {
            config,
            anchor,
            parallel,
        })
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    pub fn jobs(&self) -> Result<Vec<DatasetJob>, RunError> {
        let mut jobs: Vec<DatasetJob> = Vec::with_capacity(self.config.datasets.len());
        for dataset in &self.config.datasets {
            let schedule = self.config.resolve_schedule(&dataset.archetype)?;
            let iteration = jobs
                .iter()
                .filter(|j| j.archetype == dataset.archetype)
                .count() as u64;
            jobs.push(DatasetJob {
                archetype: dataset.archetype.clone(),
                trades: dataset.trades.unwrap_or(schedule.profile().default_trades),
                file_name: dataset.file_name(),
                schedule,
                iteration,
            });
        }
        Ok(jobs)
    }

    fn generate_one(&self, hierarchy: &RngHierarchy, job: &DatasetJob) -> DatasetOutput {
        let sub_seed = hierarchy.sub_seed(&job.archetype, job.iteration);
        let mut rng = hierarchy.rng_for(&job.archetype, job.iteration);
        let run = TradeGenerator::new(&job.schedule, self.anchor).generate(job.trades, &mut rng);
        info!(
            archetype = %job.archetype,
            trades = run.len(),
            final_profit = run.final_profit(),
            target = job.schedule.final_target(),
            "generated dataset"
        );
        DatasetOutput {
            job: job.clone(),
            sub_seed,
            run,
        }
    }

    /// Generate every dataset in config order.
    pub fn generate(&self) -> Result<Vec<DatasetOutput>, RunError> {
        let jobs = self.jobs()?;
        let hierarchy = RngHierarchy::new(self.config.seed);
        info!(
            seed = self.config.seed,
            anchor = %self.anchor,
            datasets = jobs.len(),
            parallel = self.parallel,
            "starting generation"
        );

        let outputs: Vec<DatasetOutput> = if self.parallel {
            jobs.par_iter()
                .map(|job| self.generate_one(&hierarchy, job))
                .collect()
        } else {
            jobs.iter()
                .map(|job| self.generate_one(&hierarchy, job))
                .collect()
        };
        Ok(outputs)
    }

    /// Write trade logs and the manifest under the configured output directory.
    pub fn write(&self, outputs: &[DatasetOutput]) -> Result<RunManifest, RunError> {
        let dir = &self.config.output_dir;
        let attempts = self.config.write_attempts;
        let mut datasets = Vec::with_capacity(outputs.len());

        for output in outputs {
            let path = dir.join(&output.job.file_name);
            write_trades(&path, &output.run.records, attempts)?;
            info!(path = %path.display(), trades = output.run.len(), "wrote trade log");
            datasets.push(ManifestEntry {
                archetype: output.job.archetype.clone(),
                file: PathBuf::from(&output.job.file_name),
                trades: output.run.len(),
                sub_seed: output.sub_seed,
                profile_fingerprint: output.job.schedule.profile().fingerprint(),
                final_target: output.job.schedule.final_target(),
                final_profit: output.run.final_profit(),
            });
        }

        let manifest = RunManifest {
            schema_version: SCHEMA_VERSION,
            seed: self.config.seed,
            anchor: self.anchor,
            datasets,
        };
        let json = serde_json::to_string_pretty(&manifest)?;
        write_atomic(&dir.join(MANIFEST_FILE), json.as_bytes(), attempts)?;
        Ok(manifest)
    }

    pub fn run(&self) -> Result<RunManifest, RunError> {
        let outputs = self.generate()?;
        self.write(&outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn small_config() -> SeedConfig {
        SeedConfig {
            datasets: vec![
                DatasetConfig {
                    archetype: "A".into(),
                    trades: Some(40),
                    file_name: None,
                },
                DatasetConfig {
                    archetype: "A".into(),
                    trades: Some(40),
                    file_name: Some("A2.csv".into()),
                },
                DatasetConfig {
                    archetype: "C".into(),
                    trades: None,
                    file_name: None,
                },
            ],
            ..SeedConfig::default()
        }
    }

    #[test]
    fn jobs_resolve_counts_and_iterations() {
        let runner = Runner::new(small_config(), now()).unwrap();
        let jobs = runner.jobs().unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].iteration, 0);
        assert_eq!(jobs[1].iteration, 1);
        assert_eq!(jobs[2].iteration, 0);
        assert_eq!(jobs[2].trades, 620);
        assert_eq!(jobs[2].file_name, "C.csv");
    }

    #[test]
    fn repeated_archetype_gets_distinct_stream() {
        let runner = Runner::new(small_config(), now()).unwrap();
        let outputs = runner.generate().unwrap();
        assert_ne!(outputs[0].sub_seed, outputs[1].sub_seed);
        assert_ne!(outputs[0].run.records, outputs[1].run.records);
    }

    #[test]
    fn parallel_matches_sequential() {
        let parallel = Runner::new(small_config(), now())
            .unwrap()
            .with_parallelism(true)
            .generate()
            .unwrap();
        let sequential = Runner::new(small_config(), now())
            .unwrap()
            .with_parallelism(false)
            .generate()
            .unwrap();
        assert_eq!(parallel.len(), sequential.len());
        for (p, s) in parallel.iter().zip(&sequential) {
            assert_eq!(p.job.file_name, s.job.file_name);
            assert_eq!(p.run, s.run);
        }
    }

    #[test]
    fn pinned_anchor_wins_over_now() {
        let mut config = small_config();
        let pinned = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        config.anchor = Some(pinned);
        let runner = Runner::new(config, now()).unwrap();
        assert_eq!(runner.anchor(), pinned);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = small_config();
        config.datasets[0].archetype = "nope".into();
        assert!(matches!(
            Runner::new(config, now()),
            Err(RunError::Config(ConfigError::UnknownArchetype(_)))
        ));
    }
}
