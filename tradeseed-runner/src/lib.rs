//! tradeseed runner: dataset orchestration and file-level tooling.
//!
//! This crate builds on `tradeseed-core` to provide:
//! - TOML configuration for seeds, datasets and custom archetypes
//! - Parallel dataset generation with a JSON run manifest
//! - Tab-delimited trade-log export and import with atomic writes
//! - Setup-label annotation pass
//! - Database backup plans
//! - Dataset summaries

pub mod annotate;
pub mod backup;
pub mod config;
pub mod export;
pub mod metrics;
pub mod runner;

pub use annotate::{annotate, annotate_file, LabelDistribution, SETUP_LABELS};
pub use backup::{BackupConfig, BackupPlan};
pub use config::{ConfigError, DatasetConfig, SeedConfig};
pub use export::{parse_trades, read_trades, trades_to_tsv, write_trades, ExportError, TRADE_COLUMNS};
pub use metrics::DatasetSummary;
pub use runner::{DatasetOutput, RunError, RunManifest, Runner};
