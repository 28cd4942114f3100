//! Backup plan emitter.
//!
//! Produces the ordered instructions for dumping the journal database to
//! JSON files: a timestamped destination directory, one full-table query per
//! small table, and a paginated query for the trades table. Nothing here
//! connects to a database.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;

pub const DEFAULT_TABLES: [&str; 8] = [
    "user_settings",
    "account_summary",
    "ai_coaching_jobs",
    "daily_notes",
    "ai_proposals",
    "account_transactions",
    "import_history",
    "trade_notes",
];

/// Directory-name format for backup snapshots.
pub const SNAPSHOT_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_tables")]
    pub tables: Vec<String>,
    #[serde(default = "default_large_table")]
    pub large_table: String,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from("backups")
}

fn default_tables() -> Vec<String> {
    DEFAULT_TABLES.iter().map(|t| t.to_string()).collect()
}

fn default_large_table() -> String {
    "trades".into()
}

fn default_order_by() -> String {
    "id".into()
}

fn default_page_size() -> u64 {
    100
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            tables: default_tables(),
            large_table: default_large_table(),
            order_by: default_order_by(),
            page_size: default_page_size(),
        }
    }
}

impl BackupConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::InvalidBackup("page_size must be at least 1"));
        }
        if self.large_table.trim().is_empty() {
            return Err(ConfigError::InvalidBackup("large_table must not be empty"));
        }
        if self.order_by.trim().is_empty() {
            return Err(ConfigError::InvalidBackup("order_by must not be empty"));
        }
        Ok(())
    }
}

/// Dump one table in a single query.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableDump {
    pub table: String,
    pub query: String,
    pub destination: PathBuf,
}

/// Dump a large table page by page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaginatedDump {
    pub table: String,
    pub order_by: String,
    pub page_size: u64,
    pub destination: PathBuf,
}

impl PaginatedDump {
    pub fn query(&self, offset: u64) -> String {
        format!(
            "SELECT * FROM {} ORDER BY {} LIMIT {} OFFSET {};",
            self.table, self.order_by, self.page_size, offset
        )
    }

    /// Queries covering `rows` rows. At least one page is always emitted.
    pub fn queries_for(&self, rows: u64) -> Vec<String> {
        let page = self.page_size.max(1);
        let pages = rows.div_ceil(page).max(1);
        (0..pages).map(|i| self.query(i * page)).collect()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BackupPlan {
    pub directory: PathBuf,
    pub tables: Vec<TableDump>,
    pub paginated: PaginatedDump,
}

impl BackupPlan {
    pub fn new(config: &BackupConfig, at: NaiveDateTime) -> Self {
        let directory = config.root.join(at.format(SNAPSHOT_FORMAT).to_string());
        let tables = config
            .tables
            .iter()
            .map(|table| TableDump {
                table: table.clone(),
                query: format!("SELECT * FROM {table};"),
                destination: directory.join(format!("{table}.json")),
            })
            .collect();
        let paginated = PaginatedDump {
            table: config.large_table.clone(),
            order_by: config.order_by.clone(),
            page_size: config.page_size,
            destination: directory.join(format!("{}.json", config.large_table)),
        };
        Self {
            directory,
            tables,
            paginated,
        }
    }
}

impl fmt::Display for BackupPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "1. Create backup directory: mkdir -p {}", self.directory.display())?;
        writeln!(f)?;
        for dump in &self.tables {
            writeln!(f, "2. Query: {}", dump.query)?;
            writeln!(f, "   Save to: {}", dump.destination.display())?;
            writeln!(f)?;
        }
        writeln!(f, "3. For {} table (large), use pagination:", self.paginated.table)?;
        writeln!(f, "   {}", self.paginated.query(0))?;
        writeln!(f, "   {}", self.paginated.query(self.paginated.page_size))?;
        writeln!(f, "   ...continue until all records are fetched")?;
        writeln!(f)?;
        write!(f, "Backup location: {}/", self.directory.display())
    }
}
