//! Setup-label annotation pass.
//!
//! Trades without a comment get a setup label assigned round-robin by
//! position; trades that already carry one keep it.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;
use tradeseed_core::domain::TradeRecord;

use crate::export::{read_trades, write_trades, ExportError};

pub const SETUP_LABELS: [&str; 6] = ["Breakout", "Pullback", "Reversal", "Trend", "Range", "Scalp"];

/// Annotation counts after a pass, keyed by annotation text.
pub type LabelDistribution = BTreeMap<String, usize>;

/// Fill empty annotations in place. Returns the distribution over all
/// records, pre-existing annotations included.
pub fn annotate(records: &mut [TradeRecord]) -> LabelDistribution {
    let mut distribution = LabelDistribution::new();
    for (i, record) in records.iter_mut().enumerate() {
        if !record.has_annotation() {
            record.annotation = SETUP_LABELS[i % SETUP_LABELS.len()].to_string();
        }
        *distribution.entry(record.annotation.clone()).or_default() += 1;
    }
    distribution
}

/// Read a trade log, annotate it, and replace the file atomically.
pub fn annotate_file(path: &Path, write_attempts: u32) -> Result<LabelDistribution, ExportError> {
    let mut records = read_trades(path)?;
    let distribution = annotate(&mut records);
    write_trades(path, &records, write_attempts)?;
    info!(
        path = %path.display(),
        trades = records.len(),
        labels = ?distribution,
        "annotated trade log"
    );
    Ok(distribution)
}
