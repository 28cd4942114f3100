//! Tab-delimited trade logs, the layout broker statements are imported from.
//!
//! One header row, then one row per trade, columns in [`TRADE_COLUMNS`]
//! order. Prices are written at the instrument's precision, size with two
//! decimals, cash amounts with one. Files are replaced atomically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{debug, warn};
use tradeseed_core::domain::{Direction, Instrument, Ticket, TradeRecord};

pub const TRADE_COLUMNS: [&str; 14] = [
    "Ticket",
    "Item",
    "Type",
    "Size",
    "Open Time",
    "Open Price",
    "Close Time",
    "Close Price",
    "S/L",
    "T/P",
    "Commission",
    "Swap",
    "Profit",
    "Comment",
];

pub const TIME_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("unexpected header: expected {expected:?}, found {found:?}")]
    Header {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column '{column}': cannot parse '{value}'")]
    Field {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("write {path} failed after {attempts} attempt(s): {source}")]
    Write {
        path: PathBuf,
        attempts: u32,
        source: io::Error,
    },
}

// ─── Serialize ──────────────────────────────────────────────────────

fn tsv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(vec![])
}

fn format_price(instrument: &Instrument, price: f64) -> String {
    format!("{:.*}", instrument.price_decimals() as usize, price)
}

pub fn trades_to_tsv(records: &[TradeRecord]) -> Result<String, ExportError> {
    let mut wtr = tsv_writer();
    wtr.write_record(TRADE_COLUMNS)?;

    for t in records {
        let row: [&str; 14] = [
            &t.ticket.to_string(),
            t.instrument.symbol(),
            t.direction.as_str(),
            &format!("{:.2}", t.size),
            &t.open_time.format(TIME_FORMAT).to_string(),
            &format_price(&t.instrument, t.open_price),
            &t.close_time.format(TIME_FORMAT).to_string(),
            &format_price(&t.instrument, t.close_price),
            &format_price(&t.instrument, t.stop_loss),
            &format_price(&t.instrument, t.take_profit),
            &format!("{:.1}", t.commission),
            &format!("{:.1}", t.swap),
            &format!("{:.1}", t.profit as f64),
            &t.annotation,
        ];
        wtr.write_record(row)?;
    }

    let data = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

// ─── Parse ──────────────────────────────────────────────────────────

struct Row<'a> {
    number: usize,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn raw(&self, index: usize) -> &str {
        self.record.get(index).unwrap_or("")
    }

    fn parse<T: std::str::FromStr>(&self, index: usize) -> Result<T, ExportError> {
        let value = self.raw(index);
        value.trim().parse().map_err(|_| self.error(index))
    }

    fn time(&self, index: usize) -> Result<NaiveDateTime, ExportError> {
        NaiveDateTime::parse_from_str(self.raw(index).trim(), TIME_FORMAT)
            .map_err(|_| self.error(index))
    }

    fn error(&self, index: usize) -> ExportError {
        ExportError::Field {
            row: self.number,
            column: TRADE_COLUMNS[index],
            value: self.raw(index).to_string(),
        }
    }
}

pub fn parse_trades(text: &str) -> Result<Vec<TradeRecord>, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let header = rdr.headers()?;
    if header.iter().ne(TRADE_COLUMNS) {
        return Err(ExportError::Header {
            expected: TRADE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: header.iter().map(str::to_string).collect(),
        });
    }

    let mut records = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        // header is row 1
        let number = i + 2;
        if record.len() != TRADE_COLUMNS.len() {
            return Err(ExportError::ColumnCount {
                row: number,
                expected: TRADE_COLUMNS.len(),
                found: record.len(),
            });
        }
        let row = Row {
            number,
            record: &record,
        };

        let instrument = Instrument::new(row.raw(1).trim());
        let price = |index: usize| -> Result<f64, ExportError> {
            Ok(instrument.round_price(row.parse::<f64>(index)?))
        };
        let direction: Direction = row.parse(2)?;
        let profit: f64 = row.parse(12)?;

        records.push(TradeRecord {
            ticket: Ticket(row.parse(0)?),
            direction,
            size: row.parse(3)?,
            open_time: row.time(4)?,
            open_price: price(5)?,
            close_time: row.time(6)?,
            close_price: price(7)?,
            stop_loss: price(8)?,
            take_profit: price(9)?,
            commission: row.parse(10)?,
            swap: row.parse(11)?,
            profit: profit.round() as i64,
            annotation: row.raw(13).to_string(),
            instrument,
        });
    }
    Ok(records)
}

// ─── Files ──────────────────────────────────────────────────────────

pub fn read_trades(path: &Path) -> Result<Vec<TradeRecord>, ExportError> {
    let text = fs::read_to_string(path).map_err(|source| ExportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trades(&text)
}

pub fn write_trades(path: &Path, records: &[TradeRecord], attempts: u32) -> Result<(), ExportError> {
    let text = trades_to_tsv(records)?;
    write_atomic(path, text.as_bytes(), attempts)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Replace `path` with `contents` via a temp file and rename.
pub fn write_atomic(path: &Path, contents: &[u8], attempts: u32) -> Result<(), ExportError> {
    write_atomic_with(path, attempts, |tmp| fs::write(tmp, contents))
}

/// Like [`write_atomic`], with the temp-file write supplied by the caller.
///
/// Each attempt first removes any `{path}.tmp` left behind, including one from
/// an earlier process, so writers always start from an empty temp file. A
/// failed attempt removes its temp file; the target is never left partial.
pub fn write_atomic_with<F>(path: &Path, attempts: u32, mut write_tmp: F) -> Result<(), ExportError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    let attempts = attempts.max(1);
    let tmp = temp_path(path);
    let mut last_error = None;

    for attempt in 1..=attempts {
        let result = (|| {
            match fs::remove_file(&tmp) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
                _ => {}
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            write_tmp(&tmp)?;
            fs::rename(&tmp, path)
        })();

        match result {
            Ok(()) => {
                debug!(path = %path.display(), attempt, "wrote file");
                return Ok(());
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                warn!(path = %path.display(), attempt, attempts, error = %e, "write failed");
                last_error = Some(e);
            }
        }
    }

    Err(ExportError::Write {
        path: path.to_path_buf(),
        attempts,
        source: last_error.unwrap_or_else(|| io::Error::other("no write attempted")),
    })
}
