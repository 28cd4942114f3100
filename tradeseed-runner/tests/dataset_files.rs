//! Integration tests: generated datasets on disk.
//!
//! Runs the full pipeline into a temp directory and checks the files a
//! journal import would see: layout, round-trip, annotation, atomic writes.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use tradeseed_runner::annotate::{annotate_file, SETUP_LABELS};
use tradeseed_runner::config::{DatasetConfig, SeedConfig};
use tradeseed_runner::export::{
    parse_trades, read_trades, trades_to_tsv, write_atomic, write_atomic_with, ExportError,
    TRADE_COLUMNS,
};
use tradeseed_runner::metrics::DatasetSummary;
use tradeseed_runner::runner::{RunManifest, Runner, MANIFEST_FILE};

fn anchor() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 10, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn config_in(dir: &Path) -> SeedConfig {
    SeedConfig {
        seed: 2025,
        output_dir: dir.to_path_buf(),
        anchor: Some(anchor()),
        ..SeedConfig::default()
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────

#[test]
fn stock_run_writes_three_logs_and_manifest() {
    let tmp = TempDir::new().unwrap();
    let manifest = Runner::new(config_in(tmp.path()), anchor())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(manifest.datasets.len(), 3);
    for (entry, expected) in manifest.datasets.iter().zip([500, 380, 620]) {
        let path = tmp.path().join(&entry.file);
        let records = read_trades(&path).unwrap();
        assert_eq!(records.len(), expected);
        assert_eq!(entry.trades, expected);
        let summary = DatasetSummary::compute(&records);
        assert_eq!(summary.total_profit, entry.final_profit);
    }

    let text = fs::read_to_string(tmp.path().join(MANIFEST_FILE)).unwrap();
    let parsed: RunManifest = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, manifest);
    assert!(!tmp.path().join("A.csv.tmp").exists());
}

#[test]
fn same_seed_gives_byte_identical_files() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    Runner::new(config_in(first.path()), anchor()).unwrap().run().unwrap();
    Runner::new(config_in(second.path()), anchor())
        .unwrap()
        .with_parallelism(false)
        .run()
        .unwrap();

    for name in ["A.csv", "B.csv", "C.csv"] {
        let a = fs::read(first.path().join(name)).unwrap();
        let b = fs::read(second.path().join(name)).unwrap();
        assert_eq!(a, b, "{name} differs");
    }
}

#[test]
fn different_seed_gives_different_files() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let mut other = config_in(second.path());
    other.seed = 2026;
    Runner::new(config_in(first.path()), anchor()).unwrap().run().unwrap();
    Runner::new(other, anchor()).unwrap().run().unwrap();

    let a = fs::read(first.path().join("B.csv")).unwrap();
    let b = fs::read(second.path().join("B.csv")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn header_row_is_fixed() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_in(tmp.path());
    config.datasets = vec![DatasetConfig {
        archetype: "B".into(),
        trades: Some(3),
        file_name: None,
    }];
    Runner::new(config, anchor()).unwrap().run().unwrap();

    let text = fs::read_to_string(tmp.path().join("B.csv")).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, TRADE_COLUMNS.join("\t"));
    assert_eq!(text.lines().count(), 4);
}

#[test]
fn generated_records_survive_round_trip() {
    let runner = Runner::new(config_in(Path::new("unused")), anchor()).unwrap();
    for output in runner.generate().unwrap() {
        let text = trades_to_tsv(&output.run.records).unwrap();
        let parsed = parse_trades(&text).unwrap();
        assert_eq!(&parsed, &output.run.records);
    }
}

// ─── Annotation ──────────────────────────────────────────────────────

#[test]
fn annotate_file_fills_comments_in_place() {
    let tmp = TempDir::new().unwrap();
    let mut config = config_in(tmp.path());
    config.datasets = vec![DatasetConfig {
        archetype: "A".into(),
        trades: Some(500),
        file_name: None,
    }];
    Runner::new(config, anchor()).unwrap().run().unwrap();
    let path = tmp.path().join("A.csv");

    let dist = annotate_file(&path, 3).unwrap();
    assert_eq!(dist.len(), SETUP_LABELS.len());
    for label in SETUP_LABELS {
        let count = dist[label];
        assert!(count == 83 || count == 84, "{label}: {count}");
    }

    let records = read_trades(&path).unwrap();
    assert!(records.iter().all(|r| r.has_annotation()));
    assert_eq!(records[6].annotation, "Breakout");

    // second pass changes nothing
    let before = fs::read(&path).unwrap();
    annotate_file(&path, 3).unwrap();
    assert_eq!(before, fs::read(&path).unwrap());
}

#[test]
fn annotate_missing_file_errors() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        annotate_file(&tmp.path().join("missing.csv"), 1),
        Err(ExportError::Read { .. })
    ));
}

// ─── Atomic writes ───────────────────────────────────────────────────

#[test]
fn failed_attempts_are_retried_from_scratch() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("out.csv");
    let mut calls = 0;

    write_atomic_with(&path, 3, |tmp_path| {
        calls += 1;
        // every attempt must start without a leftover temp file
        assert!(!tmp_path.exists());
        if calls < 3 {
            fs::write(tmp_path, b"partial")?;
            return Err(io::Error::other("disk hiccup"));
        }
        fs::write(tmp_path, b"complete")
    })
    .unwrap();

    assert_eq!(calls, 3);
    assert_eq!(fs::read(&path).unwrap(), b"complete");
}

#[test]
fn leftover_temp_file_is_discarded_before_first_attempt() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("out.csv");
    let stale = tmp.path().join("out.csv.tmp");
    fs::write(&stale, b"STALE\n").unwrap();

    write_atomic_with(&path, 1, |tmp_path| {
        assert!(!tmp_path.exists());
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(tmp_path)?;
        file.write_all(b"fresh\n")
    })
    .unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "fresh\n");
    assert!(!stale.exists());
}

#[test]
fn exhausted_attempts_leave_target_untouched() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("out.csv");
    write_atomic(&path, b"original", 1).unwrap();

    let err = write_atomic_with(&path, 2, |tmp_path| {
        fs::write(tmp_path, b"garbage")?;
        Err(io::Error::other("always fails"))
    })
    .unwrap_err();

    assert!(matches!(err, ExportError::Write { attempts: 2, .. }));
    assert_eq!(fs::read(&path).unwrap(), b"original");
    assert!(!tmp.path().join("out.csv.tmp").exists());
}

#[test]
fn creates_missing_parent_directories() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("public/demo/A.csv");
    write_atomic(&path, b"x", 1).unwrap();
    assert!(path.exists());
}
