//! tradeseed CLI: generate, annotate and inspect demo trade logs.
//!
//! Commands:
//! - `generate`: write the archetype datasets from a TOML config or flags
//! - `annotate`: fill empty comments with setup labels, in place
//! - `summarize`: win/loss counts, P&L breakdown, drawdown, per-pair and per-month counts
//! - `backup-plan`: print the queries for a JSON dump of the journal database
//! - `schedule`: show an archetype's phase table

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use tradeseed_core::schedule::{Archetype, PhaseSchedule};
use tradeseed_runner::annotate::annotate_file;
use tradeseed_runner::backup::BackupPlan;
use tradeseed_runner::config::{DatasetConfig, SeedConfig};
use tradeseed_runner::export::read_trades;
use tradeseed_runner::metrics::DatasetSummary;
use tradeseed_runner::runner::Runner;

#[derive(Parser)]
#[command(
    name = "tradeseed",
    about = "tradeseed: synthetic trade journals with shaped equity curves"
)]
struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate trade logs for the configured archetypes.
    Generate {
        /// Path to a TOML config file. Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Master seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Output directory. Defaults to ./public/demo.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Generation time, "YYYY-MM-DD HH:MM:SS". Defaults to now.
        #[arg(long)]
        anchor: Option<String>,

        /// Archetypes to generate (A, B, C or a [[profile]] name). Repeatable.
        #[arg(long = "archetype")]
        archetypes: Vec<String>,

        /// Trade count for every selected archetype.
        #[arg(long)]
        trades: Option<usize>,

        /// Run datasets one after another instead of on the thread pool.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Fill empty comments with setup labels after writing.
        #[arg(long, default_value_t = false)]
        annotate: bool,
    },
    /// Fill empty comment fields with setup labels.
    Annotate {
        /// Trade log files to rewrite in place.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Attempts per file write before giving up.
        #[arg(long, default_value_t = 3)]
        write_attempts: u32,
    },
    /// Print statistics for trade log files.
    Summarize {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Emit JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print backup instructions for the journal database.
    BackupPlan {
        /// TOML config whose [backup] section to use.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Snapshot time, "YYYY-MM-DD HH:MM:SS". Defaults to now.
        #[arg(long)]
        at: Option<String>,

        /// Emit JSON instead of text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show an archetype's phase schedule.
    Schedule {
        /// Built-in archetype (A, B, C).
        #[arg(conflicts_with = "profile")]
        archetype: Option<String>,

        /// Profile TOML file to validate and show instead.
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Print the profile as TOML (a starting point for custom archetypes).
        #[arg(long, default_value_t = false)]
        toml: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Generate {
            config,
            seed,
            output_dir,
            anchor,
            archetypes,
            trades,
            sequential,
            annotate,
        } => run_generate(GenerateArgs {
            config,
            seed,
            output_dir,
            anchor,
            archetypes,
            trades,
            sequential,
            annotate,
        }),
        Commands::Annotate {
            files,
            write_attempts,
        } => run_annotate(&files, write_attempts),
        Commands::Summarize { files, json } => run_summarize(&files, json),
        Commands::BackupPlan { config, at, json } => run_backup_plan(config, at, json),
        Commands::Schedule {
            archetype,
            profile,
            toml,
        } => run_schedule(archetype, profile, toml),
    }
}

struct GenerateArgs {
    config: Option<PathBuf>,
    seed: Option<u64>,
    output_dir: Option<PathBuf>,
    anchor: Option<String>,
    archetypes: Vec<String>,
    trades: Option<usize>,
    sequential: bool,
    annotate: bool,
}

fn parse_time(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .with_context(|| format!("invalid time '{s}', expected YYYY-MM-DD HH:MM:SS"))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn load_config(path: Option<&PathBuf>) -> Result<SeedConfig> {
    match path {
        Some(path) => SeedConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SeedConfig::default()),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(anchor) = args.anchor.as_deref() {
        config.anchor = Some(parse_time(anchor)?);
    }
    if !args.archetypes.is_empty() {
        config.datasets = args
            .archetypes
            .iter()
            .map(|name| DatasetConfig {
                archetype: name.clone(),
                trades: None,
                file_name: None,
            })
            .collect();
    }
    if let Some(trades) = args.trades {
        for dataset in &mut config.datasets {
            dataset.trades = Some(trades);
        }
    }
    if args.sequential {
        config.parallel = false;
    }

    let runner = Runner::new(config, now()).context("invalid generation config")?;
    let outputs = runner.generate()?;
    let manifest = runner.write(&outputs)?;

    println!(
        "Generated {} dataset(s) in {} (seed {}, anchor {})",
        manifest.datasets.len(),
        runner.config().output_dir.display(),
        manifest.seed,
        manifest.anchor
    );
    for output in &outputs {
        let summary = DatasetSummary::compute(&output.run.records);
        println!(
            "  {:<10} {:>4} trades  win rate {:>5.1}%  final {:>12}  (target {:.0})",
            output.job.file_name,
            summary.trade_count,
            summary.win_rate * 100.0,
            summary.final_cumulative,
            output.job.schedule.final_target()
        );
    }

    if args.annotate {
        let attempts = runner.config().write_attempts;
        for entry in &manifest.datasets {
            let path = runner.config().output_dir.join(&entry.file);
            annotate_file(&path, attempts)
                .with_context(|| format!("annotating {}", path.display()))?;
        }
        println!("Annotated {} file(s) with setup labels", manifest.datasets.len());
    }
    Ok(())
}

fn run_annotate(files: &[PathBuf], write_attempts: u32) -> Result<()> {
    for path in files {
        let distribution = annotate_file(path, write_attempts)
            .with_context(|| format!("annotating {}", path.display()))?;
        let total: usize = distribution.values().sum();
        println!("Updated {} ({total} trades)", path.display());
        println!("Setup distribution:");
        for (label, count) in &distribution {
            println!("  {label}: {count}");
        }
    }
    Ok(())
}

fn run_summarize(files: &[PathBuf], json: bool) -> Result<()> {
    let mut summaries = serde_json::Map::new();
    for path in files {
        let records =
            read_trades(path).with_context(|| format!("reading {}", path.display()))?;
        let summary = DatasetSummary::compute(&records);
        info!(path = %path.display(), trades = summary.trade_count, "summarized");
        if json {
            summaries.insert(path.display().to_string(), serde_json::to_value(&summary)?);
        } else {
            println!("{}:", path.display());
            println!("{summary}");
            println!();
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    }
    Ok(())
}

fn run_backup_plan(config: Option<PathBuf>, at: Option<String>, json: bool) -> Result<()> {
    let config = load_config(config.as_ref())?;
    let at = match at.as_deref() {
        Some(s) => parse_time(s)?,
        None => now(),
    };
    let plan = BackupPlan::new(&config.backup, at);
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{plan}");
    }
    Ok(())
}

fn run_schedule(archetype: Option<String>, profile: Option<PathBuf>, toml: bool) -> Result<()> {
    let schedule = match (archetype, profile) {
        (_, Some(path)) => PhaseSchedule::from_file(&path)
            .with_context(|| format!("loading profile {}", path.display()))?,
        (Some(name), None) => {
            let archetype: Archetype = name.parse()?;
            archetype.schedule()?
        }
        (None, None) => bail!("give an archetype (A, B, C) or --profile"),
    };

    if toml {
        print!("{}", schedule.profile().to_toml()?);
        return Ok(());
    }

    let profile = schedule.profile();
    println!("Archetype {} — {}", profile.name, profile.description);
    println!(
        "  default trades {}, SL/TP offsets {}/{} (R:R {:.2})",
        profile.default_trades,
        profile.risk_reward.stop_offset,
        profile.risk_reward.take_offset,
        profile.risk_reward.ratio()
    );
    println!(
        "  {:<18} {:>11} {:>14} {:>7} {:>11} {:>11}",
        "phase", "range", "target", "win p", "large win", "large loss"
    );
    for phase in schedule.phases() {
        let large = |m: Option<tradeseed_core::schedule::LargeMove>| {
            m.map(|m| format!("{:.2}", m.probability))
                .unwrap_or_else(|| "-".into())
        };
        println!(
            "  {:<18} {:>4.2}-{:<6.2} {:>14.0} {:>7.2} {:>11} {:>11}",
            phase.label,
            phase.start,
            phase.end,
            phase.target,
            phase.win_probability,
            large(phase.large_win),
            large(phase.large_loss)
        );
    }
    println!(
        "  expected win rate {:.1}%, target span {:.0}, fingerprint {}",
        schedule.expected_win_rate(profile.default_trades) * 100.0,
        schedule.target_span(),
        &profile.fingerprint()[..12]
    );
    Ok(())
}
