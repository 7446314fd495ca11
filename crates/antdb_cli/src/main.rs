//! CSV import command-line front end.
//!
//! # Responsibility
//! - Parse arguments, read the phase CSV files, and hand rows to the core
//!   import engine.
//! - Persist the error log for operator review.
//!
//! All resolution and deduplication logic lives in `antdb_core`; this binary
//! only moves bytes in and out.

use antdb_core::db::open_db;
use antdb_core::{
    default_log_level, init_logging, ImportBatch, ImportBatchRunner, ImportReport, RawRow,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "antdb",
    about = "Import field-survey CSV data (species, research, records) into the survey database"
)]
struct Cli {
    /// Database file; created and migrated when missing.
    #[arg(long, default_value = "ant_research.db")]
    db: PathBuf,

    /// Directory holding species.csv / research.csv / records.csv.
    /// Missing files are skipped.
    #[arg(long, default_value = "./csv_data")]
    data: PathBuf,

    /// Absolute directory for rolling log files. No file logging when
    /// omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level override (trace|debug|info|warn|error).
    #[arg(long)]
    log_level: Option<String>,

    /// Destination for the per-row error log.
    #[arg(long, default_value = "import_errors.log")]
    errors_out: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&level, &log_dir.display().to_string()).map_err(anyhow::Error::msg)?;
    }

    let batch = ImportBatch {
        species: read_rows(&cli.data.join("species.csv"))?,
        research: read_rows(&cli.data.join("research.csv"))?,
        records: read_rows(&cli.data.join("records.csv"))?,
    };

    let mut conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;

    let report = match ImportBatchRunner::new(&mut conn).run(&batch) {
        Ok(report) => report,
        Err(aborted) => {
            // Surface whatever landed before the store failure.
            write_error_log(&cli.errors_out, &aborted.partial)?;
            bail!("{aborted}");
        }
    };

    info!(
        "event=cli_import module=cli status=ok success={} failure={}",
        report.success_count, report.failure_count
    );
    println!(
        "import finished: {} rows committed, {} rows failed",
        report.success_count, report.failure_count
    );

    if report.failure_count > 0 {
        write_error_log(&cli.errors_out, &report)?;
        println!("errors logged to {}", cli.errors_out.display());
    }

    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open `{}`", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of `{}`", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("failed row {line} of `{}`", path.display()))?;
        rows.push(RawRow::from_pairs(headers.iter().zip(record.iter())));
    }
    Ok(rows)
}

fn write_error_log(path: &Path, report: &ImportReport) -> Result<()> {
    if report.failures.is_empty() {
        return Ok(());
    }

    let mut lines = String::new();
    for failure in &report.failures {
        let _ = writeln!(
            lines,
            "{} row {}: {}",
            failure.phase, failure.row_index, failure.message
        );
    }
    fs::write(path, lines)
        .with_context(|| format!("failed to write error log `{}`", path.display()))
}
