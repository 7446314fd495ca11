//! Three-phase batch import orchestration.
//!
//! # Responsibility
//! - Run the species → research → records phases strictly in order.
//! - Commit each input row as one atomic transaction.
//! - Convert domain errors into error-log entries and keep going.
//!
//! # Invariants
//! - Row *i* commits before row *i+1* starts, so later rows read earlier
//!   rows' dimension/site writes.
//! - Store errors abort the run; the partial report survives.
//! - Cancellation is only observed between rows; a started row always
//!   commits or rolls back.

use crate::import::report::{BatchAborted, ImportError, ImportPhase, ImportReport};
use crate::import::row::{parse_float, parse_int, parse_survey_date, split_synonyms, RawRow};
use crate::model::research::NewResearch;
use crate::model::species::{NewSpecies, SpeciesAttributes};
use crate::model::survey::{NewSite, OccurrenceKey, SiteKey};
use crate::model::ValidationError;
use crate::normalize::normalize;
use crate::repo::lookup_repo::{LookupRepository, LookupTable, SqliteLookupRepository};
use crate::repo::occurrence_repo::{OccurrenceRepository, SqliteOccurrenceRepository};
use crate::repo::research_repo::{ResearchRepository, SqliteResearchRepository};
use crate::repo::site_repo::{SiteRepository, SqliteSiteRepository};
use crate::repo::species_repo::{SpeciesRepository, SqliteSpeciesRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Abundance assumed when a record row leaves the cell blank.
pub const DEFAULT_ABUNDANCE: i64 = 1;
/// Count unit assumed when a record row leaves the cell blank.
pub const DEFAULT_UNIT: &str = "worker";
/// Sentinel method label for record rows without an explicit method.
pub const DEFAULT_METHOD: &str = "unspecified";

/// Input rows for one run, grouped by phase.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub species: Vec<RawRow>,
    pub research: Vec<RawRow>,
    pub records: Vec<RawRow>,
}

/// Per-row outcome inside a phase; splits recoverable domain errors from
/// run-fatal store errors.
enum RowError {
    Domain(ImportError),
    Fatal(RepoError),
}

impl From<RepoError> for RowError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Domain(ImportError::Validation(err)),
            fatal => Self::Fatal(fatal),
        }
    }
}

impl From<ValidationError> for RowError {
    fn from(value: ValidationError) -> Self {
        Self::Domain(ImportError::Validation(value))
    }
}

enum PhaseOutcome {
    Completed,
    Cancelled,
}

/// Orchestrates one import run over an exclusively owned connection.
pub struct ImportBatchRunner<'conn> {
    conn: &'conn mut Connection,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'conn> ImportBatchRunner<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn, cancel: None }
    }

    /// Installs a cooperative cancellation flag, checked before each row.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Runs all three phases in dependency order.
    ///
    /// Returns the full report on completion (row-local failures included),
    /// or `BatchAborted` with the partial report when the store itself fails.
    pub fn run(&mut self, batch: &ImportBatch) -> Result<ImportReport, BatchAborted> {
        let started_at = Instant::now();
        info!(
            "event=import_run module=import status=start species_rows={} research_rows={} record_rows={}",
            batch.species.len(),
            batch.research.len(),
            batch.records.len()
        );

        let mut report = ImportReport::default();
        let phases = [
            (ImportPhase::Species, &batch.species),
            (ImportPhase::Research, &batch.research),
            (ImportPhase::Records, &batch.records),
        ];

        for (phase, rows) in phases {
            match self.run_phase(phase, rows, &mut report) {
                Ok(PhaseOutcome::Completed) => {}
                Ok(PhaseOutcome::Cancelled) => {
                    warn!(
                        "event=import_run module=import status=cancelled duration_ms={}",
                        started_at.elapsed().as_millis()
                    );
                    return Ok(report);
                }
                Err(error) => {
                    return Err(BatchAborted {
                        error,
                        partial: report,
                    });
                }
            }
        }

        info!(
            "event=import_run module=import status=ok success={} failure={} duration_ms={}",
            report.success_count,
            report.failure_count,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn run_phase(
        &mut self,
        phase: ImportPhase,
        rows: &[RawRow],
        report: &mut ImportReport,
    ) -> Result<PhaseOutcome, RepoError> {
        info!(
            "event=import_phase module=import status=start phase={phase} rows={}",
            rows.len()
        );

        for (row_index, row) in rows.iter().enumerate() {
            if self.is_cancelled() {
                return Ok(PhaseOutcome::Cancelled);
            }

            let tx = self.conn.transaction()?;
            match import_row(&tx, phase, row) {
                Ok(()) => {
                    tx.commit()?;
                    report.record_success();
                }
                Err(RowError::Domain(error)) => {
                    tx.rollback()?;
                    warn!(
                        "event=import_row module=import status=error phase={phase} row_index={row_index} error={error}"
                    );
                    report.record_failure(phase, row_index, error.to_string(), row.clone());
                }
                Err(RowError::Fatal(error)) => {
                    let _ = tx.rollback();
                    return Err(error);
                }
            }
        }

        info!("event=import_phase module=import status=ok phase={phase}");
        Ok(PhaseOutcome::Completed)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

fn import_row(conn: &Connection, phase: ImportPhase, row: &RawRow) -> Result<(), RowError> {
    match phase {
        ImportPhase::Species => import_species_row(conn, row),
        ImportPhase::Research => import_research_row(conn, row),
        ImportPhase::Records => import_record_row(conn, row),
    }
}

fn import_species_row(conn: &Connection, row: &RawRow) -> Result<(), RowError> {
    let scientific_name = row.required("scientific_name")?;
    let japanese_name = row.required("japanese_name")?;

    let attributes = SpeciesAttributes {
        subfamily: row.get("subfamily").map(str::to_string),
        body_len_mm: row
            .get("body_len_mm")
            .map(|value| parse_float("body_len_mm", value))
            .transpose()?,
        red_list: row.get("red_list").map(str::to_string),
    };
    let synonyms = row.get("synonyms").map(split_synonyms).unwrap_or_default();

    let species = NewSpecies {
        scientific_name: scientific_name.to_string(),
        japanese_name: japanese_name.to_string(),
        attributes,
        synonyms,
    };
    SqliteSpeciesRepository::new(conn).register(&species)?;
    Ok(())
}

fn import_research_row(conn: &Connection, row: &RawRow) -> Result<(), RowError> {
    let research = NewResearch {
        title: row.required("title")?.to_string(),
        author: row.required("author")?.to_string(),
        year: parse_int("year", row.required("year")?)?,
        doi: row.get("doi").map(str::to_string),
        file_path: row.get("file_path").map(str::to_string),
    };
    SqliteResearchRepository::new(conn).create(&research)?;
    Ok(())
}

fn import_record_row(conn: &Connection, row: &RawRow) -> Result<(), RowError> {
    let research_title = row.required("research_title")?;
    let site_name = row.required("site_name")?;
    let species_label = row.required("species_name")?;

    let research_id = SqliteResearchRepository::new(conn)
        .locate(research_title)?
        .ok_or_else(|| {
            RowError::Domain(ImportError::UnresolvedReference(research_title.to_string()))
        })?;

    let lookups = SqliteLookupRepository::new(conn);
    let env_type_id = row
        .get("environment")
        .map(|name| lookups.resolve_or_create(LookupTable::EnvironmentTypes, name))
        .transpose()?;
    let method_label = row.get("method").unwrap_or(DEFAULT_METHOD);
    let method_id = Some(lookups.resolve_or_create(LookupTable::Methods, method_label)?);

    let survey_date = row.get("survey_date").map(parse_survey_date).transpose()?;
    let latitude = parse_coordinate(row, "latitude", 90.0)?;
    let longitude = parse_coordinate(row, "longitude", 180.0)?;
    let elevation_m = row
        .get("elevation_m")
        .map(|value| parse_int("elevation_m", value))
        .transpose()?;

    let site_id = SqliteSiteRepository::new(conn).upsert(&NewSite {
        key: SiteKey {
            research_id,
            site_name: site_name.to_string(),
            survey_date,
            latitude,
            longitude,
        },
        env_type_id,
        elevation_m,
    })?;

    let species_id = SqliteSpeciesRepository::new(conn)
        .resolve(species_label)?
        .ok_or_else(|| {
            RowError::Domain(ImportError::UnresolvedSpecies(species_label.to_string()))
        })?;

    let abundance = row
        .get("abundance")
        .map(|value| parse_int("abundance", value))
        .transpose()?
        .unwrap_or(DEFAULT_ABUNDANCE);
    let unit = normalize(row.get("unit").unwrap_or(DEFAULT_UNIT));

    SqliteOccurrenceRepository::new(conn).add_or_merge(
        &OccurrenceKey {
            site_id,
            species_id,
            method_id,
            unit,
        },
        abundance,
    )?;
    Ok(())
}

fn parse_coordinate(
    row: &RawRow,
    field: &'static str,
    bound: f64,
) -> Result<Option<f64>, RowError> {
    let Some(value) = row.get(field) else {
        return Ok(None);
    };
    let parsed = parse_float(field, value)?;
    if !parsed.is_finite() || parsed.abs() > bound {
        return Err(ValidationError::InvalidNumber {
            field,
            value: value.to_string(),
        }
        .into());
    }
    Ok(Some(parsed))
}
