//! Import error taxonomy, per-row failure entries and the batch report.
//!
//! # Responsibility
//! - Classify row-local domain errors separately from fatal store errors.
//! - Accumulate the error log handed back to the caller.
//!
//! # Invariants
//! - `success_count + failure_count` equals the number of rows processed.
//! - A failure entry always keeps the raw input row intact.

use crate::import::row::RawRow;
use crate::model::ValidationError;
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// The three ordered import phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    Species,
    Research,
    Records,
}

impl Display for ImportPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Species => "species",
            Self::Research => "research",
            Self::Records => "records",
        };
        write!(f, "{name}")
    }
}

/// Row-local domain error; logged and skipped, never batch-fatal.
#[derive(Debug)]
pub enum ImportError {
    Validation(ValidationError),
    /// A record row names a reference title that was never imported.
    UnresolvedReference(String),
    /// A record row's species label matches no synonym or species.
    UnresolvedSpecies(String),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UnresolvedReference(title) => write!(f, "research not found: `{title}`"),
            Self::UnresolvedSpecies(label) => write!(f, "species not found: `{label}`"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ImportError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// One entry of the batch error log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowFailure {
    pub phase: ImportPhase,
    /// Zero-based index of the row within its phase input.
    pub row_index: usize,
    pub message: String,
    /// The unmodified input row, kept for operator inspection.
    pub raw: RawRow,
}

/// Outcome of a completed (or cancelled) batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    pub(crate) fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub(crate) fn record_failure(
        &mut self,
        phase: ImportPhase,
        row_index: usize,
        message: String,
        raw: RawRow,
    ) {
        self.failure_count += 1;
        self.failures.push(RowFailure {
            phase,
            row_index,
            message,
            raw,
        });
    }
}

/// Fatal store failure that terminated the run.
///
/// Carries the report accumulated up to the aborting row so the caller still
/// sees every outcome that did land.
#[derive(Debug)]
pub struct BatchAborted {
    pub error: RepoError,
    pub partial: ImportReport,
}

impl Display for BatchAborted {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "import aborted after {} successful and {} failed rows: {}",
            self.partial.success_count, self.partial.failure_count, self.error
        )
    }
}

impl Error for BatchAborted {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}
