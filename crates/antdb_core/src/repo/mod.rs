//! Repository layer: entity resolution and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for each entity.
//! - Isolate SQLite query details from the import orchestration.
//!
//! # Invariants
//! - All lookup comparisons go through `normalize`; raw text never serves as
//!   a key.
//! - Table and column names in SQL text are compile-time constants, never
//!   interpolated from input.

use crate::db::DbError;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod lookup_repo;
pub mod occurrence_repo;
pub mod research_repo;
pub mod site_repo;
pub mod species_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for resolution and persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Row-local domain constraint failure.
    Validation(ValidationError),
    /// Underlying store failure; fatal for a batch run.
    Db(DbError),
    /// Persisted state violates an invariant this crate maintains.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
