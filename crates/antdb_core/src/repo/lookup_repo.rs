//! Dimension (controlled-vocabulary) table resolution.
//!
//! # Responsibility
//! - Resolve-or-create rows in the small lookup tables by normalized name.
//!
//! # Invariants
//! - At most one row exists per distinct normalized name.
//! - Repeated calls with equivalent input return the same id.

use crate::model::survey::LookupId;
use crate::model::ValidationError;
use crate::normalize::normalize;
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Controlled-vocabulary tables addressable by the resolver.
///
/// The enum keeps table names out of caller hands: SQL text only ever sees
/// these fixed identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTable {
    EnvironmentTypes,
    Methods,
    Units,
    Seasons,
}

impl LookupTable {
    fn table_name(self) -> &'static str {
        match self {
            Self::EnvironmentTypes => "environment_types",
            Self::Methods => "methods",
            Self::Units => "units",
            Self::Seasons => "seasons",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::EnvironmentTypes => "environment type",
            Self::Methods => "method",
            Self::Units => "unit",
            Self::Seasons => "season",
        }
    }
}

/// Resolver interface for dimension rows.
pub trait LookupRepository {
    /// Returns the id of the row whose normalized name matches, creating the
    /// row when absent.
    fn resolve_or_create(&self, table: LookupTable, name: &str) -> RepoResult<LookupId>;
}

/// SQLite-backed dimension resolver.
pub struct SqliteLookupRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLookupRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LookupRepository for SqliteLookupRepository<'_> {
    fn resolve_or_create(&self, table: LookupTable, name: &str) -> RepoResult<LookupId> {
        let normalized = normalize(name);
        if normalized.is_empty() {
            return Err(ValidationError::EmptyName {
                what: table.label(),
            }
            .into());
        }

        let select = format!("SELECT id FROM {} WHERE name = ?1;", table.table_name());
        if let Some(id) = self
            .conn
            .query_row(&select, params![normalized], |row| row.get::<_, i64>(0))
            .optional()?
        {
            return Ok(id);
        }

        let insert = format!("INSERT INTO {} (name) VALUES (?1);", table.table_name());
        self.conn.execute(&insert, params![normalized])?;
        Ok(self.conn.last_insert_rowid())
    }
}
