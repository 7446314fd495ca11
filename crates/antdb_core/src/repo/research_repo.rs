//! Literature reference lookup and creation.
//!
//! # Responsibility
//! - Locate references by normalized title.
//! - Create reference rows during the research import phase.
//!
//! # Invariants
//! - `locate` never creates: a record row may only attach to a reference
//!   that was imported beforehand.
//! - `title_normalized` is unique; re-importing a known title is a no-op.

use crate::model::research::{NewResearch, ResearchId};
use crate::model::ValidationError;
use crate::normalize::{fold_display, normalize};
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Locator/creator interface for literature references.
pub trait ResearchRepository {
    /// Resolves a free-text title to a reference id. `None` when unknown.
    fn locate(&self, title: &str) -> RepoResult<Option<ResearchId>>;

    /// Inserts a reference unless its normalized title already exists.
    /// Returns the id of the created or pre-existing row.
    fn create(&self, research: &NewResearch) -> RepoResult<ResearchId>;
}

/// SQLite-backed reference repository.
pub struct SqliteResearchRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResearchRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ResearchRepository for SqliteResearchRepository<'_> {
    fn locate(&self, title: &str) -> RepoResult<Option<ResearchId>> {
        let normalized = normalize(title);
        if normalized.is_empty() {
            return Ok(None);
        }

        let id = self
            .conn
            .query_row(
                "SELECT id FROM research WHERE title_normalized = ?1;",
                params![normalized],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }

    fn create(&self, research: &NewResearch) -> RepoResult<ResearchId> {
        let normalized = normalize(&research.title);
        if normalized.is_empty() {
            return Err(ValidationError::EmptyName { what: "title" }.into());
        }

        if let Some(id) = self.locate(&research.title)? {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO research (title, title_normalized, author, year, doi, file_path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                fold_display(&research.title),
                normalized,
                fold_display(&research.author),
                research.year,
                research.doi.as_deref().map(fold_display),
                research.file_path.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
