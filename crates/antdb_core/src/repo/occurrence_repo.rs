//! Occurrence (fact) accumulation keyed by (site, species, method, unit).
//!
//! # Responsibility
//! - Insert new occurrence rows or additively merge repeated observations.
//!
//! # Invariants
//! - At most one row exists per natural key.
//! - Merges are strictly additive; existing counts are never overwritten or
//!   averaged.

use crate::model::survey::OccurrenceKey;
use crate::model::ValidationError;
use crate::repo::RepoResult;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

/// Result of an accumulate call: the row id and its abundance after the
/// insert or merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatedOccurrence {
    pub id: i64,
    pub abundance: i64,
}

/// Accumulator interface for occurrence rows.
pub trait OccurrenceRepository {
    /// Adds `abundance` under the natural key, merging into an existing row
    /// when one is present.
    fn add_or_merge(&self, key: &OccurrenceKey, abundance: i64)
        -> RepoResult<AccumulatedOccurrence>;
}

/// SQLite-backed occurrence repository.
pub struct SqliteOccurrenceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOccurrenceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl OccurrenceRepository for SqliteOccurrenceRepository<'_> {
    fn add_or_merge(
        &self,
        key: &OccurrenceKey,
        abundance: i64,
    ) -> RepoResult<AccumulatedOccurrence> {
        if abundance < 0 {
            return Err(ValidationError::NegativeAbundance(abundance).into());
        }

        let existing = self
            .conn
            .query_row(
                "SELECT id, abundance FROM occurrences
                 WHERE site_id = ?1
                   AND species_id = ?2
                   AND COALESCE(method_id, 0) = COALESCE(?3, 0)
                   AND unit = ?4;",
                params![key.site_id, key.species_id, key.method_id, key.unit],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        if let Some((id, current)) = existing {
            let merged = current + abundance;
            self.conn.execute(
                "UPDATE occurrences SET abundance = ?1 WHERE id = ?2;",
                params![merged, id],
            )?;
            debug!(
                "event=occurrence_merge module=occurrence_repo status=ok id={id} previous={current} merged={merged}"
            );
            return Ok(AccumulatedOccurrence {
                id,
                abundance: merged,
            });
        }

        self.conn.execute(
            "INSERT INTO occurrences (site_id, species_id, method_id, unit, abundance)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                key.site_id,
                key.species_id,
                key.method_id,
                key.unit,
                abundance
            ],
        )?;
        Ok(AccumulatedOccurrence {
            id: self.conn.last_insert_rowid(),
            abundance,
        })
    }
}
