//! Species resolution and registration.
//!
//! # Responsibility
//! - Resolve free-text species labels to species ids via the synonym index.
//! - Register species together with their primary and alias synonyms.
//!
//! # Invariants
//! - The synonym index (`name_normalized` UNIQUE) is the authoritative lookup
//!   path; direct name matches are fallbacks only.
//! - Alias collisions across species are skipped silently: the first
//!   registrant keeps the label.

use crate::model::species::{NewSpecies, SpeciesId, SynonymKind};
use crate::model::ValidationError;
use crate::normalize::{fold_display, normalize};
use crate::repo::RepoResult;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

/// Resolver/registrar interface for species.
pub trait SpeciesRepository {
    /// Resolves any registered label (scientific, vernacular or alias) to a
    /// species id. `None` means the label is unknown; callers decide whether
    /// that is fatal.
    fn resolve(&self, label: &str) -> RepoResult<Option<SpeciesId>>;

    /// Creates a species unless one already exists under the same scientific
    /// name, then registers its primary and alias synonyms. Returns the id of
    /// the created or pre-existing row.
    fn register(&self, species: &NewSpecies) -> RepoResult<SpeciesId>;
}

/// SQLite-backed species repository.
pub struct SqliteSpeciesRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSpeciesRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn insert_synonym(
        &self,
        species_id: SpeciesId,
        name: &str,
        kind: SynonymKind,
    ) -> RepoResult<()> {
        let normalized = normalize(name);
        if normalized.is_empty() {
            return Ok(());
        }

        // Insert-or-ignore on the unique normalized name: a collision means
        // the label is already known, possibly under another species.
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO species_synonyms
                (species_id, name, name_normalized, synonym_type)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                species_id,
                fold_display(name),
                normalized,
                synonym_kind_to_db(kind)
            ],
        )?;
        if changed == 0 {
            debug!(
                "event=synonym_skipped module=species_repo status=ok species_id={species_id} reason=normalized_name_taken"
            );
        }
        Ok(())
    }
}

impl SpeciesRepository for SqliteSpeciesRepository<'_> {
    fn resolve(&self, label: &str) -> RepoResult<Option<SpeciesId>> {
        let normalized = normalize(label);
        if normalized.is_empty() {
            return Ok(None);
        }

        if let Some(id) = self
            .conn
            .query_row(
                "SELECT species_id FROM species_synonyms WHERE name_normalized = ?1;",
                params![normalized],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
        {
            return Ok(Some(id));
        }

        if let Some(id) = self
            .conn
            .query_row(
                "SELECT id FROM species WHERE scientific_name = ?1 COLLATE NOCASE;",
                params![normalized],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
        {
            return Ok(Some(id));
        }

        let vernacular = self
            .conn
            .query_row(
                "SELECT id FROM species WHERE japanese_name = ?1 COLLATE NOCASE;",
                params![normalized],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(vernacular)
    }

    fn register(&self, species: &NewSpecies) -> RepoResult<SpeciesId> {
        let scientific_display = fold_display(&species.scientific_name);
        let scientific_key = normalize(&species.scientific_name);
        if scientific_key.is_empty() {
            return Err(ValidationError::EmptyName {
                what: "scientific",
            }
            .into());
        }
        let japanese_display = fold_display(&species.japanese_name);
        if normalize(&species.japanese_name).is_empty() {
            return Err(ValidationError::EmptyName {
                what: "vernacular",
            }
            .into());
        }

        let existing = self
            .conn
            .query_row(
                "SELECT id FROM species WHERE scientific_name = ?1 COLLATE NOCASE;",
                params![scientific_key],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        let species_id = match existing {
            Some(id) => id,
            None => {
                self.conn.execute(
                    "INSERT INTO species
                        (scientific_name, japanese_name, subfamily, body_len_mm, red_list)
                     VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        scientific_display,
                        japanese_display,
                        species.attributes.subfamily.as_deref().map(fold_display),
                        species.attributes.body_len_mm,
                        species.attributes.red_list.as_deref().map(fold_display),
                    ],
                )?;
                self.conn.last_insert_rowid()
            }
        };

        // The canonical names become primary synonyms so the synonym index
        // alone can answer every lookup. Re-registration merges new aliases.
        self.insert_synonym(species_id, &scientific_display, SynonymKind::Primary)?;
        self.insert_synonym(species_id, &japanese_display, SynonymKind::Primary)?;
        for alias in &species.synonyms {
            self.insert_synonym(species_id, alias, SynonymKind::Alias)?;
        }

        Ok(species_id)
    }
}

fn synonym_kind_to_db(kind: SynonymKind) -> &'static str {
    match kind {
        SynonymKind::Primary => "primary",
        SynonymKind::Alias => "alias",
    }
}
