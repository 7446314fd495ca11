//! Survey site upsert keyed by the composite natural key.
//!
//! # Responsibility
//! - Resolve or create survey sites so one physical site never splits into
//!   duplicate rows across record rows.
//!
//! # Invariants
//! - Key comparison treats an absent date as `''` and absent coordinates as
//!   `0` (equivalents, not wildcards).
//! - Attributes outside the key (elevation, environment, stored date) are
//!   written on first insert only; first write wins.

use crate::model::survey::{NewSite, SiteId, SiteKey};
use crate::model::ValidationError;
use crate::normalize::{fold_display, normalize};
use crate::repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Upsert interface for survey sites.
pub trait SiteRepository {
    /// Returns the id of the existing row matching the natural key, or
    /// inserts a new row and returns its id.
    fn upsert(&self, site: &NewSite) -> RepoResult<SiteId>;
}

/// SQLite-backed survey site repository.
pub struct SqliteSiteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSiteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn find(&self, key: &SiteKey, site_name_normalized: &str) -> RepoResult<Option<SiteId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM survey_sites
                 WHERE research_id = ?1
                   AND site_name_normalized = ?2
                   AND COALESCE(survey_date, '') = ?3
                   AND COALESCE(latitude, 0) = COALESCE(?4, 0)
                   AND COALESCE(longitude, 0) = COALESCE(?5, 0);",
                params![
                    key.research_id,
                    site_name_normalized,
                    key.survey_date.as_deref().unwrap_or(""),
                    key.latitude,
                    key.longitude,
                ],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(id)
    }
}

impl SiteRepository for SqliteSiteRepository<'_> {
    fn upsert(&self, site: &NewSite) -> RepoResult<SiteId> {
        let site_name_normalized = normalize(&site.key.site_name);
        if site_name_normalized.is_empty() {
            return Err(ValidationError::EmptyName { what: "site" }.into());
        }

        if let Some(id) = self.find(&site.key, &site_name_normalized)? {
            return Ok(id);
        }

        self.conn.execute(
            "INSERT INTO survey_sites
                (research_id, site_name, site_name_normalized, survey_date,
                 env_type_id, latitude, longitude, elevation_m)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                site.key.research_id,
                fold_display(&site.key.site_name),
                site_name_normalized,
                site.key.survey_date.as_deref(),
                site.env_type_id,
                site.key.latitude,
                site.key.longitude,
                site.elevation_m,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
