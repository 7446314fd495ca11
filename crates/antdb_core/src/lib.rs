//! Entity-resolution and idempotent-import core for tabular field-survey
//! data. This crate is the single source of truth for resolution and
//! deduplication invariants; CSV parsing and presentation live in callers.

pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod repo;

pub use import::report::{BatchAborted, ImportError, ImportPhase, ImportReport, RowFailure};
pub use import::row::RawRow;
pub use import::runner::{
    ImportBatch, ImportBatchRunner, DEFAULT_ABUNDANCE, DEFAULT_METHOD, DEFAULT_UNIT,
};
pub use logging::{default_log_level, init_logging};
pub use model::research::NewResearch;
pub use model::species::{NewSpecies, SpeciesAttributes, SynonymKind};
pub use model::survey::{NewSite, OccurrenceKey, SiteKey};
pub use model::ValidationError;
pub use normalize::normalize;
pub use repo::lookup_repo::{LookupRepository, LookupTable, SqliteLookupRepository};
pub use repo::occurrence_repo::{
    AccumulatedOccurrence, OccurrenceRepository, SqliteOccurrenceRepository,
};
pub use repo::research_repo::{ResearchRepository, SqliteResearchRepository};
pub use repo::site_repo::{SiteRepository, SqliteSiteRepository};
pub use repo::species_repo::{SpeciesRepository, SqliteSpeciesRepository};
pub use repo::{RepoError, RepoResult};
