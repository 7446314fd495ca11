//! Survey site and occurrence domain models.
//!
//! # Responsibility
//! - Define the composite natural keys used for deduplication.
//!
//! # Invariants
//! - `SiteKey` comparison treats an absent date as the empty string and
//!   absent coordinates as zero, never as wildcards.
//! - At most one occurrence row exists per `OccurrenceKey`; repeated
//!   observations merge additively.

use crate::model::research::ResearchId;
use crate::model::species::SpeciesId;
use serde::{Deserialize, Serialize};

/// Surrogate key for a survey site row.
pub type SiteId = i64;

/// Surrogate key for a dimension (controlled-vocabulary) row.
pub type LookupId = i64;

/// Natural key of a survey site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteKey {
    pub research_id: ResearchId,
    /// Raw site label; compared through its normalized form.
    pub site_name: String,
    /// ISO `YYYY-MM-DD` when present.
    pub survey_date: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Input for resolving or creating one survey site.
///
/// Fields outside the natural key are written on first insert only; repeat
/// mentions of the same key never update them (first write wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSite {
    pub key: SiteKey,
    pub env_type_id: Option<LookupId>,
    pub elevation_m: Option<i64>,
}

/// Natural key of an occurrence (fact) row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceKey {
    pub site_id: SiteId,
    pub species_id: SpeciesId,
    pub method_id: Option<LookupId>,
    /// Normalized count unit, e.g. `worker` or `colony`.
    pub unit: String,
}
