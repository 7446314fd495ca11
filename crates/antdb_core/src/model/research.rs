//! Literature reference domain model.

use serde::{Deserialize, Serialize};

/// Surrogate key for a research (literature reference) row.
pub type ResearchId = i64;

/// Input for importing one literature reference.
///
/// Identity is anchored by the normalized title; author/year are metadata.
/// Occurrence rows may only attach to references that already exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResearch {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub doi: Option<String>,
    pub file_path: Option<String>,
}
