//! Species and synonym domain models.
//!
//! # Responsibility
//! - Define the species registration input and its optional attributes.
//! - Define the synonym classification stored alongside each name variant.
//!
//! # Invariants
//! - `scientific_name` anchors species identity and is never rewritten.
//! - Every synonym maps to exactly one species; the normalized form is
//!   globally unique across all species.

use serde::{Deserialize, Serialize};

/// Surrogate key for a species row.
pub type SpeciesId = i64;

/// Classification of a registered name variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynonymKind {
    /// The canonical scientific or vernacular name of the species.
    Primary,
    /// Any additional label supplied by an operator or a source file.
    Alias,
}

/// Optional descriptive attributes for a species registration.
///
/// Explicit struct instead of an open-ended field map so recognized optional
/// columns and their defaults are enumerable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesAttributes {
    pub subfamily: Option<String>,
    pub body_len_mm: Option<f64>,
    pub red_list: Option<String>,
}

/// Input for registering one species with its name variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSpecies {
    /// Anchors identity; must be non-empty.
    pub scientific_name: String,
    /// Vernacular name; must be non-empty.
    pub japanese_name: String,
    pub attributes: SpeciesAttributes,
    /// Additional alias labels; colliding aliases are skipped, not errors.
    pub synonyms: Vec<String>,
}

impl NewSpecies {
    pub fn new(scientific_name: impl Into<String>, japanese_name: impl Into<String>) -> Self {
        Self {
            scientific_name: scientific_name.into(),
            japanese_name: japanese_name.into(),
            attributes: SpeciesAttributes::default(),
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: Vec<String>) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn with_attributes(mut self, attributes: SpeciesAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}
