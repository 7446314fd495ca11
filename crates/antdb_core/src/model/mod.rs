//! Domain models and validation errors for the import engine.
//!
//! # Responsibility
//! - Define the record structs exchanged between resolvers and the runner.
//! - Define the row-local validation error taxonomy.
//!
//! # Invariants
//! - Models carry raw display text; normalization happens at the persistence
//!   boundary, never inside a model.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod research;
pub mod species;
pub mod survey;

/// Row-local domain validation failure.
///
/// Always recoverable at the batch level: a `ValidationError` fails one input
/// row, never the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A field required by the current import phase is missing or blank.
    MissingField(&'static str),
    /// A name passed to a resolver normalized to the empty string.
    EmptyName { what: &'static str },
    /// A numeric field failed to parse.
    InvalidNumber { field: &'static str, value: String },
    /// A date field is non-empty but matches no supported format.
    InvalidDate { value: String },
    /// Abundance must be a non-negative integer.
    NegativeAbundance(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{field}` is missing or empty"),
            Self::EmptyName { what } => write!(f, "{what} name must not be empty"),
            Self::InvalidNumber { field, value } => {
                write!(f, "field `{field}` has non-numeric value `{value}`")
            }
            Self::InvalidDate { value } => write!(f, "unrecognized date format `{value}`"),
            Self::NegativeAbundance(value) => {
                write!(f, "abundance must be non-negative, got {value}")
            }
        }
    }
}

impl Error for ValidationError {}
