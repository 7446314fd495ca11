//! Input row container and field parsing helpers.
//!
//! # Responsibility
//! - Carry one semi-structured input row as a name→string mapping.
//! - Parse optional numeric/date fields with explicit validation errors.
//!
//! # Invariants
//! - A field that is absent or blank after trimming counts as missing.
//! - Parse failures are row-local `ValidationError`s, never silent `None`s.

use crate::model::ValidationError;
use crate::normalize::fold_display;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static YEAR_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid year regex"));
static YEAR_MONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})$").expect("valid year-month regex"));

const FULL_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// One input row as delivered by the external CSV reader.
///
/// Keys are column names; values are raw cell text. Ordered storage keeps
/// serialized error-log entries deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(flatten)]
    fields: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Returns the trimmed field value; blank cells count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Returns the field value or a `MissingField` validation error.
    pub fn required(&self, key: &'static str) -> Result<&str, ValidationError> {
        self.get(key).ok_or(ValidationError::MissingField(key))
    }
}

/// Parses an integer field; accepts float spellings of whole counts
/// (`"3.0"` → 3, matching common spreadsheet exports).
pub fn parse_int(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(parsed);
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.fract() == 0.0 => Ok(parsed as i64),
        _ => Err(ValidationError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

/// Parses a floating-point field.
pub fn parse_float(field: &'static str, value: &str) -> Result<f64, ValidationError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

/// Parses a survey date into canonical ISO `YYYY-MM-DD`.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD`, `YYYY-MM`, `YYYY/MM`
/// and bare `YYYY`; incomplete dates complete to the first day so equal
/// source dates always produce equal site keys.
pub fn parse_survey_date(value: &str) -> Result<String, ValidationError> {
    let folded = fold_display(value);

    for format in FULL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&folded, format) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
    }

    if YEAR_ONLY_RE.is_match(&folded) {
        return Ok(format!("{folded}-01-01"));
    }

    if let Some(caps) = YEAR_MONTH_RE.captures(&folded) {
        let year = &caps[1];
        let month: u32 = caps[2].parse().unwrap_or(0);
        if (1..=12).contains(&month) {
            return Ok(format!("{year}-{month:02}-01"));
        }
    }

    Err(ValidationError::InvalidDate {
        value: value.to_string(),
    })
}

/// Splits a comma-separated synonym cell into trimmed, non-empty labels.
pub fn split_synonyms(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_int, parse_survey_date, split_synonyms, RawRow};
    use crate::model::ValidationError;

    #[test]
    fn blank_fields_count_as_absent() {
        let row = RawRow::from_pairs([("site_name", "  "), ("method", "pitfall")]);
        assert_eq!(row.get("site_name"), None);
        assert_eq!(row.get("method"), Some("pitfall"));
        assert_eq!(
            row.required("site_name"),
            Err(ValidationError::MissingField("site_name"))
        );
    }

    #[test]
    fn parse_int_accepts_whole_floats_and_rejects_text() {
        assert_eq!(parse_int("abundance", "15"), Ok(15));
        assert_eq!(parse_int("abundance", "3.0"), Ok(3));
        assert!(parse_int("abundance", "many").is_err());
        assert!(parse_int("abundance", "2.5").is_err());
    }

    #[test]
    fn survey_dates_normalize_to_iso() {
        assert_eq!(parse_survey_date("2019/05/03").unwrap(), "2019-05-03");
        assert_eq!(parse_survey_date("2019.5.3").unwrap(), "2019-05-03");
        assert_eq!(parse_survey_date("2019-07").unwrap(), "2019-07-01");
        assert_eq!(parse_survey_date("2019").unwrap(), "2019-01-01");
        assert!(parse_survey_date("spring 2019").is_err());
        assert!(parse_survey_date("2019-13").is_err());
    }

    #[test]
    fn synonym_cells_split_on_commas_and_drop_blanks() {
        assert_eq!(
            split_synonyms("クロヤマ, black ant ,,"),
            vec!["クロヤマ".to_string(), "black ant".to_string()]
        );
    }
}
