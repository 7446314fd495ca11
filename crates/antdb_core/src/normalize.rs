//! Free-text canonicalization for lookup keys.
//!
//! # Responsibility
//! - Fold arbitrary survey text into a stable comparison key.
//! - Provide the display-form fold used where raw text is persisted.
//!
//! # Invariants
//! - `normalize` is pure, total and idempotent.
//! - Every uniqueness/lookup comparison in this crate goes through
//!   `normalize`; raw text is stored for display only.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Canonicalizes text into the comparison key used by all resolvers.
///
/// NFKC compatibility fold (full-width/half-width variants collapse), runs of
/// whitespace (including U+3000) become one ASCII space, leading/trailing
/// whitespace is removed, and the result is lowercased. Empty input maps to
/// the empty string.
pub fn normalize(text: &str) -> String {
    let folded: String = text.nfkc().collect();
    let collapsed = WHITESPACE_RE.replace_all(&folded, " ");
    collapsed.trim().to_lowercase()
}

/// `normalize` over an optional field; absent input maps to `""`.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// Width/whitespace fold that keeps the original casing.
///
/// Used for persisted display forms (titles, site names) so the stored value
/// is tidy without destroying how the source spelled it.
pub fn fold_display(text: &str) -> String {
    let folded: String = text.nfkc().collect();
    let collapsed = WHITESPACE_RE.replace_all(&folded, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{fold_display, normalize, normalize_opt};

    #[test]
    fn normalize_is_idempotent() {
        for input in ["  Close   Ant ", "Ｆｏｒｍｉｃａ", "a\u{3000}b", ""] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn width_whitespace_and_case_variants_share_one_key() {
        assert_eq!(normalize("Ｃｌｏｓｅ   Ant "), normalize("close ant"));
        assert_eq!(normalize("Formica\u{3000}japonica"), "formica japonica");
        assert_eq!(normalize("  PITFALL  trap\t"), "pitfall trap");
    }

    #[test]
    fn empty_and_blank_input_normalize_to_empty_string() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \u{3000} "), "");
        assert_eq!(normalize_opt(None), "");
    }

    #[test]
    fn fold_display_keeps_case_but_folds_width_and_whitespace() {
        assert_eq!(fold_display("Ｃｌｏｓｅ   Ant "), "Close Ant");
        assert_eq!(fold_display(" Mt.\u{3000}Takao "), "Mt. Takao");
    }
}
