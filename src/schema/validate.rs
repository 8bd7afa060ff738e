// src/schema/validate.rs

// --- Imports ---
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// --- Constants ---
// Cell/line texts that mean "nothing was filled in".
const NULL_TOKENS: &[&str] = &["n/a", "na", "-", "--", "null"];
const NULL_PREFIX: &str = "no value to display";

// --- Regex Patterns (Lazy Static) ---
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // 12-Jun-2025, 3/September/2024
        r"(?i)\b\d{1,2}[-/](?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*[-/]\d{4}\b",
        // 01/02/2025, 1-2-25
        r"\b\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\b",
        // 2025-06-12
        r"\b\d{4}[-/]\d{2}[-/]\d{2}\b",
    ]
    .iter()
    .filter_map(|pat| Regex::new(pat).ok())
    .collect()
});

static DIGITS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+$").expect("Failed to compile DIGITS_RE"));

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:19|20)[0-9]{2}$").expect("Failed to compile YEAR_RE"));

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Failed to compile IDENTIFIER_RE"));

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE"));

/// Shape a captured value must have before it is accepted for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Date,
    Digits,
    Year,
    Identifier,
    /// Free text that must contain at least one digit, e.g. "2 Years".
    Age,
    Text,
}

impl ValueKind {
    /// Returns true when `value` (already normalized) has this kind's shape.
    pub fn accepts(&self, value: &str) -> bool {
        if is_nullish(value) {
            return false;
        }
        match self {
            ValueKind::Date => DATE_PATTERNS.iter().any(|re| re.is_match(value)),
            ValueKind::Digits => DIGITS_RE.is_match(value),
            ValueKind::Year => YEAR_RE.is_match(value),
            ValueKind::Identifier => IDENTIFIER_RE.is_match(value),
            ValueKind::Age => value.chars().any(|c| c.is_ascii_digit()),
            ValueKind::Text => true,
        }
    }
}

/// Replaces non-breaking spaces, collapses whitespace runs and trims.
pub fn normalize(text: &str) -> String {
    let text = text.replace('\u{00A0}', " ");
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Normalization used for label comparison: lower-cased, trailing colons dropped.
pub fn normalize_label(text: &str) -> String {
    normalize(text)
        .to_lowercase()
        .trim_end_matches(':')
        .trim_end()
        .to_string()
}

/// True for empty values and the usual "nothing here" placeholders.
pub fn is_nullish(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    lowered.is_empty() || lowered.starts_with(NULL_PREFIX) || NULL_TOKENS.contains(&lowered.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Site\u{00A0}\u{00A0}Number \t 101 "), "Site Number 101");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("Component ID:"), "component id");
        assert_eq!(normalize_label("  Site   No :: "), "site no");
    }

    #[test]
    fn test_nullish_tokens() {
        assert!(is_nullish(""));
        assert!(is_nullish("  N/A "));
        assert!(is_nullish("--"));
        assert!(is_nullish("No value to display for this subject"));
        assert!(!is_nullish("0"));
    }

    #[test]
    fn test_date_kind() {
        assert!(ValueKind::Date.accepts("12-Jun-2025"));
        assert!(ValueKind::Date.accepts("3/september/2024"));
        assert!(ValueKind::Date.accepts("01/02/2025"));
        assert!(ValueKind::Date.accepts("2025-06-12"));
        assert!(!ValueKind::Date.accepts("June 2025"));
        assert!(!ValueKind::Date.accepts("CMP-4471"));
    }

    #[test]
    fn test_digits_and_year_kinds() {
        assert!(ValueKind::Digits.accepts("0042"));
        assert!(!ValueKind::Digits.accepts("42a"));
        assert!(!ValueKind::Digits.accepts("4 2"));
        assert!(ValueKind::Year.accepts("1987"));
        assert!(!ValueKind::Year.accepts("1887"));
        assert!(!ValueKind::Year.accepts("87"));
    }

    #[test]
    fn test_identifier_rejects_multi_word_values() {
        assert!(ValueKind::Identifier.accepts("CMP-4471"));
        assert!(ValueKind::Identifier.accepts("SCR_0001"));
        assert!(!ValueKind::Identifier.accepts("Assignment Date 12-Jun-2025"));
    }

    #[test]
    fn test_age_and_text_kinds() {
        assert!(ValueKind::Age.accepts("2 Years"));
        assert!(!ValueKind::Age.accepts("Unknown"));
        assert!(ValueKind::Text.accepts("Female"));
        assert!(!ValueKind::Text.accepts("null"));
    }
}
