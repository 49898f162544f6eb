//! Per-category label canonicalization.

use serde::{Deserialize, Serialize};

/// Canonical form used when comparing model labels with client targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelCase {
    /// `"a"` -> `"A"`
    Upper,
    /// `"monday morning"` -> `"Monday Morning"`
    Title,
    /// Whitespace-trimmed only.
    #[default]
    AsIs,
}

impl LabelCase {
    pub fn canonicalize(&self, label: &str) -> String {
        let trimmed = label.trim();
        match self {
            Self::Upper => trimmed.to_uppercase(),
            Self::AsIs => trimmed.to_string(),
            Self::Title => title_case(trimmed),
        }
    }

    /// Compare two labels under this canonicalization.
    pub fn matches(&self, a: &str, b: &str) -> bool {
        self.canonicalize(a) == self.canonicalize(b)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Title => "title",
            Self::AsIs => "as_is",
        }
    }
}

// Uppercase the first letter of every alphabetic run, lowercase the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
