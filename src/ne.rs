//! Named-entity records.
//!
//! Flat spans, independent of the predicate-argument and coreference
//! graphs. The annotated text of a marker must equal the exact
//! concatenation of the token surfaces it covers; the matcher scans
//! backward from the marked phrase's last token for the shortest such
//! suffix, shortening the right edge by up to the phrase's token count.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::phrase::Token;

/// Category of a named entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeCategory {
    /// Organization name.
    Organization,
    /// Person name.
    Person,
    /// Location name.
    Location,
    /// Man-made object or work.
    Artifact,
    /// Date expression.
    Date,
    /// Time expression.
    Time,
    /// Monetary value.
    Money,
    /// Percentage.
    Percent,
    /// Annotator-optional span.
    Optional,
}

impl NeCategory {
    /// Category label as annotated.
    #[must_use]
    pub const fn as_label(&self) -> &'static str {
        match self {
            NeCategory::Organization => "ORGANIZATION",
            NeCategory::Person => "PERSON",
            NeCategory::Location => "LOCATION",
            NeCategory::Artifact => "ARTIFACT",
            NeCategory::Date => "DATE",
            NeCategory::Time => "TIME",
            NeCategory::Money => "MONEY",
            NeCategory::Percent => "PERCENT",
            NeCategory::Optional => "OPTIONAL",
        }
    }

    /// Parse a category label. Unknown labels are rejected, not coerced.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "ORGANIZATION" => Some(NeCategory::Organization),
            "PERSON" => Some(NeCategory::Person),
            "LOCATION" => Some(NeCategory::Location),
            "ARTIFACT" => Some(NeCategory::Artifact),
            "DATE" => Some(NeCategory::Date),
            "TIME" => Some(NeCategory::Time),
            "MONEY" => Some(NeCategory::Money),
            "PERCENT" => Some(NeCategory::Percent),
            "OPTIONAL" => Some(NeCategory::Optional),
            _ => None,
        }
    }
}

impl std::fmt::Display for NeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_label())
    }
}

/// A named-entity span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedEntity {
    /// Category of the entity.
    pub category: NeCategory,
    /// The annotated entity text.
    pub text: String,
    /// Sentence ID of the span.
    pub sid: String,
    /// Sentence-level token index range.
    pub mid_range: Range<usize>,
    /// Document-wide token ID range.
    pub dmid_range: Range<usize>,
}

impl std::fmt::Display for NamedEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.text)
    }
}

/// Find the token suffix whose concatenated surfaces equal `text`.
///
/// `tokens` runs from the sentence start through the marked phrase's last
/// token; `phrase_len` is the marked phrase's token count, bounding how far
/// the right edge may retreat. Returns sentence-level token indices.
pub(crate) fn find_token_span(text: &str, tokens: &[&Token], phrase_len: usize) -> Option<Range<usize>> {
    for shift in 0..phrase_len {
        let end = tokens.len() - shift;
        let mut span = String::new();
        for start in (0..end).rev() {
            span = format!("{}{}", tokens[start].surface, span);
            if span == text {
                return Some(start..end);
            }
        }
    }
    None
}
