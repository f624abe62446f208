//! Marker inventories and extraction configuration.
//!
//! The relation-type, exophor, and named-entity inventories below are
//! configuration data: they mirror the annotation scheme of the source
//! corpus rather than anything derivable from structure. The overt-aliasing
//! table in particular is supplied verbatim: which case-role spellings
//! count as equivalent to which dependency-case features is a property of
//! the annotation guidelines, not of this crate.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Suffix marking a relation type as uncertain (probabilistic).
pub const UNCERTAIN_SUFFIX: char = '~';

/// Relation target meaning "no antecedent found".
pub const NO_REFERENT: &str = "none";

/// Exophor labels that may denote many distinct referents at once.
///
/// Unlike `author` or `reader`, an unnumbered unspecified referent is not a
/// document-wide singleton: every occurrence introduces a fresh entity.
pub const PRODUCTIVE_EXOPHORS: [&str; 3] = [
    "unspecified:person",
    "unspecified:object",
    "unspecified:situation",
];

/// Case-role labels without their uncertain variants.
const BASE_CASES: [&str; 15] = [
    "nom", "nom2", "acc", "dat", "gen", "gen?", "cop-nom", "comit", "abl", "all", "loc",
    "unmarked", "mod", "time", "external",
];

/// Coreference relation labels without their uncertain variants.
const BASE_COREFS: [&str; 3] = ["=", "=struct", "=role"];

/// All recognized case-role relation types, including uncertain variants.
pub static ALL_CASES: Lazy<Vec<String>> = Lazy::new(|| with_uncertain_variants(&BASE_CASES));

/// The argument-bearing core case roles.
pub static CORE_CASES: Lazy<Vec<String>> =
    Lazy::new(|| ["nom2", "nom", "acc", "dat"].iter().map(|s| s.to_string()).collect());

/// All recognized coreference relation types, including uncertain variants.
pub static ALL_COREFS: Lazy<Vec<String>> = Lazy::new(|| with_uncertain_variants(&BASE_COREFS));

/// All recognized exophor labels.
///
/// The numbered `unspecified:*N` labels are singletons: at most one live
/// entity per label in a document. The unnumbered forms are productive.
pub static ALL_EXOPHORS: Lazy<Vec<String>> = Lazy::new(|| {
    let mut labels: Vec<String> = [
        "author",
        "reader",
        "unspecified:person",
        "unspecified:object",
        "unspecified:situation",
        "preceding-sentence",
        "following-sentence",
        "[unknown]",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    labels.extend((1..=11).map(|n| format!("unspecified:person{n}")));
    labels.extend((1..=9).map(|n| format!("unspecified:object{n}")));
    labels.extend((1..=9).map(|n| format!("unspecified:situation{n}")));
    labels
});

/// Case-role spellings treated as equivalent to a plain dependency-case
/// feature when deciding overt vs. inferred classification.
///
/// `(case role, dependency case)` pairs; e.g. a `cop-nom` role on a phrase
/// whose dependency feature reads `nom` still counts as overt.
pub const OVERT_ALIASES: [(&str, &str); 2] = [("cop-nom", "nom"), ("gen?", "gen")];

fn with_uncertain_variants(base: &[&str]) -> Vec<String> {
    let mut all: Vec<String> = base.iter().map(|s| s.to_string()).collect();
    all.extend(base.iter().map(|s| format!("{s}{UNCERTAIN_SUFFIX}")));
    all
}

/// Whether a relation type carries the uncertain marker.
#[must_use]
pub fn is_uncertain(rel_type: &str) -> bool {
    rel_type.ends_with(UNCERTAIN_SUFFIX)
}

/// Strip the uncertain marker from a relation type, if present.
#[must_use]
pub fn strip_uncertain(rel_type: &str) -> &str {
    rel_type.trim_end_matches(UNCERTAIN_SUFFIX)
}

/// Whether the label is a known exophor.
#[must_use]
pub fn is_known_exophor(label: &str) -> bool {
    ALL_EXOPHORS.iter().any(|e| e == label)
}

/// Whether the label is a productive (non-singleton) exophor.
#[must_use]
pub fn is_productive_exophor(label: &str) -> bool {
    PRODUCTIVE_EXOPHORS.contains(&label)
}

/// Whether a case role matches a dependency-case feature for overt
/// classification, after stripping the uncertain marker.
#[must_use]
pub fn matches_overt(case: &str, dep_case: &str) -> bool {
    let case = strip_uncertain(case);
    case == dep_case
        || OVERT_ALIASES
            .iter()
            .any(|(c, d)| *c == case && *d == dep_case)
}

/// Extraction settings for a single document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Case-role relation types to extract arguments for.
    pub target_cases: Vec<String>,
    /// Coreference relation types to extract entity links for.
    pub target_corefs: Vec<String>,
    /// Treat uncertain case relations as their certain counterparts
    /// (e.g. `nom~` is read as `nom`).
    pub relax_cases: bool,
    /// Extract named-entity spans.
    pub extract_nes: bool,
    /// Read pre-resolved predicate-argument annotations instead of
    /// relation markers. No coreference links are built on this path.
    pub use_pas_annotation: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            target_cases: ALL_CASES.clone(),
            target_corefs: ALL_COREFS.clone(),
            relax_cases: false,
            extract_nes: true,
            use_pas_annotation: false,
        }
    }
}

impl DocumentConfig {
    /// Restrict extraction to the given case roles.
    #[must_use]
    pub fn with_cases<S: Into<String>>(mut self, cases: Vec<S>) -> Self {
        self.target_cases = cases.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict extraction to the given coreference relation types.
    #[must_use]
    pub fn with_corefs<S: Into<String>>(mut self, corefs: Vec<S>) -> Self {
        self.target_corefs = corefs.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable relaxed case reading.
    #[must_use]
    pub fn relax_cases(mut self, relax: bool) -> Self {
        self.relax_cases = relax;
        self
    }

    /// Enable or disable named-entity extraction.
    #[must_use]
    pub fn extract_nes(mut self, extract: bool) -> Self {
        self.extract_nes = extract;
        self
    }

    /// Switch to the pre-resolved predicate-argument annotation channel.
    #[must_use]
    pub fn use_pas_annotation(mut self, use_pas: bool) -> Self {
        self.use_pas_annotation = use_pas;
        self
    }

    /// Whether the relation type is an active case role.
    #[must_use]
    pub fn is_target_case(&self, rel_type: &str) -> bool {
        self.target_cases.iter().any(|c| c == rel_type)
    }

    /// Whether the relation type is an active coreference relation.
    #[must_use]
    pub fn is_target_coref(&self, rel_type: &str) -> bool {
        self.target_corefs.iter().any(|c| c == rel_type)
    }
}
