//! The parsed-sentence supplier contract.
//!
//! Tokenization and syntactic parsing happen upstream; documents are built
//! from these plain structs, one [`ParsedSentence`] per sentence. A phrase
//! carries its tokens, its dependency parent (children links are derived at
//! assembly so parent/child symmetry holds by construction), raw feature
//! strings, and the relation markers the annotation layer consumes.
//!
//! Feature strings use a small `key:value` grammar:
//!
//! - `nominal` / `predicative`: grammatical class flags
//! - `case:<label>`: the dependency case the parser assigned this phrase
//! - `ne:<CATEGORY>:<text>`: a named-entity marker
//!
//! # Example
//!
//! ```rust
//! use pasco::{ParsedPhrase, ParsedSentence, ParsedToken};
//!
//! let sentence = ParsedSentence::new(
//!     "doc1-s1",
//!     vec![
//!         ParsedPhrase::new(vec![ParsedToken::content("Ava", "noun")])
//!             .with_parent(1)
//!             .with_feature("nominal")
//!             .with_feature("case:nom"),
//!         ParsedPhrase::new(vec![ParsedToken::content("slept", "verb")])
//!             .with_feature("predicative"),
//!     ],
//! );
//! assert_eq!(sentence.phrases.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::pas::ArgMode;

/// One token as delivered by the upstream analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToken {
    /// Surface string.
    pub surface: String,
    /// Part-of-speech class, in the upstream tagset. Opaque to this crate.
    pub pos: String,
    /// Whether this token is a content word.
    pub is_content: bool,
}

impl ParsedToken {
    /// Create a function-word token.
    #[must_use]
    pub fn new(surface: impl Into<String>, pos: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            pos: pos.into(),
            is_content: false,
        }
    }

    /// Create a content-word token.
    #[must_use]
    pub fn content(surface: impl Into<String>, pos: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            pos: pos.into(),
            is_content: true,
        }
    }
}

/// A relation marker attached to a phrase.
///
/// Textual targets carry a sentence ID and phrase index; exophoric targets
/// carry only a label. `target` holds the annotated surface form (or the
/// exophor label / the no-referent literal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelMarker {
    /// Relation type, e.g. `nom`, `acc~`, `=`.
    pub rel_type: String,
    /// Annotated target string.
    pub target: String,
    /// Target sentence ID, absent for exophoric targets.
    pub sid: Option<String>,
    /// Target phrase index within the target sentence.
    pub tid: Option<usize>,
    /// Combination mode.
    pub mode: ArgMode,
}

impl RelMarker {
    /// Create a marker pointing at a phrase in some sentence.
    #[must_use]
    pub fn textual(
        rel_type: impl Into<String>,
        target: impl Into<String>,
        sid: impl Into<String>,
        tid: usize,
    ) -> Self {
        Self {
            rel_type: rel_type.into(),
            target: target.into(),
            sid: Some(sid.into()),
            tid: Some(tid),
            mode: ArgMode::Plain,
        }
    }

    /// Create a marker with a non-textual (exophoric) target.
    #[must_use]
    pub fn exophoric(rel_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            rel_type: rel_type.into(),
            target: target.into(),
            sid: None,
            tid: None,
            mode: ArgMode::Plain,
        }
    }

    /// Set the combination mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ArgMode) -> Self {
        self.mode = mode;
        self
    }
}

/// One record of a pre-resolved predicate-argument annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasArgAnnotation {
    /// Case role of the argument.
    pub case: String,
    /// Argument surface form, or the exophor label when exophoric.
    pub surface: String,
    /// Whether the argument is an exophor rather than a phrase.
    pub exophoric: bool,
    /// Entity ID requested by the annotation. Honored when free; a
    /// colliding ID is reallocated with a warning.
    pub eid: Option<usize>,
    /// How many sentences back the argument phrase lies (0 = same sentence).
    pub sdist: usize,
    /// Phrase index of the argument within its sentence.
    pub tid: usize,
}

impl PasArgAnnotation {
    /// Create a textual argument record.
    #[must_use]
    pub fn textual(case: impl Into<String>, surface: impl Into<String>, sdist: usize, tid: usize) -> Self {
        Self {
            case: case.into(),
            surface: surface.into(),
            exophoric: false,
            eid: None,
            sdist,
            tid,
        }
    }

    /// Create an exophoric argument record with a requested entity ID.
    #[must_use]
    pub fn exophoric(case: impl Into<String>, label: impl Into<String>, eid: usize) -> Self {
        Self {
            case: case.into(),
            surface: label.into(),
            exophoric: true,
            eid: Some(eid),
            sdist: 0,
            tid: 0,
        }
    }
}

/// A whole pre-resolved predicate-argument annotation for one phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasAnnotation {
    /// Argument records, in annotation order.
    pub args: Vec<PasArgAnnotation>,
}

impl PasAnnotation {
    /// Create an annotation from argument records.
    #[must_use]
    pub fn new(args: Vec<PasArgAnnotation>) -> Self {
        Self { args }
    }
}

/// One phrase as delivered by the upstream analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedPhrase {
    /// Tokens of the phrase, non-empty.
    pub tokens: Vec<ParsedToken>,
    /// Index of the dependency parent within the sentence, if any.
    pub parent: Option<usize>,
    /// Raw feature strings.
    pub features: Vec<String>,
    /// Relation markers attached to this phrase.
    pub rels: Vec<RelMarker>,
    /// Pre-resolved predicate-argument annotation, if present.
    pub pas: Option<PasAnnotation>,
}

impl ParsedPhrase {
    /// Create a phrase from its tokens.
    #[must_use]
    pub fn new(tokens: Vec<ParsedToken>) -> Self {
        Self {
            tokens,
            parent: None,
            features: Vec::new(),
            rels: Vec::new(),
            pas: None,
        }
    }

    /// Set the dependency parent index.
    #[must_use]
    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add a raw feature string.
    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    /// Add a relation marker.
    #[must_use]
    pub fn with_rel(mut self, rel: RelMarker) -> Self {
        self.rels.push(rel);
        self
    }

    /// Attach a pre-resolved predicate-argument annotation.
    #[must_use]
    pub fn with_pas(mut self, pas: PasAnnotation) -> Self {
        self.pas = Some(pas);
        self
    }
}

/// One sentence as delivered by the upstream analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSentence {
    /// Sentence ID, unique within the document.
    pub sid: String,
    /// Phrases in surface order.
    pub phrases: Vec<ParsedPhrase>,
}

impl ParsedSentence {
    /// Create a sentence from its phrases.
    #[must_use]
    pub fn new(sid: impl Into<String>, phrases: Vec<ParsedPhrase>) -> Self {
        Self {
            sid: sid.into(),
            phrases,
        }
    }
}
