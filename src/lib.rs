//! # pasco
//!
//! Document-level predicate-argument structure (PAS) and coreference
//! annotation graphs for Rust.
//!
//! Input is a sequence of per-sentence parse trees (phrase structure and
//! dependency links already computed upstream) annotated with lightweight
//! relation markers; output is a document-wide graph of predicates,
//! arguments, coreference entities, and the mentions that refer to them,
//! plus flat named-entity spans.
//!
//! - **Assembly**: sentences are concatenated and every phrase and token
//!   receives a document-wide ID.
//! - **PAS**: each predicate's case-role markers are resolved to phrases
//!   or exophors and classified as overt, dependency-inferred, or
//!   intra-/inter-sentential.
//! - **Coreference**: entities are built and merged incrementally in
//!   document scan order, preserving certain vs. uncertain link state.
//! - **Named entities**: marker spans are matched against the token
//!   sequence.
//!
//! # Quick Start
//!
//! ```rust
//! use pasco::{Document, DocumentConfig, ParsedPhrase, ParsedSentence, ParsedToken, RelMarker};
//!
//! # fn main() -> pasco::Result<()> {
//! // "Ava slept. She ..." with a nominative marker and a coreference link.
//! let sentences = vec![
//!     ParsedSentence::new(
//!         "ex-1",
//!         vec![
//!             ParsedPhrase::new(vec![ParsedToken::content("Ava", "noun")])
//!                 .with_parent(1)
//!                 .with_feature("nominal")
//!                 .with_feature("case:nom"),
//!             ParsedPhrase::new(vec![ParsedToken::content("slept", "verb")])
//!                 .with_feature("predicative")
//!                 .with_rel(RelMarker::textual("nom", "Ava", "ex-1", 0)),
//!         ],
//!     ),
//!     ParsedSentence::new(
//!         "ex-2",
//!         vec![ParsedPhrase::new(vec![ParsedToken::content("She", "pron")])
//!             .with_feature("nominal")
//!             .with_rel(RelMarker::textual("=", "Ava", "ex-1", 0))],
//!     ),
//! ];
//! let document = Document::new("ex", sentences, DocumentConfig::default());
//!
//! // The predicate has one overt nominative argument.
//! let predicate = document.phrase("ex-1", 1)?;
//! let arguments = document.get_arguments(predicate, false, false);
//! assert_eq!(arguments["nom"][0].to_string(), "Ava");
//!
//! // "Ava" and "She" ended up in one coreference chain.
//! let mention = document.mention(2).expect("She is a mention");
//! assert_eq!(document.get_siblings(mention, false).len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Construction model
//!
//! Building a document is a single-threaded, deterministic pass: the PAS
//! and coreference passes walk the phrase sequence in document order and
//! mutate shared entity/mention tables, so earlier markers establish
//! certainty that later merges respect. Malformed markers (unknown
//! relation types, dangling targets, unknown exophors, unmatched NE spans)
//! are dropped individually with a log diagnostic; only misuse of the
//! query surface returns an [`Error`].

#![warn(missing_docs)]

pub mod config;
mod coreference;
mod document;
mod error;
mod input;
mod ne;
mod pas;
mod phrase;
mod sentence;

pub use config::DocumentConfig;
pub use coreference::{Entity, EntityStore, Mention};
pub use document::{Document, DocumentStat};
pub use error::{Error, Result};
pub use input::{ParsedPhrase, ParsedSentence, ParsedToken, PasAnnotation, PasArgAnnotation, RelMarker};
pub use ne::{NamedEntity, NeCategory};
pub use pas::{ArgMode, Argument, DepType, Pas, SpecialArgument, TextualArgument};
pub use phrase::{NeFeature, Phrase, PhraseFeatures, Token};
pub use sentence::Sentence;

/// Convenient imports for building and querying documents.
pub mod prelude {
    pub use crate::{
        ArgMode, Argument, DepType, Document, DocumentConfig, Entity, Mention, NamedEntity,
        NeCategory, ParsedPhrase, ParsedSentence, ParsedToken, Pas, RelMarker, Result,
    };
}
