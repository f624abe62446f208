//! Error types for pasco.

use thiserror::Error;

/// Result type for pasco operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for pasco operations.
///
/// Malformed corpus input never surfaces here; it is skipped with a log
/// diagnostic during document construction. These variants report caller
/// contract violations on the query surface.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A sentence ID was requested that does not exist in the document.
    #[error("sentence not found: {0}")]
    SentenceNotFound(String),

    /// A phrase index was requested that is out of range for its sentence.
    #[error("phrase {tid} not found in sentence {sid}")]
    PhraseNotFound {
        /// Sentence ID of the lookup.
        sid: String,
        /// Requested phrase index.
        tid: usize,
    },

    /// Invalid input provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a sentence-not-found error.
    pub fn sentence_not_found(sid: impl Into<String>) -> Self {
        Error::SentenceNotFound(sid.into())
    }

    /// Create a phrase-not-found error.
    pub fn phrase_not_found(sid: impl Into<String>, tid: usize) -> Self {
        Error::PhraseNotFound {
            sid: sid.into(),
            tid,
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
