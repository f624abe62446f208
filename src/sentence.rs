//! Sentence model: a phrase sequence with document-wide offset assignment.

use serde::{Deserialize, Serialize};

use crate::input::ParsedSentence;
use crate::phrase::{Phrase, Token};

/// A sentence: an ordered list of phrases with intra-sentence dependency
/// links wired and document-wide IDs assigned from the given offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    /// Sentence ID.
    pub sid: String,
    /// ID of the containing document.
    pub doc_id: String,
    /// Phrases in surface order.
    pub phrases: Vec<Phrase>,
    dtid_offset: usize,
    dmid_offset: usize,
}

impl Sentence {
    /// Build a sentence from parsed input.
    ///
    /// `dtid_offset` / `dmid_offset` are the document-wide phrase and token
    /// IDs at which this sentence starts. Children links are derived from
    /// the parent indices, so parent/child symmetry holds by construction;
    /// an out-of-range parent index is dropped with a warning.
    #[must_use]
    pub fn from_parsed(parsed: ParsedSentence, dtid_offset: usize, dmid_offset: usize, doc_id: &str) -> Self {
        let sid = parsed.sid;
        let phrase_count = parsed.phrases.len();
        let mut phrases = Vec::with_capacity(phrase_count);
        let mut dmid = dmid_offset;
        for (tid, parsed_phrase) in parsed.phrases.into_iter().enumerate() {
            let token_count = parsed_phrase.tokens.len();
            let phrase = Phrase::from_parsed(parsed_phrase, tid, dtid_offset + tid, dmid, &sid, doc_id);
            phrases.push(phrase);
            dmid += token_count;
        }

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); phrase_count];
        for phrase in &mut phrases {
            if let Some(parent) = phrase.parent {
                if parent < phrase_count && parent != phrase.tid {
                    children[parent].push(phrase.tid);
                } else {
                    log::warn!("{sid}: dependency parent {parent} of phrase {} out of range", phrase.tid);
                    phrase.parent = None;
                }
            }
        }
        for (tid, child_tids) in children.into_iter().enumerate() {
            phrases[tid].children = child_tids;
        }

        Self {
            sid,
            doc_id: doc_id.to_string(),
            phrases,
            dtid_offset,
            dmid_offset,
        }
    }

    /// Number of phrases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    /// Whether the sentence has no phrases.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Get a phrase by its index, logging on out-of-range access.
    #[must_use]
    pub fn phrase(&self, tid: usize) -> Option<&Phrase> {
        let phrase = self.phrases.get(tid);
        if phrase.is_none() {
            log::error!("{}: phrase {tid} out of range", self.sid);
        }
        phrase
    }

    /// Document-wide phrase IDs of this sentence.
    #[must_use]
    pub fn dtids(&self) -> Vec<usize> {
        self.phrases.iter().map(|p| p.dtid).collect()
    }

    /// All tokens in surface order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.phrases.iter().flat_map(|p| p.tokens.iter())
    }

    /// Number of tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.phrases.iter().map(Phrase::len).sum()
    }

    /// Surface form: the concatenated phrase surfaces.
    #[must_use]
    pub fn surface(&self) -> String {
        self.phrases.iter().map(Phrase::surface).collect()
    }

    /// Document-wide phrase ID at which this sentence starts.
    #[must_use]
    pub fn dtid_offset(&self) -> usize {
        self.dtid_offset
    }

    /// Document-wide token ID at which this sentence starts.
    #[must_use]
    pub fn dmid_offset(&self) -> usize {
        self.dmid_offset
    }
}

impl std::fmt::Display for Sentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.surface())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ParsedPhrase, ParsedToken};

    fn two_phrase_sentence() -> Sentence {
        let parsed = ParsedSentence::new(
            "s1",
            vec![
                ParsedPhrase::new(vec![
                    ParsedToken::content("Ava", "noun"),
                    ParsedToken::new("'s", "part"),
                ])
                .with_parent(1),
                ParsedPhrase::new(vec![ParsedToken::content("cat", "noun")]),
            ],
        );
        Sentence::from_parsed(parsed, 5, 20, "d1")
    }

    #[test]
    fn offsets_are_applied() {
        let sentence = two_phrase_sentence();
        assert_eq!(sentence.dtids(), vec![5, 6]);
        assert_eq!(sentence.phrases[0].dmid, 20);
        assert_eq!(sentence.phrases[1].dmid, 22);
        assert_eq!(sentence.token_count(), 3);
        assert_eq!(sentence.surface(), "Ava'scat");
    }

    #[test]
    fn children_are_derived_from_parents() {
        let sentence = two_phrase_sentence();
        assert_eq!(sentence.phrases[0].parent, Some(1));
        assert_eq!(sentence.phrases[1].children, vec![0]);
        assert!(sentence.phrases[1].parent.is_none());
    }

    #[test]
    fn out_of_range_parent_is_dropped() {
        let parsed = ParsedSentence::new(
            "s1",
            vec![ParsedPhrase::new(vec![ParsedToken::content("hi", "intj")]).with_parent(9)],
        );
        let sentence = Sentence::from_parsed(parsed, 0, 0, "d1");
        assert!(sentence.phrases[0].parent.is_none());
    }

    #[test]
    fn phrase_lookup_bounds() {
        let sentence = two_phrase_sentence();
        assert!(sentence.phrase(1).is_some());
        assert!(sentence.phrase(2).is_none());
    }
}
