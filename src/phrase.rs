//! Phrase and token models.
//!
//! A phrase is the atomic node of the dependency tree: a non-empty token
//! sequence with a designated content token and parent/child links to other
//! phrases in the same sentence. Links are stored as intra-sentence indices
//! rather than pointers, so the document graph stays an arena keyed by
//! integer IDs.

use serde::{Deserialize, Serialize};

use crate::input::{ParsedPhrase, PasAnnotation, RelMarker};

/// A token with its document-wide ID assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface string.
    pub surface: String,
    /// Part-of-speech class, in the upstream tagset.
    pub pos: String,
    /// Whether this token is a content word.
    pub is_content: bool,
    /// Document-wide token ID.
    pub dmid: usize,
}

/// A named-entity marker decoded from phrase features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeFeature {
    /// Category label, validated against the known set at extraction time.
    pub category: String,
    /// The annotated entity text.
    pub text: String,
}

/// Grammatical features of a phrase, decoded once at construction.
///
/// Replaces string-membership probing of raw feature lists with an explicit
/// record: membership checks downstream go through these flags only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseFeatures {
    /// The phrase is nominal.
    pub nominal: bool,
    /// The phrase is predicative.
    pub predicative: bool,
    /// Dependency case assigned by the parser, e.g. `nom`.
    pub dep_case: Option<String>,
    /// Named-entity marker, if any.
    pub ne: Option<NeFeature>,
}

impl PhraseFeatures {
    /// Decode raw feature strings.
    ///
    /// Unrecognized features are ignored; the inventory is fixed by the
    /// annotation scheme.
    #[must_use]
    pub fn parse(raw: &[String]) -> Self {
        let mut features = PhraseFeatures::default();
        for feature in raw {
            match feature.as_str() {
                "nominal" => features.nominal = true,
                "predicative" => features.predicative = true,
                other => {
                    if let Some(case) = other.strip_prefix("case:") {
                        features.dep_case = Some(case.to_string());
                    } else if let Some(rest) = other.strip_prefix("ne:") {
                        if let Some((category, text)) = rest.split_once(':') {
                            features.ne = Some(NeFeature {
                                category: category.to_string(),
                                text: text.to_string(),
                            });
                        }
                    }
                }
            }
        }
        features
    }
}

/// A phrase inside a sentence, with document-wide IDs assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phrase {
    /// Phrase index within the sentence.
    pub tid: usize,
    /// Document-wide phrase ID.
    pub dtid: usize,
    /// Document-wide token ID of the content token.
    pub dmid: usize,
    /// ID of the containing sentence.
    pub sid: String,
    /// ID of the containing document.
    pub doc_id: String,
    /// Tokens of the phrase.
    pub tokens: Vec<Token>,
    /// Index of the dependency parent within the sentence.
    pub parent: Option<usize>,
    /// Indices of dependency children within the sentence.
    pub children: Vec<usize>,
    /// Decoded grammatical features.
    pub features: PhraseFeatures,
    /// Relation markers attached to this phrase.
    pub rels: Vec<RelMarker>,
    /// Pre-resolved predicate-argument annotation, if present.
    pub pas_annotation: Option<PasAnnotation>,
}

impl Phrase {
    /// Build a phrase from parsed input, assigning document-wide token IDs
    /// starting at `dmid_offset`.
    ///
    /// The content token is the first token flagged as a content word; if
    /// none is flagged, the first token stands in.
    #[must_use]
    pub fn from_parsed(
        parsed: ParsedPhrase,
        tid: usize,
        dtid: usize,
        dmid_offset: usize,
        sid: &str,
        doc_id: &str,
    ) -> Self {
        let features = PhraseFeatures::parse(&parsed.features);
        let tokens: Vec<Token> = parsed
            .tokens
            .into_iter()
            .enumerate()
            .map(|(i, t)| Token {
                surface: t.surface,
                pos: t.pos,
                is_content: t.is_content,
                dmid: dmid_offset + i,
            })
            .collect();
        let dmid = match tokens.iter().find(|t| t.is_content) {
            Some(token) => token.dmid,
            None => {
                let surface: String = tokens.iter().map(|t| t.surface.as_str()).collect();
                log::info!("{sid}: cannot find content word in: {surface}. using first token instead");
                dmid_offset
            }
        };
        Self {
            tid,
            dtid,
            dmid,
            sid: sid.to_string(),
            doc_id: doc_id.to_string(),
            tokens,
            parent: parsed.parent,
            children: Vec::new(),
            features,
            rels: parsed.rels,
            pas_annotation: parsed.pas,
        }
    }

    /// Surface form: the concatenated token surfaces.
    #[must_use]
    pub fn surface(&self) -> String {
        self.tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the phrase has no tokens. Well-formed input never produces
    /// an empty phrase.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Document-wide token IDs covered by this phrase.
    #[must_use]
    pub fn dmids(&self) -> std::ops::Range<usize> {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.dmid..last.dmid + 1,
            _ => 0..0,
        }
    }

    /// Whether the phrase carries a predicate annotation for the given
    /// relation marker inventory, i.e. any marker at all.
    #[must_use]
    pub fn has_rels(&self) -> bool {
        !self.rels.is_empty()
    }
}

impl std::fmt::Display for Phrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.surface())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ParsedToken;

    fn phrase(tokens: Vec<ParsedToken>, features: &[&str]) -> Phrase {
        let mut parsed = ParsedPhrase::new(tokens);
        for f in features {
            parsed = parsed.with_feature(*f);
        }
        Phrase::from_parsed(parsed, 0, 0, 10, "s1", "d1")
    }

    #[test]
    fn content_token_selection() {
        let p = phrase(
            vec![
                ParsedToken::new("the", "det"),
                ParsedToken::content("coin", "noun"),
            ],
            &[],
        );
        assert_eq!(p.dmid, 11);
        assert_eq!(p.dmids(), 10..12);
        assert_eq!(p.surface(), "thecoin");
    }

    #[test]
    fn content_token_falls_back_to_first() {
        let p = phrase(
            vec![ParsedToken::new("to", "adp"), ParsedToken::new("the", "det")],
            &[],
        );
        assert_eq!(p.dmid, 10);
    }

    #[test]
    fn features_are_decoded() {
        let p = phrase(
            vec![ParsedToken::content("coin", "noun")],
            &["nominal", "case:nom", "ne:ARTIFACT:coin", "unrecognized"],
        );
        assert!(p.features.nominal);
        assert!(!p.features.predicative);
        assert_eq!(p.features.dep_case.as_deref(), Some("nom"));
        let ne = p.features.ne.as_ref().unwrap();
        assert_eq!(ne.category, "ARTIFACT");
        assert_eq!(ne.text, "coin");
    }
}
