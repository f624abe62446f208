//! Document assembly and annotation extraction.
//!
//! A [`Document`] concatenates parsed sentences, assigns document-wide
//! phrase and token IDs, then runs the annotation passes: predicate-
//! argument extraction and coreference resolution walk the phrase sequence
//! once, in document order, mutating the shared entity/mention tables;
//! named-entity extraction runs independently over the same sentences.
//!
//! Construction is strictly sequential: earlier relation markers establish
//! certainty that later merges must respect. Malformed markers are skipped
//! with a log diagnostic; the unit of failure isolation is the single
//! marker, never the document.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::{self, DocumentConfig};
use crate::coreference::{Entity, EntityStore, Mention};
use crate::error::{Error, Result};
use crate::input::{ParsedSentence, RelMarker};
use crate::ne::{self, NamedEntity, NeCategory};
use crate::pas::{ArgMode, Argument, Pas};
use crate::phrase::{Phrase, Token};
use crate::sentence::Sentence;

/// A document with its annotation graph built.
#[derive(Debug, Clone)]
pub struct Document {
    doc_id: String,
    config: DocumentConfig,
    sentences: Vec<Sentence>,
    sid_index: HashMap<String, usize>,
    dtid_index: BTreeMap<usize, (usize, usize)>,
    store: EntityStore,
    pas_map: BTreeMap<usize, Pas>,
    named_entities: Vec<NamedEntity>,
}

impl Document {
    /// Build a document from parsed sentences.
    ///
    /// Sentences are assembled in order; a sentence whose ID duplicates an
    /// earlier one replaces it with a warning, while document-wide IDs
    /// still advance. Construction itself never fails: malformed markers
    /// are dropped individually.
    #[must_use]
    pub fn new(doc_id: impl Into<String>, parsed: Vec<ParsedSentence>, config: DocumentConfig) -> Self {
        let doc_id = doc_id.into();

        let mut sentences: Vec<Sentence> = Vec::new();
        let mut sid_index: HashMap<String, usize> = HashMap::new();
        let mut dtid = 0;
        let mut dmid = 0;
        for parsed_sentence in parsed {
            let sentence = Sentence::from_parsed(parsed_sentence, dtid, dmid, &doc_id);
            dtid += sentence.len();
            dmid += sentence.token_count();
            if let Some(&idx) = sid_index.get(&sentence.sid) {
                log::warn!("{}: duplicated sid found", sentence.sid);
                sentences[idx] = sentence;
            } else {
                sid_index.insert(sentence.sid.clone(), sentences.len());
                sentences.push(sentence);
            }
        }

        let dtid_index: BTreeMap<usize, (usize, usize)> = sentences
            .iter()
            .enumerate()
            .flat_map(|(sidx, sentence)| {
                sentence.phrases.iter().map(move |p| (p.dtid, (sidx, p.tid)))
            })
            .collect();

        let mut store = EntityStore::new(doc_id.as_str());
        let mut pas_map = BTreeMap::new();
        if config.use_pas_annotation {
            analyze_pas_annotations(&sentences, &mut store, &mut pas_map, &config);
        } else {
            analyze_rels(&sentences, &sid_index, &mut store, &mut pas_map, &config, &doc_id);
        }

        let named_entities = if config.extract_nes {
            extract_named_entities(&sentences)
        } else {
            Vec::new()
        };

        Self {
            doc_id,
            config,
            sentences,
            sid_index,
            dtid_index,
            store,
            pas_map,
            named_entities,
        }
    }

    /// Document ID.
    #[must_use]
    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    /// Extraction settings this document was built with.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Sentences in document order.
    #[must_use]
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// Number of sentences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    /// Whether the document has no sentences.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Get a sentence by ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SentenceNotFound`] for an unknown ID; asking for a
    /// sentence that does not exist is caller misuse, not corpus noise.
    pub fn sentence(&self, sid: &str) -> Result<&Sentence> {
        self.sid_index
            .get(sid)
            .map(|&idx| &self.sentences[idx])
            .ok_or_else(|| Error::sentence_not_found(sid))
    }

    /// Get a phrase by sentence ID and phrase index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SentenceNotFound`] or [`Error::PhraseNotFound`].
    pub fn phrase(&self, sid: &str, tid: usize) -> Result<&Phrase> {
        let sentence = self.sentence(sid)?;
        sentence
            .phrases
            .get(tid)
            .ok_or_else(|| Error::phrase_not_found(sid, tid))
    }

    /// All phrases in document order.
    pub fn phrases(&self) -> impl Iterator<Item = &Phrase> {
        self.sentences.iter().flat_map(|s| s.phrases.iter())
    }

    /// All tokens in document order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(Sentence::tokens)
    }

    /// Get a phrase by document-wide phrase ID.
    #[must_use]
    pub fn phrase_by_dtid(&self, dtid: usize) -> Option<&Phrase> {
        let &(sidx, tid) = self.dtid_index.get(&dtid)?;
        self.sentences[sidx].phrases.get(tid)
    }

    /// Surface form of the whole document.
    #[must_use]
    pub fn surface(&self) -> String {
        self.sentences.iter().map(Sentence::surface).collect()
    }

    /// Get a mention by document-wide phrase ID.
    #[must_use]
    pub fn mention(&self, dtid: usize) -> Option<&Mention> {
        self.store.mention(dtid)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn entity(&self, eid: usize) -> Option<&Entity> {
        self.store.entity(eid)
    }

    /// All mentions, keyed by document-wide phrase ID.
    #[must_use]
    pub fn mentions(&self) -> &BTreeMap<usize, Mention> {
        self.store.mentions()
    }

    /// All live entities, keyed by entity ID.
    #[must_use]
    pub fn entities(&self) -> &BTreeMap<usize, Entity> {
        self.store.entities()
    }

    /// Extracted named entities, in document order.
    #[must_use]
    pub fn named_entities(&self) -> &[NamedEntity] {
        &self.named_entities
    }

    /// All predicate-argument structures, in predicate order.
    #[must_use]
    pub fn pas_list(&self) -> Vec<&Pas> {
        self.pas_map.values().collect()
    }

    /// All predicate phrases, in document order.
    #[must_use]
    pub fn get_predicates(&self) -> Vec<&Phrase> {
        self.pas_map
            .keys()
            .filter_map(|&dtid| self.phrase_by_dtid(dtid))
            .collect()
    }

    /// Entities the given phrase's mention refers to.
    ///
    /// Returns an empty list for a phrase that never participated in any
    /// relation. `include_uncertain` adds entities linked uncertainly.
    #[must_use]
    pub fn get_entities(&self, phrase: &Phrase, include_uncertain: bool) -> Vec<&Entity> {
        self.entities_for_dtid(phrase.dtid, include_uncertain)
    }

    fn entities_for_dtid(&self, dtid: usize, include_uncertain: bool) -> Vec<&Entity> {
        let Some(mention) = self.store.mention(dtid) else {
            return Vec::new();
        };
        let eids = if include_uncertain {
            mention.all_eids()
        } else {
            mention.eids.clone()
        };
        eids.iter().filter_map(|&eid| self.store.entity(eid)).collect()
    }

    /// Arguments of a predicate, as a snapshot keyed by case role.
    ///
    /// With `relax`, every argument is expanded to the other mentions of
    /// its entities (uncertain ones included); expansions carry AND mode
    /// and duplicates of the base argument are skipped. Optional
    /// (adverbial) arguments are excluded unless `include_optional`.
    #[must_use]
    pub fn get_arguments(
        &self,
        predicate: &Phrase,
        relax: bool,
        include_optional: bool,
    ) -> BTreeMap<String, Vec<Argument>> {
        let Some(pas) = self.pas_map.get(&predicate.dtid) else {
            return BTreeMap::new();
        };
        let mut snapshot = pas.arguments.clone();
        if !include_optional {
            for args in snapshot.values_mut() {
                args.retain(|a| !a.optional());
            }
        }
        if !relax {
            return snapshot;
        }

        let mut expanded = Pas {
            dtid: pas.dtid,
            sid: pas.sid.clone(),
            dmid: pas.dmid,
            arguments: snapshot,
        };
        for (case, args) in &pas.arguments {
            for arg in args {
                let entities: Vec<&Entity> = match arg {
                    Argument::Special(special) => self.store.entity(special.eid).into_iter().collect(),
                    Argument::Textual(textual) => self.entities_for_dtid(textual.dtid, true),
                };
                let arg_label = arg.to_string();
                for entity in entities {
                    if let Some(exophor) = entity.exophor.as_deref() {
                        if exophor != arg_label {
                            expanded.add_special_argument(case, exophor, entity.eid, ArgMode::And);
                        }
                    }
                    for mention_dtid in entity.all_mentions() {
                        if let Argument::Textual(textual) = arg {
                            if mention_dtid == textual.dtid {
                                continue;
                            }
                        }
                        if let Some(mention_phrase) = self.phrase_by_dtid(mention_dtid) {
                            expanded.add_argument(case, mention_phrase, predicate, ArgMode::And);
                        }
                    }
                }
            }
        }
        expanded.arguments
    }

    /// Mentions sharing a coreference chain with the given mention.
    ///
    /// Certain chains only; `relax` adds the full mention sets of
    /// uncertainly linked entities. The mention itself is excluded.
    #[must_use]
    pub fn get_siblings(&self, mention: &Mention, relax: bool) -> Vec<&Mention> {
        let mut dtids: BTreeSet<usize> = BTreeSet::new();
        for &eid in &mention.eids {
            if let Some(entity) = self.store.entity(eid) {
                dtids.extend(entity.mentions.iter().copied());
            }
        }
        if relax {
            for &eid in &mention.eids_unc {
                if let Some(entity) = self.store.entity(eid) {
                    dtids.extend(entity.all_mentions());
                }
            }
        }
        dtids.remove(&mention.dtid);
        dtids.iter().filter_map(|&dtid| self.store.mention(dtid)).collect()
    }

    /// Count statistics over the built document.
    #[must_use]
    pub fn stat(&self) -> DocumentStat {
        let mut stat = DocumentStat {
            sentences: self.sentences.len(),
            phrases: self.phrases().count(),
            tokens: self.tokens().count(),
            nominal_phrases: self.phrases().filter(|p| p.features.nominal).count(),
            predicative_phrases: self.phrases().filter(|p| p.features.predicative).count(),
            entities: self.store.entities().len(),
            exophoric_entities: self.store.entities().values().filter(|e| e.is_exophoric()).count(),
            ..DocumentStat::default()
        };
        for mention in self.store.mentions().values() {
            let siblings = self.get_siblings(mention, false);
            if !siblings.is_empty() {
                stat.linked_mentions += 1;
            }
            for sibling in siblings {
                if sibling.is_nominal {
                    stat.nominal_siblings += 1;
                }
                if sibling.is_predicative {
                    stat.predicative_siblings += 1;
                }
            }
        }
        stat
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.surface())
    }
}

/// Count statistics of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStat {
    /// Number of sentences.
    pub sentences: usize,
    /// Number of phrases.
    pub phrases: usize,
    /// Number of tokens.
    pub tokens: usize,
    /// Number of nominal phrases.
    pub nominal_phrases: usize,
    /// Number of predicative phrases.
    pub predicative_phrases: usize,
    /// Number of live entities.
    pub entities: usize,
    /// Number of entities grounded to an exophor.
    pub exophoric_entities: usize,
    /// Number of mentions with at least one certain sibling.
    pub linked_mentions: usize,
    /// Nominal siblings summed over all mentions.
    pub nominal_siblings: usize,
    /// Predicative siblings summed over all mentions.
    pub predicative_siblings: usize,
}

/// Validate and normalize one phrase's relation markers.
///
/// Uncertain case markers are relaxed when configured; markers whose
/// target sentence is missing, whose type is unknown, or whose type is
/// outside the active sets are dropped with a diagnostic.
fn validate_rels(
    phrase: &Phrase,
    sid_index: &HashMap<String, usize>,
    config: &DocumentConfig,
    doc_id: &str,
) -> Vec<RelMarker> {
    let mut rels = Vec::new();
    for rel in &phrase.rels {
        let mut rel = rel.clone();
        if config.relax_cases
            && config::ALL_CASES.iter().any(|c| c == &rel.rel_type)
            && config::is_uncertain(&rel.rel_type)
        {
            rel.rel_type = config::strip_uncertain(&rel.rel_type).to_string();
        }
        let mut valid = true;
        if let Some(sid) = &rel.sid {
            if !sid_index.contains_key(sid) {
                log::warn!("{}: sentence: {sid} not found in {doc_id}", phrase.sid);
                valid = false;
            }
        }
        let known = config::ALL_CASES.iter().any(|c| c == &rel.rel_type)
            || config::ALL_COREFS.iter().any(|c| c == &rel.rel_type);
        if known {
            if !(config.is_target_case(&rel.rel_type) || config.is_target_coref(&rel.rel_type)) {
                log::info!("{}: relation type: {} is ignored", phrase.sid, rel.rel_type);
                valid = false;
            }
        } else {
            log::warn!("{}: unknown relation: {}", phrase.sid, rel.rel_type);
            valid = false;
        }
        if valid {
            rels.push(rel);
        }
    }
    rels
}

/// Extract predicate-argument structures and coreference links from
/// relation markers, phrase by phrase in document order.
fn analyze_rels(
    sentences: &[Sentence],
    sid_index: &HashMap<String, usize>,
    store: &mut EntityStore,
    pas_map: &mut BTreeMap<usize, Pas>,
    config: &DocumentConfig,
    doc_id: &str,
) {
    for sentence in sentences {
        for phrase in &sentence.phrases {
            let rels = validate_rels(phrase, sid_index, config, doc_id);

            let mut pas = Pas::new(phrase);
            for rel in rels.iter().filter(|r| config.is_target_case(&r.rel_type)) {
                if let Some(sid) = &rel.sid {
                    let Some(tid) = rel.tid else {
                        log::warn!("{}: relation {} lacks a target phrase index", phrase.sid, rel.rel_type);
                        continue;
                    };
                    let Some(arg) = find_phrase(sentences, sid_index, sid, tid) else {
                        continue;
                    };
                    // a mention and an entity spring up with the argument
                    store.get_or_create_mention(arg);
                    pas.add_argument(&rel.rel_type, arg, phrase, rel.mode);
                } else if rel.target == config::NO_REFERENT {
                    pas.set_arguments_optional(&rel.rel_type);
                } else if !config::is_known_exophor(&rel.target) {
                    log::warn!("{}: unknown exophor: {}", phrase.sid, rel.target);
                } else {
                    let eid = store.get_or_create_entity(Some(&rel.target), None);
                    pas.add_special_argument(&rel.rel_type, &rel.target, eid, rel.mode);
                }
            }
            if !pas.is_empty() {
                pas_map.insert(pas.dtid, pas);
            }

            for rel in rels.iter().filter(|r| config.is_target_coref(&r.rel_type)) {
                // OR and uncertain-existence combinations carry no identity
                if matches!(rel.mode, ArgMode::Plain | ArgMode::And) {
                    add_corefs(sentences, sid_index, store, pas_map, phrase, rel);
                }
            }
        }
    }
}

/// Register one coreference marker: obtain the source mention and, for
/// every entity it currently belongs to, link in the target mention or
/// exophor entity via the merge step.
fn add_corefs(
    sentences: &[Sentence],
    sid_index: &HashMap<String, usize>,
    store: &mut EntityStore,
    pas_map: &mut BTreeMap<usize, Pas>,
    source: &Phrase,
    rel: &RelMarker,
) {
    let target: Option<&Phrase> = if let Some(sid) = &rel.sid {
        let Some(tid) = rel.tid else {
            log::warn!("{}: relation {} lacks a target phrase index", source.sid, rel.rel_type);
            return;
        };
        let Some(target) = find_phrase(sentences, sid_index, sid, tid) else {
            return;
        };
        if target.dtid == source.dtid {
            log::warn!("{}: coreference with self found: {}", source.sid, source.surface());
            return;
        }
        Some(target)
    } else {
        if !config::is_known_exophor(&rel.target) {
            log::warn!("{}: unknown exophor: {}", source.sid, rel.target);
            return;
        }
        None
    };

    let uncertain = config::is_uncertain(&rel.rel_type);
    let source_dtid = store.get_or_create_mention(source);
    let source_eids: Vec<usize> = store
        .mention(source_dtid)
        .map(|m| m.all_eids().into_iter().collect())
        .unwrap_or_default();
    for source_eid in source_eids {
        // an earlier merge may have retired this eid
        if store.entity(source_eid).is_none() {
            continue;
        }
        if let Some(target) = target {
            let target_dtid = store.get_or_create_mention(target);
            let target_eids: Vec<usize> = store
                .mention(target_dtid)
                .map(|m| m.all_eids().into_iter().collect())
                .unwrap_or_default();
            for target_eid in target_eids {
                if store.entity(target_eid).is_none() {
                    continue;
                }
                merge_entities(store, pas_map, source_dtid, Some(target_dtid), source_eid, target_eid, uncertain);
            }
        } else {
            let target_eid = store.get_or_create_entity(Some(&rel.target), None);
            merge_entities(store, pas_map, source_dtid, None, source_eid, target_eid, uncertain);
        }
    }
}

/// Run the merge step and, if an entity was deleted, rewrite every special
/// argument that still carries the retired ID.
fn merge_entities(
    store: &mut EntityStore,
    pas_map: &mut BTreeMap<usize, Pas>,
    source_dtid: usize,
    target_dtid: Option<usize>,
    source_eid: usize,
    target_eid: usize,
    uncertain: bool,
) {
    let Some(deleted) = store.merge(source_dtid, target_dtid, source_eid, target_eid, uncertain) else {
        return;
    };
    for pas in pas_map.values_mut() {
        for args in pas.arguments.values_mut() {
            for arg in args.iter_mut() {
                if let Argument::Special(special) = arg {
                    if special.eid == deleted {
                        special.eid = source_eid;
                    }
                }
            }
        }
    }
}

/// Extract predicate-argument structures from the pre-resolved annotation
/// channel. No coreference links are read on this path.
fn analyze_pas_annotations(
    sentences: &[Sentence],
    store: &mut EntityStore,
    pas_map: &mut BTreeMap<usize, Pas>,
    config: &DocumentConfig,
) {
    for (sidx, sentence) in sentences.iter().enumerate() {
        for phrase in &sentence.phrases {
            let Some(annotation) = &phrase.pas_annotation else {
                continue;
            };
            let mut pas = Pas::new(phrase);
            for record in &annotation.args {
                let mut case = record.case.as_str();
                if config.relax_cases
                    && config::ALL_CASES.iter().any(|c| c == case)
                    && config::is_uncertain(case)
                {
                    case = config::strip_uncertain(case);
                }
                if record.exophoric {
                    let eid = store.get_or_create_entity(Some(&record.surface), record.eid);
                    pas.add_special_argument(case, &record.surface, eid, ArgMode::Plain);
                } else {
                    let Some(target_sidx) = sidx.checked_sub(record.sdist) else {
                        log::warn!("{}: argument sentence {} back out of range", sentence.sid, record.sdist);
                        continue;
                    };
                    let target_sentence = &sentences[target_sidx];
                    let Some(arg) = target_sentence.phrases.get(record.tid) else {
                        log::warn!("{}: phrase {} out of range", target_sentence.sid, record.tid);
                        continue;
                    };
                    store.get_or_create_mention(arg);
                    pas.add_argument(case, arg, phrase, ArgMode::Plain);
                }
            }
            if !pas.is_empty() {
                pas_map.insert(pas.dtid, pas);
            }
        }
    }
}

/// Extract named-entity spans by matching marker text against token
/// suffixes ending at the marked phrase.
fn extract_named_entities(sentences: &[Sentence]) -> Vec<NamedEntity> {
    let mut named_entities = Vec::new();
    for sentence in sentences {
        for phrase in &sentence.phrases {
            let Some(marker) = &phrase.features.ne else {
                continue;
            };
            let Some(category) = NeCategory::from_label(&marker.category) else {
                log::warn!("{}: unknown NE category: {}", sentence.sid, marker.category);
                continue;
            };
            let tokens: Vec<&Token> = sentence.phrases[..=phrase.tid]
                .iter()
                .flat_map(|p| p.tokens.iter())
                .collect();
            let Some(mid_range) = ne::find_token_span(&marker.text, &tokens, phrase.len()) else {
                log::warn!("{}: token span of '{}' not found", sentence.sid, marker.text);
                continue;
            };
            let dmid_start = tokens[mid_range.start].dmid;
            let dmid_end = tokens[mid_range.end - 1].dmid + 1;
            named_entities.push(NamedEntity {
                category,
                text: marker.text.clone(),
                sid: sentence.sid.clone(),
                mid_range,
                dmid_range: dmid_start..dmid_end,
            });
        }
    }
    named_entities
}

/// Look up a phrase by sentence ID and index, logging on a miss.
///
/// The sentence is expected to exist (markers are validated first); an
/// out-of-range phrase index is corpus noise and yields `None`.
fn find_phrase<'a>(
    sentences: &'a [Sentence],
    sid_index: &HashMap<String, usize>,
    sid: &str,
    tid: usize,
) -> Option<&'a Phrase> {
    let sentence = sid_index.get(sid).map(|&idx| &sentences[idx])?;
    let phrase = sentence.phrases.get(tid);
    if phrase.is_none() {
        log::warn!("{sid}: phrase index {tid} out of range");
    }
    phrase
}
