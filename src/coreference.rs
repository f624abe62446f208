//! Coreference mentions, entities, and the entity store.
//!
//! # Terminology
//!
//! - **Mention**: a phrase that participates in coreference, keyed by its
//!   document-wide phrase ID.
//! - **Entity**: a coreference cluster identified by an entity ID (`eid`),
//!   optionally grounded to an exophor (a referent with no textual
//!   antecedent, e.g. `author`).
//! - **Certain / uncertain link**: a mention-to-entity edge annotated as
//!   definite vs. probabilistic.
//!
//! The store owns both tables and keeps them bidirectionally consistent: a
//! mention lists exactly the entity IDs whose entities list it back, with
//! matching certainty. All cross-references are integer IDs; no object
//! cycles exist.
//!
//! Entities are merged incrementally as links are scanned in document
//! order. The merge is deliberately not a union-find: links arrive in
//! either direction, may be uncertain, and previously established certainty
//! must never be downgraded, so each discovered link updates the triangle
//! of edges between the two mentions and their entities individually.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config;
use crate::phrase::Phrase;

/// A phrase participating in coreference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    /// Document-wide phrase ID.
    pub dtid: usize,
    /// Phrase index within its sentence.
    pub tid: usize,
    /// Sentence ID.
    pub sid: String,
    /// Document-wide token ID of the content token.
    pub dmid: usize,
    /// Surface form of the phrase.
    pub surface: String,
    /// Whether the underlying phrase is nominal.
    pub is_nominal: bool,
    /// Whether the underlying phrase is predicative.
    pub is_predicative: bool,
    /// IDs of entities this mention certainly refers to.
    pub eids: BTreeSet<usize>,
    /// IDs of entities this mention uncertainly refers to.
    pub eids_unc: BTreeSet<usize>,
}

impl Mention {
    /// Create a mention for a phrase, with empty entity sets.
    #[must_use]
    pub fn new(phrase: &Phrase) -> Self {
        Self {
            dtid: phrase.dtid,
            tid: phrase.tid,
            sid: phrase.sid.clone(),
            dmid: phrase.dmid,
            surface: phrase.surface(),
            is_nominal: phrase.features.nominal,
            is_predicative: phrase.features.predicative,
            eids: BTreeSet::new(),
            eids_unc: BTreeSet::new(),
        }
    }

    /// All entity IDs, certain and uncertain.
    #[must_use]
    pub fn all_eids(&self) -> BTreeSet<usize> {
        self.eids.union(&self.eids_unc).copied().collect()
    }

    /// Whether the link to the given entity is uncertain.
    ///
    /// The mention must be linked to the entity one way or the other.
    #[must_use]
    pub fn is_uncertain_to(&self, eid: usize) -> bool {
        if self.eids.contains(&eid) {
            false
        } else {
            debug_assert!(self.eids_unc.contains(&eid));
            true
        }
    }
}

impl std::fmt::Display for Mention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.surface)
    }
}

/// A coreference cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity ID. Never changes after creation; may leave gaps after
    /// merges delete the losing entity.
    pub eid: usize,
    /// Exophor label when the entity is grounded to a non-textual referent.
    pub exophor: Option<String>,
    /// Document-wide phrase IDs of certain mentions.
    pub mentions: BTreeSet<usize>,
    /// Document-wide phrase IDs of uncertain mentions.
    pub mentions_unc: BTreeSet<usize>,
    /// Whether every observed mention is nominal. Unset until a mention is
    /// observed; false as soon as one disagrees.
    pub is_nominal: Option<bool>,
    /// Whether every observed mention is predicative.
    pub is_predicative: Option<bool>,
}

impl Entity {
    /// Create an entity with no mentions.
    #[must_use]
    pub fn new(eid: usize, exophor: Option<String>) -> Self {
        Self {
            eid,
            exophor,
            mentions: BTreeSet::new(),
            mentions_unc: BTreeSet::new(),
            is_nominal: None,
            is_predicative: None,
        }
    }

    /// Whether the entity is grounded to an exophor.
    #[must_use]
    pub fn is_exophoric(&self) -> bool {
        self.exophor.is_some()
    }

    /// All mention IDs, certain and uncertain.
    #[must_use]
    pub fn all_mentions(&self) -> BTreeSet<usize> {
        self.mentions.union(&self.mentions_unc).copied().collect()
    }
}

/// The per-document mention and entity tables.
///
/// Exclusively owned by the document builder; construction is a sequential
/// state machine over these tables and no concurrent mutation is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    doc_id: String,
    mentions: BTreeMap<usize, Mention>,
    entities: BTreeMap<usize, Entity>,
    next_eid: usize,
}

impl EntityStore {
    /// Create an empty store for a document.
    #[must_use]
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            mentions: BTreeMap::new(),
            entities: BTreeMap::new(),
            next_eid: 0,
        }
    }

    /// Get a mention by document-wide phrase ID.
    #[must_use]
    pub fn mention(&self, dtid: usize) -> Option<&Mention> {
        self.mentions.get(&dtid)
    }

    /// Get an entity by ID.
    #[must_use]
    pub fn entity(&self, eid: usize) -> Option<&Entity> {
        self.entities.get(&eid)
    }

    /// All mentions, keyed by document-wide phrase ID.
    #[must_use]
    pub fn mentions(&self) -> &BTreeMap<usize, Mention> {
        &self.mentions
    }

    /// All live entities, keyed by entity ID.
    #[must_use]
    pub fn entities(&self) -> &BTreeMap<usize, Entity> {
        &self.entities
    }

    /// Return the mention for a phrase, creating it on first sight.
    ///
    /// A newly seen phrase starts its own singleton cluster: a fresh entity
    /// is created and linked certainly.
    pub fn get_or_create_mention(&mut self, phrase: &Phrase) -> usize {
        let dtid = phrase.dtid;
        if !self.mentions.contains_key(&dtid) {
            self.mentions.insert(dtid, Mention::new(phrase));
            let eid = self.get_or_create_entity(None, None);
            self.add_mention(eid, dtid, false);
        }
        dtid
    }

    /// Return an entity for the given exophor, creating one if needed.
    ///
    /// Productive exophors always get a fresh entity; any other exophor is
    /// a document-wide singleton and an existing entity with the same label
    /// is returned unchanged. A requested ID is honored when free; a
    /// colliding ID is reallocated to `max + 1` with a warning.
    pub fn get_or_create_entity(&mut self, exophor: Option<&str>, requested_eid: Option<usize>) -> usize {
        if let Some(label) = exophor {
            if !config::is_productive_exophor(label) {
                let existing: Vec<usize> = self
                    .entities
                    .values()
                    .filter(|e| e.exophor.as_deref() == Some(label))
                    .map(|e| e.eid)
                    .collect();
                if let Some(&eid) = existing.first() {
                    debug_assert_eq!(existing.len(), 1);
                    return eid;
                }
            }
        }
        let eid = match requested_eid {
            Some(requested) if self.entities.contains_key(&requested) => {
                log::warn!(
                    "{}: eid {requested} is already used. using eid {} instead",
                    self.doc_id,
                    self.next_eid
                );
                self.next_eid
            }
            Some(requested) => requested,
            None => self.next_eid,
        };
        self.next_eid = self.next_eid.max(eid + 1);
        self.entities.insert(eid, Entity::new(eid, exophor.map(String::from)));
        eid
    }

    /// Link a mention to an entity.
    ///
    /// A certain link overrides an existing uncertain link to the same
    /// entity; an uncertain link never downgrades an existing one. The
    /// entity's nominal/predicative flags are recomputed on every call.
    pub fn add_mention(&mut self, eid: usize, dtid: usize, uncertain: bool) {
        let Some(entity) = self.entities.get(&eid) else {
            return;
        };
        if uncertain {
            if entity.mentions.contains(&dtid) || entity.mentions_unc.contains(&dtid) {
                return;
            }
        } else if entity.mentions_unc.contains(&dtid) {
            self.remove_mention(eid, dtid);
        }
        let Some(mention) = self.mentions.get_mut(&dtid) else {
            return;
        };
        let (is_nominal, is_predicative) = (mention.is_nominal, mention.is_predicative);
        if uncertain {
            mention.eids_unc.insert(eid);
        } else {
            mention.eids.insert(eid);
        }
        let Some(entity) = self.entities.get_mut(&eid) else {
            return;
        };
        if uncertain {
            entity.mentions_unc.insert(dtid);
        } else {
            entity.mentions.insert(dtid);
        }
        entity.is_nominal = Some(entity.is_nominal != Some(false) && is_nominal);
        entity.is_predicative = Some(entity.is_predicative != Some(false) && is_predicative);
    }

    /// Unlink a mention from an entity, certain or uncertain.
    pub fn remove_mention(&mut self, eid: usize, dtid: usize) {
        if let Some(entity) = self.entities.get_mut(&eid) {
            entity.mentions.remove(&dtid);
            entity.mentions_unc.remove(&dtid);
        }
        if let Some(mention) = self.mentions.get_mut(&dtid) {
            mention.eids.remove(&eid);
            mention.eids_unc.remove(&eid);
        }
    }

    /// Delete an entity, stripping its ID from every mention.
    ///
    /// Entity IDs are retired, never reused; the table may keep gaps.
    /// `sid` names the sentence under analysis, for diagnostics only.
    pub fn delete_entity(&mut self, eid: usize, sid: &str) {
        let Some(entity) = self.entities.get(&eid) else {
            return;
        };
        let label = entity
            .exophor
            .clone()
            .or_else(|| {
                entity
                    .all_mentions()
                    .first()
                    .and_then(|dtid| self.mentions.get(dtid))
                    .map(|m| m.surface.clone())
            })
            .unwrap_or_default();
        log::info!("{sid}: delete entity {eid} ({label})");
        for dtid in self.entities[&eid].all_mentions() {
            self.remove_mention(eid, dtid);
        }
        self.entities.remove(&eid);
    }

    fn is_uncertain_to(&self, dtid: usize, eid: usize) -> bool {
        self.mentions
            .get(&dtid)
            .map(|m| m.is_uncertain_to(eid))
            .unwrap_or(false)
    }

    /// Process one discovered coreference link between `source_dtid` under
    /// `source_eid` and `target_dtid` (absent for exophoric targets) under
    /// `target_eid`.
    ///
    /// When both entities are the same, a certain link promotes the single
    /// uncertain edge of the triangle formed by the two mentions and the
    /// entity, if any: two certain edges imply the third. When they differ, each mention is
    /// first linked to the opposite entity with the weakest certainty among
    /// the new link and the two existing edges. The entities are then
    /// merged only if every edge involved is certain and their exophors do
    /// not conflict; the target entity loses, its mentions are relinked
    /// with their original certainty, and it is deleted.
    ///
    /// Returns the ID of the deleted entity, if a merge completed. The
    /// caller is responsible for rewriting any argument that still carries
    /// the deleted ID.
    pub fn merge(
        &mut self,
        source_dtid: usize,
        target_dtid: Option<usize>,
        source_eid: usize,
        target_eid: usize,
        uncertain: bool,
    ) -> Option<usize> {
        let uncertain_tgt = target_dtid.is_some_and(|dtid| self.is_uncertain_to(dtid, target_eid));
        let uncertain_src = self.is_uncertain_to(source_dtid, source_eid);
        if source_eid == target_eid {
            if !uncertain {
                if !uncertain_src && uncertain_tgt {
                    if let Some(dtid) = target_dtid {
                        self.add_mention(source_eid, dtid, false);
                    }
                }
                if uncertain_src && !uncertain_tgt {
                    self.add_mention(source_eid, source_dtid, false);
                }
            }
            return None;
        }
        if let Some(dtid) = target_dtid {
            self.add_mention(source_eid, dtid, uncertain || uncertain_src);
        }
        self.add_mention(target_eid, source_dtid, uncertain || uncertain_tgt);
        // identity not yet certain; keep both entities
        if uncertain_src || uncertain || uncertain_tgt {
            return None;
        }
        // conflicting grounded referents cannot be merged
        let source_exophor = self.entities.get(&source_eid)?.exophor.clone();
        let target_exophor = self.entities.get(&target_eid)?.exophor.clone();
        if source_exophor.is_some() && target_exophor.is_some() && source_exophor != target_exophor {
            return None;
        }
        if source_exophor.is_none() {
            if let Some(entity) = self.entities.get_mut(&source_eid) {
                entity.exophor = target_exophor;
            }
        }
        let target_mentions = self.entities.get(&target_eid)?.all_mentions();
        for dtid in target_mentions {
            let unc = self.is_uncertain_to(dtid, target_eid);
            self.add_mention(source_eid, dtid, unc);
        }
        let sid = self
            .mentions
            .get(&source_dtid)
            .map(|m| m.sid.clone())
            .unwrap_or_default();
        self.delete_entity(target_eid, &sid);
        Some(target_eid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ParsedPhrase, ParsedToken};

    fn phrase(dtid: usize, surface: &str, nominal: bool) -> Phrase {
        let mut parsed = ParsedPhrase::new(vec![ParsedToken::content(surface, "noun")]);
        if nominal {
            parsed = parsed.with_feature("nominal");
        }
        Phrase::from_parsed(parsed, dtid, dtid, dtid, "s1", "d1")
    }

    #[test]
    fn new_mention_starts_singleton_cluster() {
        let mut store = EntityStore::new("d1");
        let dtid = store.get_or_create_mention(&phrase(0, "Ava", true));
        assert_eq!(store.mentions().len(), 1);
        assert_eq!(store.entities().len(), 1);
        let mention = store.mention(dtid).unwrap();
        assert_eq!(mention.eids.iter().copied().collect::<Vec<_>>(), vec![0]);
        assert!(store.entity(0).unwrap().mentions.contains(&dtid));
        // second sight returns the same mention
        store.get_or_create_mention(&phrase(0, "Ava", true));
        assert_eq!(store.entities().len(), 1);
    }

    #[test]
    fn singleton_exophor_is_reused() {
        let mut store = EntityStore::new("d1");
        let a = store.get_or_create_entity(Some("author"), None);
        let b = store.get_or_create_entity(Some("author"), None);
        assert_eq!(a, b);
        assert_eq!(store.entities().len(), 1);
    }

    #[test]
    fn productive_exophor_is_never_deduplicated() {
        let mut store = EntityStore::new("d1");
        let a = store.get_or_create_entity(Some("unspecified:person"), None);
        let b = store.get_or_create_entity(Some("unspecified:person"), None);
        assert_ne!(a, b);
        assert_eq!(store.entities().len(), 2);
    }

    #[test]
    fn requested_eid_collision_reallocates() {
        let mut store = EntityStore::new("d1");
        let a = store.get_or_create_entity(None, Some(4));
        assert_eq!(a, 4);
        let b = store.get_or_create_entity(None, Some(4));
        assert_eq!(b, 5);
        let c = store.get_or_create_entity(None, None);
        assert_eq!(c, 6);
    }

    #[test]
    fn certain_link_overrides_uncertain() {
        let mut store = EntityStore::new("d1");
        let dtid = store.get_or_create_mention(&phrase(0, "Ava", true));
        let eid = store.get_or_create_entity(None, None);
        store.add_mention(eid, dtid, true);
        assert!(store.mention(dtid).unwrap().eids_unc.contains(&eid));
        store.add_mention(eid, dtid, false);
        let mention = store.mention(dtid).unwrap();
        assert!(mention.eids.contains(&eid));
        assert!(!mention.eids_unc.contains(&eid));
        // uncertain after certain is a no-op
        store.add_mention(eid, dtid, true);
        let mention = store.mention(dtid).unwrap();
        assert!(mention.eids.contains(&eid));
        assert!(!mention.eids_unc.contains(&eid));
    }

    #[test]
    fn entity_flags_are_tri_state() {
        let mut store = EntityStore::new("d1");
        let eid = store.get_or_create_entity(None, None);
        assert_eq!(store.entity(eid).unwrap().is_nominal, None);
        let a = store.get_or_create_mention(&phrase(0, "Ava", true));
        store.add_mention(eid, a, false);
        assert_eq!(store.entity(eid).unwrap().is_nominal, Some(true));
        let b = store.get_or_create_mention(&phrase(1, "ran", false));
        store.add_mention(eid, b, false);
        assert_eq!(store.entity(eid).unwrap().is_nominal, Some(false));
        // once false, stays false
        let c = store.get_or_create_mention(&phrase(2, "Eve", true));
        store.add_mention(eid, c, false);
        assert_eq!(store.entity(eid).unwrap().is_nominal, Some(false));
    }

    #[test]
    fn merge_relinks_and_deletes_target() {
        let mut store = EntityStore::new("d1");
        let a = store.get_or_create_mention(&phrase(0, "Ava", true));
        let b = store.get_or_create_mention(&phrase(1, "she", true));
        let (ea, eb) = (0, 1);
        let deleted = store.merge(a, Some(b), ea, eb, false);
        assert_eq!(deleted, Some(eb));
        assert!(store.entity(eb).is_none());
        let entity = store.entity(ea).unwrap();
        assert!(entity.mentions.contains(&a) && entity.mentions.contains(&b));
        assert!(!store.mention(b).unwrap().eids.contains(&eb));
    }

    #[test]
    fn uncertain_link_blocks_merge() {
        let mut store = EntityStore::new("d1");
        let a = store.get_or_create_mention(&phrase(0, "Ava", true));
        let b = store.get_or_create_mention(&phrase(1, "she", true));
        let deleted = store.merge(a, Some(b), 0, 1, true);
        assert_eq!(deleted, None);
        assert!(store.entity(1).is_some());
        // cross-links exist but are uncertain
        assert!(store.mention(b).unwrap().eids_unc.contains(&0));
        assert!(store.mention(a).unwrap().eids_unc.contains(&1));
    }

    #[test]
    fn same_entity_triangle_promotion() {
        let mut store = EntityStore::new("d1");
        let a = store.get_or_create_mention(&phrase(0, "Ava", true));
        let b = store.get_or_create_mention(&phrase(1, "she", true));
        let eid = 0;
        // b uncertainly linked to a's entity
        store.add_mention(eid, b, true);
        let deleted = store.merge(a, Some(b), eid, eid, false);
        assert_eq!(deleted, None);
        let mention = store.mention(b).unwrap();
        assert!(mention.eids.contains(&eid));
        assert!(!mention.eids_unc.contains(&eid));
    }

    #[test]
    fn conflicting_exophors_block_merge() {
        let mut store = EntityStore::new("d1");
        let a = store.get_or_create_mention(&phrase(0, "I", true));
        let b = store.get_or_create_mention(&phrase(1, "you", true));
        let ea = store.get_or_create_entity(Some("author"), None);
        let eb = store.get_or_create_entity(Some("reader"), None);
        store.add_mention(ea, a, false);
        store.add_mention(eb, b, false);
        let deleted = store.merge(a, Some(b), ea, eb, false);
        assert_eq!(deleted, None);
        assert!(store.entity(ea).is_some());
        assert!(store.entity(eb).is_some());
    }

    #[test]
    fn merge_adopts_target_exophor() {
        let mut store = EntityStore::new("d1");
        let a = store.get_or_create_mention(&phrase(0, "I", true));
        let eb = store.get_or_create_entity(Some("author"), None);
        let ea = *store.mention(a).unwrap().eids.iter().next().unwrap();
        let deleted = store.merge(a, None, ea, eb, false);
        assert_eq!(deleted, Some(eb));
        assert_eq!(store.entity(ea).unwrap().exophor.as_deref(), Some("author"));
    }
}
