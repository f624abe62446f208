//! Invariant checks over the coreference graph, on crafted scenarios and
//! on randomly generated link sequences.

use pasco::{
    Document, DocumentConfig, ParsedPhrase, ParsedSentence, ParsedToken, RelMarker,
};
use proptest::prelude::*;

/// Every mention/entity link must be mirrored on the other side, with
/// matching certainty, and every referenced entity must be live.
fn assert_bidirectional_consistency(document: &Document) {
    for (dtid, mention) in document.mentions() {
        for eid in &mention.eids {
            let entity = document.entity(*eid).expect("certain eid must be live");
            assert!(
                entity.mentions.contains(dtid),
                "entity {eid} does not list certain mention {dtid}"
            );
        }
        for eid in &mention.eids_unc {
            let entity = document.entity(*eid).expect("uncertain eid must be live");
            assert!(
                entity.mentions_unc.contains(dtid),
                "entity {eid} does not list uncertain mention {dtid}"
            );
        }
    }
    for (eid, entity) in document.entities() {
        for dtid in &entity.mentions {
            let mention = document.mention(*dtid).expect("mention must exist");
            assert!(mention.eids.contains(eid));
            assert!(!mention.eids_unc.contains(eid), "link is both certain and uncertain");
        }
        for dtid in &entity.mentions_unc {
            let mention = document.mention(*dtid).expect("mention must exist");
            assert!(mention.eids_unc.contains(eid));
            assert!(!mention.eids.contains(eid), "link is both certain and uncertain");
        }
    }
}

/// At most one live entity per non-productive exophor label.
fn assert_singleton_exophors(document: &Document) {
    let mut seen = std::collections::HashSet::new();
    for entity in document.entities().values() {
        if let Some(exophor) = entity.exophor.as_deref() {
            if !pasco::config::is_productive_exophor(exophor) {
                assert!(
                    seen.insert(exophor.to_string()),
                    "two live entities share exophor {exophor}"
                );
            }
        }
    }
}

/// No special argument may reference a retired entity ID.
fn assert_no_dangling_argument_eids(document: &Document) {
    for pas in document.pas_list() {
        for args in pas.arguments.values() {
            for arg in args {
                if let Some(special) = arg.as_special() {
                    assert!(
                        document.entity(special.eid).is_some(),
                        "special argument references retired eid {}",
                        special.eid
                    );
                }
            }
        }
    }
}

fn noun(surface: &str) -> ParsedPhrase {
    ParsedPhrase::new(vec![ParsedToken::content(surface, "noun")]).with_feature("nominal")
}

#[test]
fn certain_then_uncertain_chain() {
    // A = B (certain), then C =~ B (uncertain)
    let sentences = vec![
        ParsedSentence::new("c-1", vec![noun("Ava")]),
        ParsedSentence::new("c-2", vec![noun("Ava").with_rel(RelMarker::textual("=", "Ava", "c-1", 0))]),
        ParsedSentence::new("c-3", vec![noun("she").with_rel(RelMarker::textual("=~", "Ava", "c-2", 0))]),
    ];
    let document = Document::new("c", sentences, DocumentConfig::default());
    assert_bidirectional_consistency(&document);

    let a = document.mention(0).unwrap();
    let b = document.mention(1).unwrap();
    let c = document.mention(2).unwrap();
    assert_eq!(a.eids, b.eids);
    let shared = *a.eids.iter().next().unwrap();
    let entity = document.entity(shared).unwrap();
    assert!(entity.mentions_unc.contains(&c.dtid));
    assert!(!c.eids.contains(&shared));
    assert!(c.eids_unc.contains(&shared));
}

#[test]
fn fresh_certain_link_promotes_uncertain_triangle() {
    // B =~ A followed by B = A: the uncertain edges close to certain and
    // a single entity survives.
    let sentences = vec![
        ParsedSentence::new("t-1", vec![noun("Ava")]),
        ParsedSentence::new(
            "t-2",
            vec![noun("her")
                .with_rel(RelMarker::textual("=~", "Ava", "t-1", 0))
                .with_rel(RelMarker::textual("=", "Ava", "t-1", 0))],
        ),
    ];
    let document = Document::new("t", sentences, DocumentConfig::default());
    assert_bidirectional_consistency(&document);

    assert_eq!(document.entities().len(), 1);
    let entity = document.entities().values().next().unwrap();
    assert_eq!(entity.mentions.len(), 2);
    assert!(entity.mentions_unc.is_empty());
    let a = document.mention(0).unwrap();
    let b = document.mention(1).unwrap();
    assert_eq!(a.eids, b.eids);
    assert!(a.eids_unc.is_empty());
    assert!(b.eids_unc.is_empty());
}

#[test]
fn exophor_entities_merge_and_rewrite_arguments() {
    // A special argument records the author entity's eid; a later
    // coreference to the author merges that entity away, and the argument
    // must follow the winner.
    let sentences = vec![
        ParsedSentence::new(
            "x-1",
            vec![ParsedPhrase::new(vec![ParsedToken::content("wrote", "verb")])
                .with_feature("predicative")
                .with_rel(RelMarker::exophoric("nom", "author"))],
        ),
        ParsedSentence::new(
            "x-2",
            vec![noun("I").with_rel(RelMarker::exophoric("=", "author"))],
        ),
    ];
    let document = Document::new("x", sentences, DocumentConfig::default());
    assert_bidirectional_consistency(&document);
    assert_singleton_exophors(&document);
    assert_no_dangling_argument_eids(&document);

    // the original author entity (eid 0) lost to I's entity (eid 1)
    assert!(document.entity(0).is_none());
    let survivor = document.entity(1).unwrap();
    assert_eq!(survivor.exophor.as_deref(), Some("author"));
    assert!(survivor.mentions.contains(&1));

    let wrote = document.phrase("x-1", 0).unwrap();
    let arguments = document.get_arguments(wrote, false, false);
    assert_eq!(arguments["nom"][0].as_special().unwrap().eid, 1);
}

#[test]
fn conflicting_exophors_stay_apart() {
    let sentences = vec![
        ParsedSentence::new("e-1", vec![noun("I").with_rel(RelMarker::exophoric("=", "author"))]),
        ParsedSentence::new(
            "e-2",
            vec![noun("you")
                .with_rel(RelMarker::exophoric("=", "reader"))
                .with_rel(RelMarker::textual("=", "I", "e-1", 0))],
        ),
    ];
    let document = Document::new("e", sentences, DocumentConfig::default());
    assert_bidirectional_consistency(&document);
    assert_singleton_exophors(&document);

    let labels: Vec<&str> = document
        .entities()
        .values()
        .filter_map(|e| e.exophor.as_deref())
        .collect();
    assert!(labels.contains(&"author"));
    assert!(labels.contains(&"reader"));
    // both mentions ended up cross-linked, but the grounded entities
    // themselves were not merged
    assert!(document.entities().len() >= 2);
}

#[test]
fn mentions_are_unique_per_phrase() {
    let sentences = vec![
        ParsedSentence::new("u-1", vec![noun("Ava")]),
        ParsedSentence::new(
            "u-2",
            vec![noun("she")
                .with_rel(RelMarker::textual("=", "Ava", "u-1", 0))
                .with_rel(RelMarker::textual("=~", "Ava", "u-1", 0))],
        ),
    ];
    let document = Document::new("u", sentences, DocumentConfig::default());
    for (dtid, mention) in document.mentions() {
        assert_eq!(*dtid, mention.dtid);
    }
    assert_eq!(document.mentions().len(), 2);
}

// =============================================================================
// Randomized link sequences
// =============================================================================

const EXOPHORS: [&str; 4] = ["author", "reader", "unspecified:person", "[unknown]"];

/// Build a document from a grid of bare phrases plus arbitrary coreference
/// markers, textual or exophoric, certain or uncertain.
fn build_random_document(
    sentence_sizes: &[usize],
    links: &[(usize, usize, bool, usize)],
) -> Document {
    let total: usize = sentence_sizes.iter().sum();
    let sid_of = |dtid: usize| {
        let mut offset = 0;
        for (idx, size) in sentence_sizes.iter().enumerate() {
            if dtid < offset + size {
                return (format!("g-{}", idx + 1), dtid - offset);
            }
            offset += size;
        }
        unreachable!("dtid within total")
    };

    let mut rels: Vec<Vec<RelMarker>> = vec![Vec::new(); total];
    for &(source, target, uncertain, exophor_pick) in links {
        let source = source % total;
        let rel_type = if uncertain { "=~" } else { "=" };
        let marker = if exophor_pick < EXOPHORS.len() {
            RelMarker::exophoric(rel_type, EXOPHORS[exophor_pick])
        } else {
            let (sid, tid) = sid_of(target % total);
            RelMarker::textual(rel_type, "x", sid, tid)
        };
        rels[source].push(marker);
    }

    let mut dtid = 0;
    let mut sentences = Vec::new();
    for (idx, &size) in sentence_sizes.iter().enumerate() {
        let mut phrases = Vec::new();
        for _ in 0..size {
            let mut phrase = noun(&format!("w{dtid}"));
            for rel in rels[dtid].drain(..) {
                phrase = phrase.with_rel(rel);
            }
            phrases.push(phrase);
            dtid += 1;
        }
        sentences.push(ParsedSentence::new(format!("g-{}", idx + 1), phrases));
    }
    Document::new("g", sentences, DocumentConfig::default())
}

proptest! {
    #[test]
    fn random_link_sequences_preserve_invariants(
        sentence_sizes in prop::collection::vec(1usize..4, 1..5),
        links in prop::collection::vec(
            (0usize..64, 0usize..64, any::<bool>(), 0usize..12),
            0..16,
        ),
    ) {
        let document = build_random_document(&sentence_sizes, &links);
        assert_bidirectional_consistency(&document);
        assert_singleton_exophors(&document);
        assert_no_dangling_argument_eids(&document);

        // every mention belongs to at least one entity
        for mention in document.mentions().values() {
            prop_assert!(!mention.all_eids().is_empty());
        }
    }
}
