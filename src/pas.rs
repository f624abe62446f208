//! Predicate-argument structures.
//!
//! A PAS belongs to its predicate phrase and maps each case role to the
//! arguments discovered for it, in discovery order and without duplicates.
//! Arguments are either textual (a phrase somewhere in the document) or
//! special (an exophor). Textual arguments record how their relation to
//! the predicate was established: overt, dependency-inferred, or
//! intra-/inter-sentential.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::phrase::Phrase;

/// Combination mode of a relation marker or argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgMode {
    /// No combination marker.
    #[default]
    Plain,
    /// Conjunctive combination with the other arguments of the role.
    And,
    /// Disjunctive combination.
    Or,
    /// The relation itself may not hold.
    Uncertain,
}

impl ArgMode {
    /// The marker string as annotated.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ArgMode::Plain => "",
            ArgMode::And => "AND",
            ArgMode::Or => "OR",
            ArgMode::Uncertain => "?",
        }
    }
}

/// How a textual argument's relation to its predicate was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepType {
    /// The argument is a dependency child of the predicate and its case
    /// feature matches the role: the relation was syntactically explicit.
    Overt,
    /// The argument is a dependency neighbor of the predicate but the case
    /// had to be inferred.
    Dep,
    /// Same sentence, no direct dependency link.
    Intra,
    /// Different sentence.
    Inter,
    /// Non-textual referent.
    Exo,
}

impl DepType {
    /// Label used in annotated data and diagnostics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DepType::Overt => "overt",
            DepType::Dep => "dep",
            DepType::Intra => "intra",
            DepType::Inter => "inter",
            DepType::Exo => "exo",
        }
    }
}

impl std::fmt::Display for DepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An argument realized by a phrase in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextualArgument {
    /// Sentence ID of the argument phrase.
    pub sid: String,
    /// Phrase index within its sentence.
    pub tid: usize,
    /// Document-wide phrase ID.
    pub dtid: usize,
    /// Document-wide token ID of the content token.
    pub dmid: usize,
    /// Surface form.
    pub surface: String,
    /// How the relation was established.
    pub dep_type: DepType,
    /// Combination mode.
    pub mode: ArgMode,
    /// Whether the argument is adverbial/omittable.
    pub optional: bool,
}

/// An argument realized by an exophor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialArgument {
    /// Exophor label.
    pub exophor: String,
    /// ID of the exophor's entity.
    pub eid: usize,
    /// Combination mode.
    pub mode: ArgMode,
    /// Whether the argument is adverbial/omittable.
    pub optional: bool,
}

/// An argument of a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    /// A phrase in the document.
    Textual(TextualArgument),
    /// An exophor.
    Special(SpecialArgument),
}

impl Argument {
    /// How the relation was established. Always [`DepType::Exo`] for
    /// special arguments.
    #[must_use]
    pub fn dep_type(&self) -> DepType {
        match self {
            Argument::Textual(arg) => arg.dep_type,
            Argument::Special(_) => DepType::Exo,
        }
    }

    /// Combination mode.
    #[must_use]
    pub fn mode(&self) -> ArgMode {
        match self {
            Argument::Textual(arg) => arg.mode,
            Argument::Special(arg) => arg.mode,
        }
    }

    /// Whether the argument is adverbial/omittable.
    #[must_use]
    pub fn optional(&self) -> bool {
        match self {
            Argument::Textual(arg) => arg.optional,
            Argument::Special(arg) => arg.optional,
        }
    }

    fn set_optional(&mut self) {
        match self {
            Argument::Textual(arg) => arg.optional = true,
            Argument::Special(arg) => arg.optional = true,
        }
    }

    /// Whether the argument is an exophor.
    #[must_use]
    pub fn is_special(&self) -> bool {
        matches!(self, Argument::Special(_))
    }

    /// The textual variant, if any.
    #[must_use]
    pub fn as_textual(&self) -> Option<&TextualArgument> {
        match self {
            Argument::Textual(arg) => Some(arg),
            Argument::Special(_) => None,
        }
    }

    /// The special variant, if any.
    #[must_use]
    pub fn as_special(&self) -> Option<&SpecialArgument> {
        match self {
            Argument::Special(arg) => Some(arg),
            Argument::Textual(_) => None,
        }
    }

    /// Whether two arguments denote the same target: same phrase for
    /// textual arguments, same exophor label for special ones.
    #[must_use]
    pub fn same_target(&self, other: &Argument) -> bool {
        match (self, other) {
            (Argument::Textual(a), Argument::Textual(b)) => a.sid == b.sid && a.dtid == b.dtid,
            (Argument::Special(a), Argument::Special(b)) => a.exophor == b.exophor,
            _ => false,
        }
    }
}

impl std::fmt::Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Argument::Textual(arg) => write!(f, "{}", arg.surface),
            Argument::Special(arg) => write!(f, "{}", arg.exophor),
        }
    }
}

/// A predicate-argument structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pas {
    /// Document-wide phrase ID of the predicate.
    pub dtid: usize,
    /// Sentence ID of the predicate.
    pub sid: String,
    /// Document-wide token ID of the predicate's content token.
    pub dmid: usize,
    /// Case role to arguments, in discovery order.
    pub arguments: BTreeMap<String, Vec<Argument>>,
}

impl Pas {
    /// Create an empty PAS for a predicate phrase.
    #[must_use]
    pub fn new(predicate: &Phrase) -> Self {
        Self {
            dtid: predicate.dtid,
            sid: predicate.sid.clone(),
            dmid: predicate.dmid,
            arguments: BTreeMap::new(),
        }
    }

    /// Append a textual argument for the case, classifying its dependency
    /// relation to the predicate. A duplicate of an argument already
    /// recorded for the case is skipped.
    pub fn add_argument(&mut self, case: &str, arg: &Phrase, predicate: &Phrase, mode: ArgMode) {
        let argument = Argument::Textual(TextualArgument {
            sid: arg.sid.clone(),
            tid: arg.tid,
            dtid: arg.dtid,
            dmid: arg.dmid,
            surface: arg.surface(),
            dep_type: classify_dep(predicate, arg, case),
            mode,
            optional: false,
        });
        let args = self.arguments.entry(case.to_string()).or_default();
        if !args.iter().any(|a| a.same_target(&argument)) {
            args.push(argument);
        }
    }

    /// Append a special (exophoric) argument for the case. A duplicate of
    /// an exophor already recorded for the case is skipped.
    pub fn add_special_argument(&mut self, case: &str, exophor: &str, eid: usize, mode: ArgMode) {
        let argument = Argument::Special(SpecialArgument {
            exophor: exophor.to_string(),
            eid,
            mode,
            optional: false,
        });
        let args = self.arguments.entry(case.to_string()).or_default();
        if !args.iter().any(|a| a.same_target(&argument)) {
            args.push(argument);
        }
    }

    /// Mark every argument recorded for the case as optional.
    ///
    /// Annotated when the case additionally carries an explicit
    /// no-referent marker. With no prior argument the marker is ignored.
    pub fn set_arguments_optional(&mut self, case: &str) {
        let Some(args) = self.arguments.get_mut(case).filter(|args| !args.is_empty()) else {
            log::info!("{}: no preceding argument found. '{}' is ignored", self.sid, config::NO_REFERENT);
            return;
        };
        for arg in args {
            arg.set_optional();
            log::info!("{}: marked {} as optional", self.sid, arg);
        }
    }

    /// Whether no argument has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arguments.values().all(Vec::is_empty)
    }

    /// Total number of recorded arguments.
    #[must_use]
    pub fn argument_count(&self) -> usize {
        self.arguments.values().map(Vec::len).sum()
    }
}

/// Classify how an argument relates to its predicate.
///
/// A dependency child whose own case feature matches the role (under the
/// aliasing table) is overt; any other dependency neighbor is inferred;
/// otherwise the split is intra- vs. inter-sentential.
#[must_use]
pub fn classify_dep(predicate: &Phrase, arg: &Phrase, case: &str) -> DepType {
    let same_sentence = arg.sid == predicate.sid;
    if same_sentence && predicate.children.contains(&arg.tid) {
        let dep_case = arg.features.dep_case.as_deref().unwrap_or("");
        if config::matches_overt(case, dep_case) {
            DepType::Overt
        } else {
            DepType::Dep
        }
    } else if same_sentence && predicate.parent == Some(arg.tid) {
        DepType::Dep
    } else if same_sentence {
        DepType::Intra
    } else {
        DepType::Inter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ParsedPhrase, ParsedSentence, ParsedToken};
    use crate::sentence::Sentence;

    // "Ava | tossed | a coin": phrases 0 and 2 depend on 1.
    fn sentence() -> Sentence {
        let parsed = ParsedSentence::new(
            "s1",
            vec![
                ParsedPhrase::new(vec![ParsedToken::content("Ava", "noun")])
                    .with_parent(1)
                    .with_feature("nominal")
                    .with_feature("case:nom"),
                ParsedPhrase::new(vec![ParsedToken::content("tossed", "verb")])
                    .with_feature("predicative"),
                ParsedPhrase::new(vec![
                    ParsedToken::new("a", "det"),
                    ParsedToken::content("coin", "noun"),
                ])
                .with_parent(1)
                .with_feature("nominal")
                .with_feature("case:acc"),
            ],
        );
        Sentence::from_parsed(parsed, 0, 0, "d1")
    }

    fn other_sentence() -> Sentence {
        let parsed = ParsedSentence::new(
            "s2",
            vec![ParsedPhrase::new(vec![ParsedToken::content("coin", "noun")])
                .with_feature("nominal")],
        );
        Sentence::from_parsed(parsed, 3, 4, "d1")
    }

    #[test]
    fn overt_vs_inferred_classification() {
        let sent = sentence();
        let pred = &sent.phrases[1];
        assert_eq!(classify_dep(pred, &sent.phrases[0], "nom"), DepType::Overt);
        assert_eq!(classify_dep(pred, &sent.phrases[2], "acc"), DepType::Overt);
        // role disagrees with the recorded case feature
        assert_eq!(classify_dep(pred, &sent.phrases[0], "dat"), DepType::Dep);
        // uncertain marker is stripped before matching
        assert_eq!(classify_dep(pred, &sent.phrases[0], "nom~"), DepType::Overt);
    }

    #[test]
    fn parent_is_dependency_inferred() {
        let sent = sentence();
        let child = &sent.phrases[0];
        let pred = &sent.phrases[1];
        assert_eq!(classify_dep(child, pred, "nom"), DepType::Dep);
    }

    #[test]
    fn sentence_split_classification() {
        let sent = sentence();
        // phrases 0 and 2 are siblings, not dependency neighbors
        assert_eq!(classify_dep(&sent.phrases[0], &sent.phrases[2], "nom"), DepType::Intra);
        let other = other_sentence();
        assert_eq!(classify_dep(&sent.phrases[1], &other.phrases[0], "acc"), DepType::Inter);
    }

    #[test]
    fn duplicate_arguments_are_skipped() {
        let sent = sentence();
        let pred = &sent.phrases[1];
        let mut pas = Pas::new(pred);
        pas.add_argument("nom", &sent.phrases[0], pred, ArgMode::Plain);
        pas.add_argument("nom", &sent.phrases[0], pred, ArgMode::And);
        assert_eq!(pas.arguments["nom"].len(), 1);
        pas.add_special_argument("nom", "unspecified:person", 3, ArgMode::Plain);
        pas.add_special_argument("nom", "unspecified:person", 4, ArgMode::Plain);
        assert_eq!(pas.arguments["nom"].len(), 2);
        assert_eq!(pas.argument_count(), 2);
    }

    #[test]
    fn no_referent_marks_existing_arguments_optional() {
        let sent = sentence();
        let pred = &sent.phrases[1];
        let mut pas = Pas::new(pred);
        pas.add_argument("acc", &sent.phrases[2], pred, ArgMode::Plain);
        pas.set_arguments_optional("acc");
        assert!(pas.arguments["acc"][0].optional());
        // with no prior argument the marker is ignored
        pas.set_arguments_optional("dat");
        assert!(!pas.arguments.contains_key("dat"));
    }
}
