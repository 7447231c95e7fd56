// Heuristic Japanese keyword classifier.
//
// No dictionary, no statistical model: a token is judged purely on its
// script makeup and its endings, checked against the rule tables. Three
// independent predicates (noun, verb, adjective) each get a say; any one of
// them accepting makes the token a keyword.

use std::fmt;

use serde::Serialize;

use super::clean::clean;
use super::rules::RuleTables;
use super::segment::{is_hiragana, is_ideograph, is_katakana, segment};
use super::traits::KeywordExtractor;

/// The part of speech a token was accepted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WordClass {
    Noun,
    Verb,
    Adjective,
}

impl fmt::Display for WordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WordClass::Noun => "noun",
            WordClass::Verb => "verb",
            WordClass::Adjective => "adjective",
        };
        f.write_str(s)
    }
}

/// Which rule accepted the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Evidence {
    SingleIdeograph,
    NounSuffix,
    ContainsIdeograph,
    Katakana,
    Length,
    VerbEnding,
    Conjugation,
    AdjectiveWord,
    AdjectiveEnding,
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Evidence::SingleIdeograph => "single ideograph",
            Evidence::NounSuffix => "noun suffix",
            Evidence::ContainsIdeograph => "contains ideograph",
            Evidence::Katakana => "katakana",
            Evidence::Length => "length",
            Evidence::VerbEnding => "verb ending",
            Evidence::Conjugation => "conjugation",
            Evidence::AdjectiveWord => "adjective word",
            Evidence::AdjectiveEnding => "adjective ending",
        };
        f.write_str(s)
    }
}

/// A token accepted as a keyword, with the winning predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub class: WordClass,
    pub evidence: Evidence,
}

/// Rule-table driven extractor.
#[derive(Debug, Clone, Default)]
pub struct HeuristicExtractor {
    rules: RuleTables,
}

impl HeuristicExtractor {
    pub fn new(rules: RuleTables) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }

    /// Classify a single token.
    ///
    /// Predicates are tried in the order noun, verb, adjective, so a token
    /// both a noun and an adjective would accept is reported as a noun.
    pub fn classify(&self, token: &str) -> Option<Classification> {
        if self.rules.is_stop_word(token) {
            return None;
        }
        if char_len(token) < 2 && !is_single_ideograph(token) {
            return None;
        }

        self.noun_evidence(token)
            .map(|evidence| Classification { class: WordClass::Noun, evidence })
            .or_else(|| {
                self.verb_evidence(token)
                    .map(|evidence| Classification { class: WordClass::Verb, evidence })
            })
            .or_else(|| {
                self.adjective_evidence(token)
                    .map(|evidence| Classification { class: WordClass::Adjective, evidence })
            })
    }

    pub fn is_keyword(&self, token: &str) -> bool {
        self.classify(token).is_some()
    }

    pub fn is_likely_noun(&self, word: &str) -> bool {
        self.noun_evidence(word).is_some()
    }

    pub fn is_likely_verb(&self, word: &str) -> bool {
        self.verb_evidence(word).is_some()
    }

    pub fn is_likely_adjective(&self, word: &str) -> bool {
        self.adjective_evidence(word).is_some()
    }

    fn noun_evidence(&self, word: &str) -> Option<Evidence> {
        if self.rules.is_stop_word(word) {
            return None;
        }
        match char_len(word) {
            0 => return None,
            1 => return is_single_ideograph(word).then_some(Evidence::SingleIdeograph),
            _ => {}
        }
        if self.rules.is_suspicious(word) {
            return None;
        }
        if self.rules.noun_suffix(word).is_some() {
            return Some(Evidence::NounSuffix);
        }
        // Katakana mixed with ideographs falls under this rule as well.
        if word.chars().any(is_ideograph) {
            return Some(Evidence::ContainsIdeograph);
        }
        if word.chars().all(is_katakana) {
            return Some(Evidence::Katakana);
        }
        Some(Evidence::Length)
    }

    fn verb_evidence(&self, word: &str) -> Option<Evidence> {
        if self.rules.is_stop_word(word) || char_len(word) < 2 {
            return None;
        }
        if self.rules.verb_ending(word).is_some() {
            return Some(Evidence::VerbEnding);
        }
        if ends_with_inflected_stem(word) && self.rules.conjugation_ending(word).is_some() {
            return Some(Evidence::Conjugation);
        }
        None
    }

    fn adjective_evidence(&self, word: &str) -> Option<Evidence> {
        if self.rules.is_stop_word(word) || char_len(word) < 2 {
            return None;
        }
        if self.rules.is_adjective_word(word) {
            return Some(Evidence::AdjectiveWord);
        }
        for ending in self.rules.adjective_endings(word) {
            if self.rules.prefers_noun(ending) && self.is_likely_noun(word) {
                continue;
            }
            return Some(Evidence::AdjectiveEnding);
        }
        None
    }

    /// Clean, segment and classify every token. Rejected tokens carry None.
    pub fn annotate(&self, text: &str) -> Vec<(String, Option<Classification>)> {
        let cleaned = clean(text);
        segment(&cleaned)
            .into_iter()
            .map(|token| (token.to_string(), self.classify(token)))
            .collect()
    }
}

impl KeywordExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let cleaned = clean(text);
        segment(&cleaned)
            .into_iter()
            .filter(|token| self.is_keyword(token))
            .map(str::to_string)
            .collect()
    }
}

fn char_len(word: &str) -> usize {
    word.chars().count()
}

fn is_single_ideograph(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if is_ideograph(c))
}

/// True if the word ends with an ideograph followed by one or more hiragana (行った, 読んで).
fn ends_with_inflected_stem(word: &str) -> bool {
    let mut rev = word.chars().rev().peekable();
    let mut tail = 0;
    while rev.next_if(|c| is_hiragana(*c)).is_some() {
        tail += 1;
    }
    tail > 0 && rev.next().is_some_and(is_ideograph)
}
