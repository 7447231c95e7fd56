// Rule tables for the heuristic classifier.
//
// Every word list the classifier consults lives here as data: stop words,
// noun suffixes, suspicious fragment patterns, verb/conjugation endings and
// adjective words/endings. `RuleSet` is the serializable form (what
// `kotonami rules` dumps and `KOTONAMI_RULES_PATH` loads); `RuleTables` is
// the compiled form the classifier actually queries.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// Version tag of the built-in tables. Bump when any list changes.
pub const BUILTIN_VERSION: &str = "ja-heuristic-1";

const STOP_WORDS: &[&str] = &[
    // pronouns and demonstratives
    "これ", "それ", "あれ", "この", "その", "あの", "ここ", "そこ", "あそこ",
    "こちら", "どこ", "だれ", "なに", "なん", "なんの", "いつ", "どうして",
    // particles
    "が", "の", "を", "に", "へ", "と", "から", "より", "で", "や", "は",
    "ので", "のに", "ば", "て", "って", "でも", "し", "だけ", "だの",
    "けど", "けれど", "けれども", "だろう", "でしょう", "ながら",
    // auxiliaries
    "です", "ます", "でした", "ました", "だった", "ぬ", "た", "う", "よう",
    "ない", "せる", "させる", "れる", "られる", "しまう", "ください",
    "らしい", "みたい", "そう", "べき", "はず", "なければ",
    // verb stems
    "いる", "ある", "する", "なる", "くる", "いく", "できる",
    "てる", "たい", "たら", "なら", "られ", "させ",
    // adverbs
    "もう", "まだ", "また", "さらに", "なお", "とても", "かなり",
    "すごく", "とっても", "ちょっと", "あまり", "もっと",
    // conjunctions
    "しかし", "だが", "ただし", "ただ", "なので", "したがって",
    "その上", "それから", "それで", "それでは", "そのため", "だから",
    "つまり", "すなわち", "たとえば", "だけど", "ところで", "さて",
    "ならびに", "および", "または", "あるいは",
    // interjections and sentence-final fragments
    "じゃ", "しま", "せん", "わな", "すね", "かな", "よね", "しみ",
    "うん", "えっ", "はて", "はい", "いや", "おー", "おお", "おっ",
    "わ", "よ", "ね", "な", "のよ", "のね", "わよ", "わね", "かしら",
    // generic function nouns
    "こと", "もの", "ため", "ところ", "やつ", "わけ", "とき", "ほう",
    "さ", "み", "げ", "まま", "ごと", "がち", "っぽい", "がたい",
    // platform artifacts
    "RT", "http", "https", "co", "jp", "com", "www",
    "ツイート", "リツイート", "フォロー", "リプ", "いいね",
];

const NOUN_SUFFIXES: &[&str] = &[
    "性", "化", "者", "手", "師", "家", "員", "長", "様", "氏",
    "産", "人", "的", "界", "場", "市", "県", "都", "府", "党",
];

// Anchored at the token start: a one or two kana fragment glued to a copula
// is a segmentation accident, not a word.
const SUSPICIOUS_PATTERNS: &[&str] = &[
    "^しみです", "^うんです", "^かなです", "^よねです", "^じゃです", "^えっです",
    "^[ぁ-んー]{1,2}です", "^[ぁ-んー]{1,2}ます",
];

const VERB_ENDINGS: &[&str] = &[
    "する", "せる", "させる", "れる", "られる", "しまう",
    "なる", "たい", "べき", "ます", "ました", "ません",
    "ている", "ていた", "ていない",
];

const CONJUGATION_ENDINGS: &[&str] = &[
    "う", "く", "ぐ", "す", "つ", "ぬ", "ぶ", "む", "る",
    "った", "いた", "いだ", "した", "んだ",
    "って", "いて", "いで", "して", "んで",
];

const ADJECTIVE_WORDS: &[&str] = &[
    "いい", "よい", "すごい", "でかい", "ちいさい", "小さい", "大きい",
    "赤い", "青い", "白い", "黒い", "美しい", "醜い", "遅い", "速い",
];

const ADJECTIVE_ENDINGS: &[&str] = &[
    "い", "かった", "くない", "くて", "ければ",
    "そう", "すぎる", "すぎ", "げ", "み",
    "的", "らしい", "っぽい", "みたい",
];

// Adjective endings that yield to the noun test: "経済的" is a noun first.
const NOUN_PREFERRED_ENDINGS: &[&str] = &["的"];

/// Serializable rule set: plain string lists, suitable for JSON files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub version: String,
    pub stop_words: Vec<String>,
    pub noun_suffixes: Vec<String>,
    pub suspicious_patterns: Vec<String>,
    pub verb_endings: Vec<String>,
    pub conjugation_endings: Vec<String>,
    pub adjective_words: Vec<String>,
    pub adjective_endings: Vec<String>,
    /// Subset of `adjective_endings` that is skipped when the noun test
    /// already accepts the token.
    #[serde(default)]
    pub noun_preferred_endings: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

impl RuleSet {
    /// The rule set compiled into the binary.
    pub fn builtin() -> Self {
        Self {
            version: BUILTIN_VERSION.to_string(),
            stop_words: owned(STOP_WORDS),
            noun_suffixes: owned(NOUN_SUFFIXES),
            suspicious_patterns: owned(SUSPICIOUS_PATTERNS),
            verb_endings: owned(VERB_ENDINGS),
            conjugation_endings: owned(CONJUGATION_ENDINGS),
            adjective_words: owned(ADJECTIVE_WORDS),
            adjective_endings: owned(ADJECTIVE_ENDINGS),
            noun_preferred_endings: owned(NOUN_PREFERRED_ENDINGS),
        }
    }

    /// Read a rule set from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse rule file {}", path.display()))
    }
}

/// Compiled rule tables queried by the classifier.
#[derive(Debug, Clone)]
pub struct RuleTables {
    source: RuleSet,
    stop_words: HashSet<String>,
    adjective_words: HashSet<String>,
    suspicious: Vec<Regex>,
}

impl RuleTables {
    /// Compile a rule set. Fails only if a suspicious pattern is not a valid regex.
    pub fn compile(source: RuleSet) -> Result<Self> {
        let suspicious = source
            .suspicious_patterns
            .iter()
            .map(|p| {
                Regex::new(p).with_context(|| format!("Invalid suspicious pattern: {p}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            stop_words: source.stop_words.iter().cloned().collect(),
            adjective_words: source.adjective_words.iter().cloned().collect(),
            suspicious,
            source,
        })
    }

    /// The built-in tables. The patterns are fixed literals, so compiling
    /// them cannot fail; a broken literal is caught by the unit tests.
    pub fn builtin() -> Self {
        Self::compile(RuleSet::builtin()).unwrap_or_else(|e| {
            panic!("built-in rule tables failed to compile: {e:#}")
        })
    }

    /// Load from a JSON file when a path is given, otherwise use the built-ins.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::compile(RuleSet::from_json_file(p)?),
            None => Ok(Self::builtin()),
        }
    }

    pub fn version(&self) -> &str {
        &self.source.version
    }

    /// The uncompiled lists these tables were built from.
    pub fn rule_set(&self) -> &RuleSet {
        &self.source
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    pub fn is_suspicious(&self, word: &str) -> bool {
        self.suspicious.iter().any(|re| re.is_match(word))
    }

    pub fn noun_suffix(&self, word: &str) -> Option<&str> {
        ends_with_any(word, &self.source.noun_suffixes)
    }

    pub fn verb_ending(&self, word: &str) -> Option<&str> {
        ends_with_any(word, &self.source.verb_endings)
    }

    pub fn conjugation_ending(&self, word: &str) -> Option<&str> {
        ends_with_any(word, &self.source.conjugation_endings)
    }

    pub fn is_adjective_word(&self, word: &str) -> bool {
        self.adjective_words.contains(word)
    }

    /// All adjective endings the word carries, in table order.
    pub fn adjective_endings<'a>(&'a self, word: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.source
            .adjective_endings
            .iter()
            .map(String::as_str)
            .filter(move |e| word.ends_with(e))
    }

    pub fn prefers_noun(&self, ending: &str) -> bool {
        self.source.noun_preferred_endings.iter().any(|e| e == ending)
    }
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::builtin()
    }
}

fn ends_with_any<'a>(word: &str, endings: &'a [String]) -> Option<&'a str> {
    endings
        .iter()
        .find(|e| word.ends_with(e.as_str()))
        .map(String::as_str)
}
