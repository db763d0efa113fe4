//! Core data types
//!
//! Tokens come from an external tokenizer, candidate matches from external
//! phrase matchers, and skill entries from an external skill database. The
//! resolver only reads them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A token in the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text as it appears in the document
    pub text: String,
    /// Lemmatized form
    pub lemma: String,
    /// Byte offset where the token starts
    pub start: usize,
    /// Byte offset where the token ends (exclusive)
    pub end: usize,
    /// Position of the token in the document (0-based)
    pub token_idx: usize,
}

impl Token {
    /// Create a new token
    pub fn new(
        text: impl Into<String>,
        lemma: impl Into<String>,
        start: usize,
        end: usize,
        token_idx: usize,
    ) -> Self {
        Self {
            text: text.into(),
            lemma: lemma.into(),
            start,
            end,
            token_idx,
        }
    }
}

/// The matching strategy that proposed a candidate.
///
/// The declaration order is also the order rows of the same skill appear in
/// the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchType {
    /// A full, unambiguous single-token match
    #[serde(rename = "fullUni")]
    FullUnigram,
    /// A match against a low-confidence surface form
    #[serde(rename = "lowSurf")]
    LowSurfaceForm,
    /// A partial match of one token of a multi-token skill name
    #[serde(rename = "oneToken")]
    OneTokenNgram,
}

impl MatchType {
    /// Returns the short tag used in row keys and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullUnigram => "fullUni",
            Self::LowSurfaceForm => "lowSurf",
            Self::OneTokenNgram => "oneToken",
        }
    }

    /// Parse a short tag back into a match type.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "fullUni" => Some(Self::FullUnigram),
            "lowSurf" => Some(Self::LowSurfaceForm),
            "oneToken" => Some(Self::OneTokenNgram),
            _ => None,
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One occurrence of a skill proposed by an upstream matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub skill_id: String,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    /// Token indices claimed by this occurrence, in document order
    pub doc_node_id: Vec<usize>,
}

impl CandidateMatch {
    pub fn new(skill_id: impl Into<String>, match_type: MatchType, doc_node_id: Vec<usize>) -> Self {
        Self {
            skill_id: skill_id.into(),
            match_type,
            doc_node_id,
        }
    }
}

/// A tokenized document together with its candidate matches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub tokens: Vec<Token>,
    pub candidates: Vec<CandidateMatch>,
}

impl Document {
    pub fn new(tokens: Vec<Token>, candidates: Vec<CandidateMatch>) -> Self {
        Self { tokens, candidates }
    }
}

pub(crate) fn join_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A scored candidate for one span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub skill_id: String,
    /// Sorted token indices shared between the candidate and the span
    pub doc_node_id: Vec<usize>,
    /// Surface text of those tokens joined by single spaces
    pub doc_node_value: String,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub score: f64,
    /// Number of tokens shared between the candidate and the span
    #[serde(rename = "len")]
    pub overlap_length: usize,
}

impl ScoredMatch {
    /// Byte range covered by the matched tokens, from the first token's
    /// start to the last token's end.
    pub fn char_span(&self, tokens: &[Token]) -> Option<Range<usize>> {
        let first = tokens.get(*self.doc_node_id.first()?)?;
        let last = tokens.get(*self.doc_node_id.last()?)?;
        Some(first.start..last.end)
    }
}

/// A skill database entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntry {
    /// Display name of the skill
    pub skill_name: String,
    /// Number of tokens in the canonical name
    pub skill_len: usize,
    /// Canonical surface form, space separated
    pub canonical_surface_form: String,
    /// Category of the skill (hard skill, soft skill, certification, ...)
    pub skill_type: String,
}

impl SkillEntry {
    pub fn new(
        skill_name: impl Into<String>,
        canonical_surface_form: impl Into<String>,
        skill_type: impl Into<String>,
    ) -> Self {
        let canonical_surface_form = canonical_surface_form.into();
        let skill_len = canonical_surface_form.split_whitespace().count();
        Self {
            skill_name: skill_name.into(),
            skill_len,
            canonical_surface_form,
            skill_type: skill_type.into(),
        }
    }

    /// Tokens of the canonical name, in order
    pub fn name_tokens(&self) -> impl Iterator<Item = &str> {
        self.canonical_surface_form.split_whitespace()
    }
}

/// Read-only mapping from skill identifier to its entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillDb {
    entries: FxHashMap<String, SkillEntry>,
}

impl SkillDb {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry
    pub fn insert(&mut self, skill_id: impl Into<String>, entry: SkillEntry) {
        self.entries.insert(skill_id.into(), entry);
    }

    /// Look up a skill by identifier
    pub fn get(&self, skill_id: &str) -> Option<&SkillEntry> {
        self.entries.get(skill_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, SkillEntry)> for SkillDb {
    fn from_iter<I: IntoIterator<Item = (K, SkillEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
