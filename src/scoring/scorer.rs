//! Match-type specific scoring of one candidate against one span

use crate::cluster::Span;
use crate::config::DEFAULT_LATE_MATCH_PENALTY;
use crate::error::{Error, Result};
use crate::matrix::{Corpus, RowLookup};
use crate::scoring::similarity::{one_gram_sim, WordVectors};
use crate::types::{MatchType, ScoredMatch, SkillDb, SkillEntry, Token};

/// Scores corpus rows against spans.
///
/// Holds the read-only context every score needs: the skill database, the
/// word-vector model and the late-match penalty.
pub struct Scorer<'a, V: ?Sized> {
    skill_db: &'a SkillDb,
    vectors: &'a V,
    late_match_penalty: f64,
}

impl<'a, V: WordVectors + ?Sized> Scorer<'a, V> {
    /// Create a scorer with the default late-match penalty
    pub fn new(skill_db: &'a SkillDb, vectors: &'a V) -> Self {
        Self {
            skill_db,
            vectors,
            late_match_penalty: DEFAULT_LATE_MATCH_PENALTY,
        }
    }

    /// Set the late-match penalty coefficient
    pub fn with_late_match_penalty(mut self, penalty: f64) -> Self {
        self.late_match_penalty = penalty;
        self
    }

    /// Score corpus row `row` against `span`.
    ///
    /// `tokens` must be the document the corpus was built from; a length
    /// mismatch is an [`Error::InvalidDocument`].
    pub fn score(
        &self,
        tokens: &[Token],
        span: &Span,
        row: usize,
        corpus: &Corpus,
        lookup: &RowLookup,
    ) -> Result<ScoredMatch> {
        if tokens.len() != corpus.document_length() {
            return Err(Error::invalid_document(format!(
                "{} tokens for a corpus of {}",
                tokens.len(),
                corpus.document_length()
            )));
        }

        let key = lookup
            .get(row)
            .ok_or_else(|| Error::unknown_skill(format!("<corpus row {row}>")))?;
        let entry = self
            .skill_db
            .get(&key.skill_id)
            .ok_or_else(|| Error::unknown_skill(key.skill_id.as_str()))?;
        if entry.skill_len == 0 {
            return Err(Error::invalid_skill(key.skill_id.as_str(), "skill_len is 0"));
        }

        // Element-wise product of the span indicator and the corpus row
        let resolved: Vec<usize> = corpus.row_tokens(row).filter(|&t| span.contains(t)).collect();
        let overlap_length = resolved.len();
        let doc_node_value = resolved
            .iter()
            .map(|&t| tokens[t].text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let score = match key.match_type {
            MatchType::OneTokenNgram => self.weighted_ratio(entry, tokens, &resolved),
            MatchType::FullUnigram => 1.0,
            MatchType::LowSurfaceForm if entry.skill_len > 1 => overlap_length as f64,
            MatchType::LowSurfaceForm => {
                one_gram_sim(self.vectors, &doc_node_value, &entry.canonical_surface_form)
            }
        };

        Ok(ScoredMatch {
            skill_id: key.skill_id.clone(),
            doc_node_id: resolved,
            doc_node_value,
            match_type: key.match_type,
            score,
            overlap_length,
        })
    }

    /// Position-weighted share of the skill name covered by the matched
    /// lemmas: each lemma found at name position p adds `1 - penalty * p`.
    fn weighted_ratio(&self, entry: &SkillEntry, tokens: &[Token], resolved: &[usize]) -> f64 {
        let name: Vec<&str> = entry.name_tokens().collect();
        let total: f64 = resolved
            .iter()
            .filter_map(|&t| {
                let lemma = tokens[t].lemma.as_str();
                let position = name.iter().position(|n| *n == lemma);
                if position.is_none() {
                    debug_event!(lemma, skill = %entry.skill_name, "lemma not in skill name");
                }
                position
            })
            .map(|p| 1.0 - self.late_match_penalty * p as f64)
            .sum();

        total / entry.skill_len as f64
    }
}
