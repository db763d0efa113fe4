//! Conflict resolution and the top-level entry point.
//!
//! [`ConflictResolver`] picks one winner per span. [`SkillResolver`] is the
//! context object callers hold: it owns the configuration and word vectors,
//! borrows the skill database, and runs the whole pass:
//!
//! 1. Build the skill × token corpus
//! 2. Cluster co-occurring tokens into spans
//! 3. Score every competitor of every span
//! 4. Keep one winner per span

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::{CoOccurrenceClusterer, Span};
use crate::config::{ResolverConfig, DEFAULT_OVERRIDE_THRESHOLD};
use crate::error::Result;
use crate::matrix::{Corpus, CorpusBuilder, RowLookup};
use crate::scoring::{NoVectors, Scorer, WordVectors};
use crate::types::{join_text, CandidateMatch, Document, MatchType, ScoredMatch, SkillDb, Token};

// ============================================================================
// ConflictResolver — one winner per span
// ============================================================================

/// Selects a single winning candidate for each span
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver {
    override_threshold: f64,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_THRESHOLD)
    }
}

impl ConflictResolver {
    /// Create a resolver with the given one-token n-gram override threshold
    pub fn new(override_threshold: f64) -> Self {
        Self { override_threshold }
    }

    /// Score the competitors of every span and keep one winner per span,
    /// in span order.
    pub fn resolve<V: WordVectors + ?Sized>(
        &self,
        tokens: &[Token],
        spans: &[Span],
        corpus: &Corpus,
        lookup: &RowLookup,
        scorer: &Scorer<'_, V>,
    ) -> Result<Vec<ScoredMatch>> {
        // Token -> rows claiming it
        let claims = corpus.matrix.transpose();
        let mut winners = Vec::with_capacity(spans.len());

        for span in spans {
            let mut rows: Vec<usize> = span
                .tokens()
                .iter()
                .flat_map(|&t| claims.row_indices(t).iter().map(|&r| r as usize))
                .collect();
            rows.sort_unstable();
            rows.dedup();

            let scored = rows
                .into_iter()
                .map(|row| scorer.score(tokens, span, row, corpus, lookup))
                .collect::<Result<Vec<_>>>()?;

            if let Some(winner) = self.select(scored) {
                debug_event!(
                    skill = %winner.skill_id,
                    kind = %winner.match_type,
                    score = winner.score,
                    tokens = ?winner.doc_node_id,
                    "span winner"
                );
                winners.push(winner);
            }
        }

        Ok(winners)
    }

    /// Pick the winner among scored competitors of one span.
    ///
    /// When one-token n-grams compete with another match type, the last
    /// one-token n-gram (in row order) that covers more than one token and
    /// reaches the override threshold replaces the arg-max winner.
    pub fn select(&self, mut scored: Vec<ScoredMatch>) -> Option<ScoredMatch> {
        let mut winner = argmax(&scored)?;

        let has_ngram = scored
            .iter()
            .any(|s| s.match_type == MatchType::OneTokenNgram);
        let mixed = scored
            .iter()
            .any(|s| s.match_type != scored[0].match_type);

        if has_ngram && mixed {
            for (i, s) in scored.iter().enumerate() {
                if s.match_type == MatchType::OneTokenNgram
                    && s.overlap_length > 1
                    && s.score >= self.override_threshold
                {
                    winner = i;
                }
            }
        }

        Some(scored.swap_remove(winner))
    }
}

/// Index of the first maximum score
fn argmax(scored: &[ScoredMatch]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, s) in scored.iter().enumerate() {
        match best {
            Some(b) if s.score <= scored[b].score => {}
            _ => best = Some(i),
        }
    }
    best
}

// ============================================================================
// SkillResolver — entry point
// ============================================================================

/// Resolved skills of one document, filtered by the acceptance threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Document text rebuilt from its tokens
    pub text: String,
    /// Winners of the n-gram candidate stream
    pub ngram_scored: Vec<ScoredMatch>,
    /// Winners of the single-token candidate stream
    pub unigram_scored: Vec<ScoredMatch>,
}

/// Resolution context: skill database, configuration and word vectors.
///
/// Nothing here is mutated by a resolution pass, so one resolver can serve
/// any number of documents.
#[derive(Debug, Clone)]
pub struct SkillResolver<'a, V = NoVectors> {
    skill_db: &'a SkillDb,
    config: ResolverConfig,
    vectors: V,
}

impl<'a> SkillResolver<'a, NoVectors> {
    /// Create a resolver without word vectors.
    ///
    /// Fails if the configuration does not validate.
    pub fn new(skill_db: &'a SkillDb, config: ResolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            skill_db,
            config,
            vectors: NoVectors,
        })
    }
}

impl<'a, V: WordVectors> SkillResolver<'a, V> {
    /// Use a word-vector model for single-token similarity
    pub fn with_vectors<W: WordVectors>(self, vectors: W) -> SkillResolver<'a, W> {
        SkillResolver {
            skill_db: self.skill_db,
            config: self.config,
            vectors,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn skill_db(&self) -> &SkillDb {
        self.skill_db
    }

    /// Resolve overlapping candidates into one scored match per span.
    ///
    /// No score filtering is applied. An empty candidate list gives an
    /// empty result.
    pub fn resolve(&self, tokens: &[Token], matches: &[CandidateMatch]) -> Result<Vec<ScoredMatch>> {
        if matches.is_empty() {
            return Ok(Vec::new());
        }

        let (corpus, lookup) = {
            trace_stage!("corpus");
            CorpusBuilder::new().build(tokens.len(), matches)?
        };
        debug_event!(rows = corpus.num_rows(), tokens = tokens.len(), "built corpus");

        let spans = {
            trace_stage!("cluster");
            CoOccurrenceClusterer::new(self.config.token_dist).cluster(&corpus)
        };

        trace_stage!("resolve");
        let scorer = Scorer::new(self.skill_db, &self.vectors)
            .with_late_match_penalty(self.config.late_match_penalty);
        ConflictResolver::new(self.config.override_threshold)
            .resolve(tokens, &spans, &corpus, &lookup, &scorer)
    }

    /// Resolve the n-gram and single-token candidate streams separately and
    /// keep the winners scoring at least the acceptance threshold.
    pub fn annotate(
        &self,
        tokens: &[Token],
        ngram_matches: &[CandidateMatch],
        unigram_matches: &[CandidateMatch],
    ) -> Result<Annotation> {
        let threshold = self.config.acceptance_threshold;
        let accept = |matches: Vec<ScoredMatch>| -> Vec<ScoredMatch> {
            matches.into_iter().filter(|m| m.score >= threshold).collect()
        };

        Ok(Annotation {
            text: join_text(tokens),
            ngram_scored: accept(self.resolve(tokens, ngram_matches)?),
            unigram_scored: accept(self.resolve(tokens, unigram_matches)?),
        })
    }
}

impl<'a, V: WordVectors + Sync> SkillResolver<'a, V> {
    /// Resolve many documents in parallel. Results keep input order.
    pub fn resolve_batch(&self, documents: &[Document]) -> Vec<Result<Vec<ScoredMatch>>> {
        documents
            .par_iter()
            .map(|doc| self.resolve(&doc.tokens, &doc.candidates))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::SkillEntry;

    fn make_tokens(words: &[&str]) -> Vec<Token> {
        let mut offset = 0;
        words
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let token = Token::new(*w, w.to_lowercase(), offset, offset + w.len(), i);
                offset += w.len() + 1;
                token
            })
            .collect()
    }

    fn make_db() -> SkillDb {
        vec![
            ("ML", SkillEntry::new("Machine Learning", "machine learning", "Hard Skill")),
            (
                "MLE",
                SkillEntry::new("Machine Learning Engineering", "machine learning engineering", "Hard Skill"),
            ),
            ("LRN", SkillEntry::new("Learning", "learning", "Soft Skill")),
            ("PY", SkillEntry::new("Python", "python", "Hard Skill")),
        ]
        .into_iter()
        .collect()
    }

    fn scored(skill: &str, ty: MatchType, score: f64, len: usize) -> ScoredMatch {
        ScoredMatch {
            skill_id: skill.to_string(),
            doc_node_id: (0..len).collect(),
            doc_node_value: String::new(),
            match_type: ty,
            score,
            overlap_length: len,
        }
    }

    #[test]
    fn test_select_argmax_single_type() {
        let winner = ConflictResolver::default()
            .select(vec![
                scored("A", MatchType::OneTokenNgram, 0.4, 1),
                scored("B", MatchType::OneTokenNgram, 0.9, 2),
                scored("C", MatchType::OneTokenNgram, 0.7, 2),
            ])
            .unwrap();
        assert_eq!(winner.skill_id, "B");
    }

    #[test]
    fn test_select_first_max_on_tie() {
        let winner = ConflictResolver::default()
            .select(vec![
                scored("A", MatchType::FullUnigram, 1.0, 1),
                scored("B", MatchType::FullUnigram, 1.0, 1),
            ])
            .unwrap();
        assert_eq!(winner.skill_id, "A");
    }

    #[test]
    fn test_select_override_fires() {
        let winner = ConflictResolver::default()
            .select(vec![
                scored("A", MatchType::OneTokenNgram, 0.8, 2),
                scored("B", MatchType::LowSurfaceForm, 2.0, 2),
            ])
            .unwrap();
        assert_eq!(winner.skill_id, "A");
    }

    #[test]
    fn test_select_override_needs_overlap() {
        let winner = ConflictResolver::default()
            .select(vec![
                scored("A", MatchType::OneTokenNgram, 0.8, 1),
                scored("B", MatchType::LowSurfaceForm, 0.9, 1),
            ])
            .unwrap();
        assert_eq!(winner.skill_id, "B");
    }

    #[test]
    fn test_select_override_needs_threshold() {
        let winner = ConflictResolver::default()
            .select(vec![
                scored("A", MatchType::OneTokenNgram, 0.45, 2),
                scored("B", MatchType::FullUnigram, 1.0, 1),
            ])
            .unwrap();
        assert_eq!(winner.skill_id, "B");
    }

    #[test]
    fn test_select_last_qualifying_override_wins() {
        let winner = ConflictResolver::default()
            .select(vec![
                scored("A", MatchType::OneTokenNgram, 0.9, 3),
                scored("B", MatchType::OneTokenNgram, 0.6, 2),
                scored("C", MatchType::FullUnigram, 1.0, 1),
            ])
            .unwrap();
        assert_eq!(winner.skill_id, "B");
    }

    #[test]
    fn test_select_no_override_without_mix() {
        let winner = ConflictResolver::default()
            .select(vec![
                scored("A", MatchType::OneTokenNgram, 0.9, 3),
                scored("B", MatchType::OneTokenNgram, 0.6, 2),
            ])
            .unwrap();
        assert_eq!(winner.skill_id, "A");
    }

    #[test]
    fn test_select_empty() {
        assert!(ConflictResolver::default().select(Vec::new()).is_none());
    }

    #[test]
    fn test_resolve_full_match() {
        let db = make_db();
        let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
        let tokens = make_tokens(&["machine", "learning", "engineer"]);
        let matches = vec![CandidateMatch::new("ML", MatchType::FullUnigram, vec![0, 1])];

        let result = resolver.resolve(&tokens, &matches).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].score, 1.0);
        assert_eq!(result[0].doc_node_id, vec![0, 1]);
        assert_eq!(result[0].doc_node_value, "machine learning");
    }

    #[test]
    fn test_resolve_ngram_beats_unigram_overlap() {
        let db = make_db();
        let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
        let tokens = make_tokens(&["machine", "learning", "is", "fun"]);
        let matches = vec![
            CandidateMatch::new("MLE", MatchType::OneTokenNgram, vec![0]),
            CandidateMatch::new("MLE", MatchType::OneTokenNgram, vec![1]),
            CandidateMatch::new("LRN", MatchType::LowSurfaceForm, vec![1]),
        ];

        let result = resolver.resolve(&tokens, &matches).unwrap();
        assert_eq!(result.len(), 1);
        // MLE covers two tokens with score 1.9 / 3 >= 0.5
        assert_eq!(result[0].skill_id, "MLE");
        assert_eq!(result[0].overlap_length, 2);
    }

    #[test]
    fn test_resolve_independent_spans() {
        let db = make_db();
        let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
        let tokens = make_tokens(&["python", "and", "machine", "learning"]);
        let matches = vec![
            CandidateMatch::new("ML", MatchType::FullUnigram, vec![2, 3]),
            CandidateMatch::new("PY", MatchType::FullUnigram, vec![0]),
        ];

        let result = resolver.resolve(&tokens, &matches).unwrap();
        let ids: Vec<_> = result.iter().map(|m| m.skill_id.as_str()).collect();
        assert_eq!(ids, vec!["PY", "ML"]);
    }

    #[test]
    fn test_resolve_empty() {
        let db = make_db();
        let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
        let tokens = make_tokens(&["nothing", "here"]);
        assert!(resolver.resolve(&tokens, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_unknown_skill() {
        let db = make_db();
        let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
        let tokens = make_tokens(&["rust"]);
        let matches = vec![CandidateMatch::new("RUST", MatchType::FullUnigram, vec![0])];
        assert_eq!(
            resolver.resolve(&tokens, &matches).unwrap_err(),
            Error::UnknownSkill("RUST".to_string())
        );
    }

    #[test]
    fn test_resolve_override_follows_encoded_row_order() {
        // Rows sort as "AB_oneToken", "A_oneToken", "C_lowSurf"; both n-grams
        // qualify for the override, so the last one in that order wins.
        let db: SkillDb = vec![
            ("A", SkillEntry::new("Deep Learning", "deep learning", "Hard Skill")),
            ("AB", SkillEntry::new("Deep Learning", "deep learning", "Hard Skill")),
            ("C", SkillEntry::new("Learning", "learning", "Soft Skill")),
        ]
        .into_iter()
        .collect();
        let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
        let tokens = make_tokens(&["deep", "learning"]);
        let matches = vec![
            CandidateMatch::new("A", MatchType::OneTokenNgram, vec![0, 1]),
            CandidateMatch::new("AB", MatchType::OneTokenNgram, vec![0, 1]),
            CandidateMatch::new("C", MatchType::LowSurfaceForm, vec![1]),
        ];

        let result = resolver.resolve(&tokens, &matches).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].skill_id, "A");
        assert_eq!(result[0].overlap_length, 2);
    }

    #[test]
    fn test_conflict_resolver_rejects_short_token_slice() {
        let db = make_db();
        let tokens = make_tokens(&["machine", "learning"]);
        let matches = vec![CandidateMatch::new("ML", MatchType::FullUnigram, vec![0, 1])];
        let (corpus, lookup) = CorpusBuilder::new().build(tokens.len(), &matches).unwrap();
        let spans = CoOccurrenceClusterer::default().cluster(&corpus);
        let scorer = Scorer::new(&db, &NoVectors);

        let err = ConflictResolver::default()
            .resolve(&tokens[..1], &spans, &corpus, &lookup, &scorer)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let db = make_db();
        let err = SkillResolver::new(&db, ResolverConfig::new().with_token_dist(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_annotate_filters_by_threshold() {
        let db = make_db();
        let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
        let tokens = make_tokens(&["machine", "learning", "python"]);
        let ngram = vec![
            // 0.9 / 3 = 0.3, below the acceptance threshold
            CandidateMatch::new("MLE", MatchType::OneTokenNgram, vec![1]),
        ];
        let unigram = vec![CandidateMatch::new("PY", MatchType::FullUnigram, vec![2])];

        let annotation = resolver.annotate(&tokens, &ngram, &unigram).unwrap();
        assert_eq!(annotation.text, "machine learning python");
        assert!(annotation.ngram_scored.is_empty());
        assert_eq!(annotation.unigram_scored.len(), 1);
        assert_eq!(annotation.unigram_scored[0].skill_id, "PY");
    }

    #[test]
    fn test_resolve_batch_keeps_order() {
        let db = make_db();
        let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
        let docs = vec![
            Document::new(
                make_tokens(&["python"]),
                vec![CandidateMatch::new("PY", MatchType::FullUnigram, vec![0])],
            ),
            Document::new(make_tokens(&["nothing"]), Vec::new()),
            Document::new(
                make_tokens(&["machine", "learning"]),
                vec![CandidateMatch::new("ML", MatchType::FullUnigram, vec![0, 1])],
            ),
        ];

        let results = resolver.resolve_batch(&docs);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap()[0].skill_id, "PY");
        assert!(results[1].as_ref().unwrap().is_empty());
        assert_eq!(results[2].as_ref().unwrap()[0].skill_id, "ML");
    }
}
