//! Resolve overlapping skill mentions into scored, non-overlapping annotations.
//!
//! Upstream matchers propose candidate skill mentions that may claim the same
//! tokens. This crate groups the candidates into a sparse skill × token
//! corpus, finds the contested spans through token co-occurrence, scores
//! every competitor with a match-type specific rule, and keeps one winner per
//! span.
//!
//! # Quick start
//!
//! ```rust
//! use rapid_skillspan::{
//!     CandidateMatch, MatchType, ResolverConfig, SkillDb, SkillEntry, SkillResolver, Token,
//! };
//!
//! let mut db = SkillDb::new();
//! db.insert("ML", SkillEntry::new("Machine Learning", "machine learning", "Hard Skill"));
//!
//! let tokens = vec![
//!     Token::new("machine", "machine", 0, 7, 0),
//!     Token::new("learning", "learning", 8, 16, 1),
//!     Token::new("engineer", "engineer", 17, 25, 2),
//! ];
//! let matches = vec![CandidateMatch::new("ML", MatchType::FullUnigram, vec![0, 1])];
//!
//! let resolver = SkillResolver::new(&db, ResolverConfig::default()).unwrap();
//! let result = resolver.resolve(&tokens, &matches).unwrap();
//! assert_eq!(result.len(), 1);
//! assert_eq!(result[0].score, 1.0);
//! ```

// ---------------------------------------------------------------------------
// Conditional tracing support
// ---------------------------------------------------------------------------

/// Enter a tracing span for a resolution stage (when the `tracing` feature is
/// enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("resolve_stage", stage = $name).entered();
    };
}

/// Emit a debug event (when the `tracing` feature is enabled).
macro_rules! debug_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

pub mod cluster;
pub mod config;
pub mod error;
pub mod matrix;
pub mod resolver;
pub mod scoring;
pub mod types;

pub use cluster::{CoOccurrenceClusterer, Span};
pub use config::ResolverConfig;
pub use error::{Error, Result};
pub use matrix::{Corpus, CorpusBuilder, CsrMatrix, RowKey, RowLookup};
pub use resolver::{Annotation, ConflictResolver, SkillResolver};
pub use scoring::{InMemoryVectors, NoVectors, Scorer, WordVectors};
pub use types::{CandidateMatch, Document, MatchType, ScoredMatch, SkillDb, SkillEntry, Token};
