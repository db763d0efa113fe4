//! Candidate scoring
//!
//! This module provides per-match-type scoring and the similarity
//! measures used for single-token skills.

pub mod scorer;
pub mod similarity;

pub use scorer::Scorer;
pub use similarity::{
    one_gram_sim, string_similarity, vector_similarity, InMemoryVectors, NoVectors, WordVectors,
};
