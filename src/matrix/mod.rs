//! Sparse matrix construction and representation
//!
//! This module provides the CSR matrix type and the skill × token corpus
//! built from candidate matches.

pub mod corpus;
pub mod csr;

pub use corpus::{Corpus, CorpusBuilder, RowKey, RowLookup};
pub use csr::CsrMatrix;
