//! Skill × token incidence matrix
//!
//! Each row is one (skill, match type) group; a set bit at column t means at
//! least one candidate of that group claims token t.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::iter;

use super::csr::CsrMatrix;
use crate::error::{Error, Result};
use crate::types::{CandidateMatch, MatchType};

/// Identity of a corpus row: the skill plus the matcher that proposed it.
///
/// Keys order by their `"<skill_id>_<tag>"` encoding, byte-wise, so
/// `"AB_oneToken"` sorts before `"A_oneToken"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub skill_id: String,
    pub match_type: MatchType,
}

impl RowKey {
    pub fn new(skill_id: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            skill_id: skill_id.into(),
            match_type,
        }
    }

    /// Recover a key from its `"<skill_id>_<tag>"` encoding.
    ///
    /// Splits on the last underscore so identifiers may contain underscores.
    pub fn parse(encoded: &str) -> Option<Self> {
        let (skill_id, tag) = encoded.rsplit_once('_')?;
        let match_type = MatchType::from_tag(tag)?;
        Some(Self::new(skill_id, match_type))
    }

    fn encoded_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.skill_id
            .bytes()
            .chain(iter::once(b'_'))
            .chain(self.match_type.as_str().bytes())
    }
}

// No tag is a suffix of another, so equal encodings mean equal keys and this
// order agrees with the derived `Eq`.
impl Ord for RowKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.encoded_bytes().cmp(other.encoded_bytes())
    }
}

impl PartialOrd for RowKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.skill_id, self.match_type)
    }
}

/// Maps corpus row index to the group it was built from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowLookup {
    keys: Vec<RowKey>,
}

impl RowLookup {
    /// Key of a row
    pub fn get(&self, row: usize) -> Option<&RowKey> {
        self.keys.get(row)
    }

    /// Iterate over (row, key) pairs in row order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RowKey)> {
        self.keys.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Binary skill × token matrix for one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    pub matrix: CsrMatrix,
}

impl Corpus {
    /// Number of (skill, match type) rows
    pub fn num_rows(&self) -> usize {
        self.matrix.num_rows
    }

    /// Number of tokens in the document
    pub fn document_length(&self) -> usize {
        self.matrix.num_cols
    }

    /// Sorted token indices claimed by a row
    pub fn row_tokens(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.matrix.row_indices(row).iter().map(|&c| c as usize)
    }

    /// Token × token co-occurrence counts: `Corpusᵗ · Corpus`
    pub fn cooccurrence(&self) -> CsrMatrix {
        self.matrix.transpose().matmul(&self.matrix)
    }
}

/// Groups candidate matches into corpus rows
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusBuilder;

impl CorpusBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the corpus and its row lookup.
    ///
    /// Rows are ordered by their encoded [`RowKey`]. Fails on an empty
    /// `doc_node_id`, a token index outside the document, or a document too
    /// long for 32-bit token indices.
    pub fn build(
        &self,
        document_length: usize,
        matches: &[CandidateMatch],
    ) -> Result<(Corpus, RowLookup)> {
        if u32::try_from(document_length).is_err() {
            return Err(Error::invalid_document(format!(
                "document of length {document_length} exceeds the {} token limit",
                u32::MAX
            )));
        }

        let mut groups: BTreeMap<RowKey, Vec<u32>> = BTreeMap::new();

        for candidate in matches {
            validate_candidate(document_length, candidate)?;
            groups
                .entry(RowKey::new(candidate.skill_id.as_str(), candidate.match_type))
                .or_default()
                .extend(candidate.doc_node_id.iter().map(|&t| t as u32));
        }

        // Transposition stores row indices as u32
        if u32::try_from(groups.len()).is_err() {
            return Err(Error::invalid_document(format!(
                "{} corpus rows exceed the {} row limit",
                groups.len(),
                u32::MAX
            )));
        }

        let mut keys = Vec::with_capacity(groups.len());
        let mut rows = Vec::with_capacity(groups.len());
        for (key, tokens) in groups {
            keys.push(key);
            rows.push(tokens);
        }

        let matrix = CsrMatrix::from_binary_rows(document_length, rows);
        Ok((Corpus { matrix }, RowLookup { keys }))
    }
}

fn validate_candidate(document_length: usize, candidate: &CandidateMatch) -> Result<()> {
    if candidate.doc_node_id.is_empty() {
        return Err(Error::invalid_candidate(
            candidate.skill_id.as_str(),
            "empty doc_node_id",
        ));
    }
    if let Some(&bad) = candidate
        .doc_node_id
        .iter()
        .find(|&&t| t >= document_length)
    {
        return Err(Error::invalid_candidate(
            candidate.skill_id.as_str(),
            format!("token index {bad} out of range for document of length {document_length}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matches() -> Vec<CandidateMatch> {
        vec![
            CandidateMatch::new("S2", MatchType::OneTokenNgram, vec![2]),
            CandidateMatch::new("S1", MatchType::OneTokenNgram, vec![0]),
            CandidateMatch::new("S1", MatchType::OneTokenNgram, vec![1]),
            CandidateMatch::new("S1", MatchType::LowSurfaceForm, vec![1]),
        ]
    }

    #[test]
    fn test_rows_grouped_by_skill_and_type() {
        let (corpus, lookup) = CorpusBuilder::new().build(4, &sample_matches()).unwrap();

        assert_eq!(corpus.num_rows(), 3);
        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup.get(0), Some(&RowKey::new("S1", MatchType::LowSurfaceForm)));
        assert_eq!(lookup.get(1), Some(&RowKey::new("S1", MatchType::OneTokenNgram)));
        assert_eq!(lookup.get(2), Some(&RowKey::new("S2", MatchType::OneTokenNgram)));
    }

    #[test]
    fn test_row_is_union_of_group() {
        let (corpus, _) = CorpusBuilder::new().build(4, &sample_matches()).unwrap();
        assert_eq!(corpus.row_tokens(1).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(corpus.matrix.to_dense()[1], vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_overlapping_claims_stay_binary() {
        let matches = vec![
            CandidateMatch::new("S1", MatchType::OneTokenNgram, vec![0, 1]),
            CandidateMatch::new("S1", MatchType::OneTokenNgram, vec![1, 2]),
        ];
        let (corpus, _) = CorpusBuilder::new().build(3, &matches).unwrap();
        assert_eq!(corpus.matrix.to_dense(), vec![vec![1, 1, 1]]);
    }

    #[test]
    fn test_cooccurrence_diagonal_counts_claims() {
        let (corpus, _) = CorpusBuilder::new().build(4, &sample_matches()).unwrap();
        let co = corpus.cooccurrence();
        assert_eq!(co.get(1, 1), 2);
        assert_eq!(co.get(0, 1), 1);
        assert_eq!(co.get(3, 3), 0);
    }

    #[test]
    fn test_empty_doc_node_id_rejected() {
        let matches = vec![CandidateMatch::new("S1", MatchType::FullUnigram, vec![])];
        let err = CorpusBuilder::new().build(3, &matches).unwrap_err();
        assert!(matches!(err, Error::InvalidCandidate { .. }));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let matches = vec![CandidateMatch::new("S1", MatchType::FullUnigram, vec![1, 3])];
        let err = CorpusBuilder::new().build(3, &matches).unwrap_err();
        match err {
            Error::InvalidCandidate { skill_id, reason } => {
                assert_eq!(skill_id, "S1");
                assert!(reason.contains("token index 3"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let (corpus, lookup) = CorpusBuilder::new().build(5, &[]).unwrap();
        assert_eq!(corpus.num_rows(), 0);
        assert_eq!(corpus.document_length(), 5);
        assert!(lookup.is_empty());
    }

    #[test]
    fn test_row_key_encoding() {
        let key = RowKey::new("KS_123", MatchType::OneTokenNgram);
        assert_eq!(key.to_string(), "KS_123_oneToken");
        assert_eq!(RowKey::parse("KS_123_oneToken"), Some(key));
        assert_eq!(RowKey::parse("KS123"), None);
        assert_eq!(RowKey::parse("KS123_abv"), None);
    }

    #[test]
    fn test_row_key_orders_by_encoding() {
        // '_' (0x5F) sorts after 'B' (0x42), so the longer identifier comes first
        let short = RowKey::new("A", MatchType::OneTokenNgram);
        let long = RowKey::new("AB", MatchType::OneTokenNgram);
        assert!(long < short);
        assert!(long.to_string() < short.to_string());

        let full = RowKey::new("S1", MatchType::FullUnigram);
        let low = RowKey::new("S1", MatchType::LowSurfaceForm);
        let one = RowKey::new("S1", MatchType::OneTokenNgram);
        assert!(full < low && low < one);
    }

    #[test]
    fn test_rows_follow_encoded_order() {
        let matches = vec![
            CandidateMatch::new("A", MatchType::OneTokenNgram, vec![0]),
            CandidateMatch::new("AB", MatchType::OneTokenNgram, vec![0]),
            CandidateMatch::new("A_1", MatchType::FullUnigram, vec![1]),
        ];
        let (_, lookup) = CorpusBuilder::new().build(2, &matches).unwrap();
        let encoded: Vec<String> = lookup.iter().map(|(_, key)| key.to_string()).collect();

        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
        assert_eq!(encoded, vec!["AB_oneToken", "A_1_fullUni", "A_oneToken"]);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_document_beyond_u32_rejected() {
        let matches = vec![CandidateMatch::new("S1", MatchType::FullUnigram, vec![0])];
        let err = CorpusBuilder::new()
            .build(u32::MAX as usize + 1, &matches)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }
}
