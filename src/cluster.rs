//! Co-occurrence clustering
//!
//! Partitions the claimed tokens of a document into contested spans. Two
//! tokens are linked when some skill claims both of them and their index
//! distance is at most `token_dist`; a span is a connected component of
//! that graph.
//!
//! Process:
//! 1. Compute the token × token co-occurrence matrix `Corpusᵗ · Corpus`
//! 2. Link co-occurring tokens within the adjacency distance
//! 3. Collect connected components, ordered by their first token

use rustc_hash::FxHashMap;

use crate::matrix::Corpus;

/// A contested region of the document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    /// Sorted member token indices
    tokens: Vec<usize>,
    /// Length of the document the span indexes into
    document_length: usize,
}

impl Span {
    /// Create a span from member token indices
    pub fn new(mut tokens: Vec<usize>, document_length: usize) -> Self {
        tokens.sort_unstable();
        tokens.dedup();
        Self {
            tokens,
            document_length,
        }
    }

    /// Sorted member token indices
    pub fn tokens(&self) -> &[usize] {
        &self.tokens
    }

    /// Check whether a token belongs to the span
    pub fn contains(&self, token: usize) -> bool {
        self.tokens.binary_search(&token).is_ok()
    }

    /// Number of member tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn document_length(&self) -> usize {
        self.document_length
    }
}

/// Splits a corpus into disjoint contested spans
#[derive(Debug, Clone, Copy)]
pub struct CoOccurrenceClusterer {
    token_dist: usize,
}

impl Default for CoOccurrenceClusterer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TOKEN_DIST)
    }
}

impl CoOccurrenceClusterer {
    /// Create a clusterer with the given adjacency distance
    pub fn new(token_dist: usize) -> Self {
        Self { token_dist }
    }

    /// Compute the spans of a corpus.
    ///
    /// Spans are pairwise disjoint and together cover exactly the tokens
    /// claimed by at least one row.
    pub fn cluster(&self, corpus: &Corpus) -> Vec<Span> {
        let n = corpus.document_length();
        let co = corpus.cooccurrence();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut [usize], i: usize) -> usize {
            let mut root = i;
            while parent[root] != root {
                root = parent[root];
            }
            let mut cur = i;
            while parent[cur] != root {
                let next = parent[cur];
                parent[cur] = root;
                cur = next;
            }
            root
        }

        fn union(parent: &mut [usize], i: usize, j: usize) {
            let pi = find(parent, i);
            let pj = find(parent, j);
            if pi != pj {
                // Keep the smaller index as root
                let (lo, hi) = if pi < pj { (pi, pj) } else { (pj, pi) };
                parent[hi] = lo;
            }
        }

        for i in 0..n {
            for (j, count) in co.row(i) {
                let j = j as usize;
                if count > 0 && j > i && j - i <= self.token_dist {
                    union(&mut parent, i, j);
                }
            }
        }

        // Tokens with a zero diagonal are claimed by no skill
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut group_of_root: FxHashMap<usize, usize> = FxHashMap::default();
        for i in 0..n {
            if co.row_nnz(i) == 0 {
                continue;
            }
            let root = find(&mut parent, i);
            let slot = *group_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(i);
        }

        debug_event!(spans = groups.len(), nnz = co.nnz(), "clustered co-occurrence graph");

        groups
            .into_iter()
            .map(|tokens| Span::new(tokens, n))
            .collect()
    }
}
