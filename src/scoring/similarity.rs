//! Similarity between a matched surface text and a skill's canonical form
//!
//! Word-vector similarity is tried first. When it is undefined (unknown
//! words, zero vectors, no model) the Jaro similarity of the lower-cased
//! strings is used instead. Both stages return values in [0, 1].

use rustc_hash::FxHashMap;

/// Source of word vectors.
///
/// Implementations wrap whatever embedding model the caller has loaded.
/// Returning `None` marks the word as out of vocabulary.
pub trait WordVectors {
    /// Vector for a single word
    fn vector(&self, word: &str) -> Option<&[f32]>;
}

/// No vector model: every similarity falls back to string similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVectors;

impl WordVectors for NoVectors {
    #[inline]
    fn vector(&self, _word: &str) -> Option<&[f32]> {
        None
    }
}

/// Word vectors held in memory, keyed by lower-cased word
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectors {
    vectors: FxHashMap<String, Vec<f32>>,
    dim: usize,
}

impl InMemoryVectors {
    /// Create an empty table for vectors of the given dimension
    pub fn new(dim: usize) -> Self {
        Self {
            vectors: FxHashMap::default(),
            dim,
        }
    }

    /// Add a word vector. Vectors of the wrong dimension are ignored.
    pub fn insert(&mut self, word: &str, vector: Vec<f32>) -> bool {
        if vector.len() != self.dim {
            return false;
        }
        self.vectors.insert(word.to_lowercase(), vector);
        true
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl WordVectors for InMemoryVectors {
    fn vector(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(&word.to_lowercase()).map(Vec::as_slice)
    }
}

impl<V: WordVectors + ?Sized> WordVectors for &V {
    fn vector(&self, word: &str) -> Option<&[f32]> {
        (**self).vector(word)
    }
}

/// Mean vector of the words of a phrase, `None` if any word is unknown
fn phrase_vector<V: WordVectors + ?Sized>(vectors: &V, phrase: &str) -> Option<Vec<f64>> {
    let mut sum: Option<Vec<f64>> = None;
    let mut count = 0usize;

    for word in phrase.split_whitespace() {
        let v = vectors.vector(word)?;
        let acc = sum.get_or_insert_with(|| vec![0.0; v.len()]);
        if acc.len() != v.len() {
            return None;
        }
        for (a, &x) in acc.iter_mut().zip(v) {
            *a += f64::from(x);
        }
        count += 1;
    }

    let mut sum = sum?;
    for a in &mut sum {
        *a /= count as f64;
    }
    Some(sum)
}

/// Cosine similarity of two phrases under a vector model, clamped to [0, 1].
///
/// `None` when either phrase has an unknown word or a zero vector.
pub fn vector_similarity<V: WordVectors + ?Sized>(vectors: &V, a: &str, b: &str) -> Option<f64> {
    let va = phrase_vector(vectors, a)?;
    let vb = phrase_vector(vectors, b)?;
    if va.len() != vb.len() {
        return None;
    }

    let dot: f64 = va.iter().zip(&vb).map(|(x, y)| x * y).sum();
    let na = va.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = vb.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return None;
    }

    let sim = dot / (na * nb);
    if sim.is_finite() {
        Some(sim.clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Jaro similarity of the lower-cased strings
pub fn string_similarity(a: &str, b: &str) -> f64 {
    strsim::jaro(&a.to_lowercase(), &b.to_lowercase()).clamp(0.0, 1.0)
}

/// Similarity between a matched text and a single-token skill name.
///
/// Uses word vectors when they are defined for both strings, string
/// similarity otherwise.
pub fn one_gram_sim<V: WordVectors + ?Sized>(vectors: &V, text: &str, skill: &str) -> f64 {
    match vector_similarity(vectors, text, skill) {
        Some(sim) => sim,
        None => {
            debug_event!(text, skill, "vector similarity undefined, using jaro");
            string_similarity(text, skill)
        }
    }
}
