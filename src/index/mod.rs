//! Vector index abstraction for DocFinder.
//!
//! Stores `(vector, title)` pairs and answers nearest-neighbour queries under
//! cosine similarity.

mod memory;

pub use memory::MemoryVectorIndex;

use crate::error::{DocFinderError, Result};
use serde::Serialize;

/// A vector paired with the title of the document it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Position assigned on insertion (0-based).
    pub id: usize,
    /// Embedding vector.
    pub vector: Vec<f32>,
    /// Document title (file name).
    pub title: String,
}

/// A search hit with score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Entry id.
    pub id: usize,
    /// Document title.
    pub title: String,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Trait for vector index implementations.
pub trait VectorIndex: Send + Sync {
    /// Dimension every stored vector must have.
    fn dimension(&self) -> usize;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the index holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bulk-insert `(vector, title)` pairs, all or nothing.
    ///
    /// Entries get ids continuing from the current length, so on a fresh index
    /// each id equals the pair's position in `entries`.
    fn add_all(&mut self, entries: Vec<(Vec<f32>, String)>) -> Result<usize>;

    /// Up to `top_n` hits ordered by descending similarity, ties by lower id.
    fn search_scored(&self, query: &[f32], top_n: usize) -> Result<Vec<SearchHit>>;

    /// Up to `top_n` titles, most similar first.
    fn search(&self, query: &[f32], top_n: usize) -> Result<Vec<String>> {
        Ok(self
            .search_scored(query, top_n)?
            .into_iter()
            .map(|hit| hit.title)
            .collect())
    }
}

/// Validate a vector destined for an index of the given dimension.
pub(crate) fn check_vector(dimension: usize, vector: &[f32], what: &str) -> Result<()> {
    if vector.len() != dimension {
        return Err(DocFinderError::Index(format!(
            "{} has dimension {}, index expects {}",
            what,
            vector.len(),
            dimension
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(DocFinderError::Index(format!(
            "{} contains non-finite values",
            what
        )));
    }
    Ok(())
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
