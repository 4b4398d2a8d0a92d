//! In-memory vector index.
//!
//! Exact cosine search over every entry. A rebuild creates a new index rather
//! than mutating an existing one.

use super::{check_vector, cosine_similarity, IndexEntry, SearchHit, VectorIndex};
use crate::error::{DocFinderError, Result};
use tracing::{debug, info, instrument};

/// In-memory vector index.
#[derive(Debug)]
pub struct MemoryVectorIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl MemoryVectorIndex {
    /// Create an empty index for vectors of exactly `dimension` length.
    pub fn create(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(DocFinderError::Index(
                "Index dimension must be positive".to_string(),
            ));
        }
        info!("Created vector index with dimension {}", dimension);
        Ok(Self {
            dimension,
            entries: Vec::new(),
        })
    }

    /// All stored entries in id order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

impl VectorIndex for MemoryVectorIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    fn add_all(&mut self, entries: Vec<(Vec<f32>, String)>) -> Result<usize> {
        // Validate everything before touching the index.
        for (position, (vector, title)) in entries.iter().enumerate() {
            check_vector(
                self.dimension,
                vector,
                &format!("entry {} ({})", position, title),
            )?;
        }

        let offset = self.entries.len();
        let count = entries.len();
        self.entries.extend(
            entries
                .into_iter()
                .enumerate()
                .map(|(position, (vector, title))| IndexEntry {
                    id: offset + position,
                    vector,
                    title,
                }),
        );

        info!("Added {} embeddings to index", count);
        Ok(count)
    }

    #[instrument(skip(self, query))]
    fn search_scored(&self, query: &[f32], top_n: usize) -> Result<Vec<SearchHit>> {
        if top_n == 0 {
            return Err(DocFinderError::Index(
                "top_n must be at least 1".to_string(),
            ));
        }
        check_vector(self.dimension, query, "query")?;
        debug!("Searching for top {} similar documents", top_n);

        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|entry| SearchHit {
                id: entry.id,
                title: entry.title.clone(),
                score: cosine_similarity(query, &entry.vector),
            })
            .collect();

        // Stable sort on entries already in id order keeps ties by lower id.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_n);

        Ok(hits)
    }
}
