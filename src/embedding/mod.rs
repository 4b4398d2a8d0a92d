//! Embedding generation for semantic retrieval.

mod huggingface;
mod openai;

pub use huggingface::HuggingFaceEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::{DocFinderError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding generation.
///
/// Implementations are read-only after construction, so a single instance can
/// serve concurrent `embed` calls.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Name of the underlying model.
    fn model_name(&self) -> &str;
}

/// Reject input that would only produce a degenerate vector.
pub(crate) fn ensure_embeddable(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(DocFinderError::Model(
            "Cannot embed empty text".to_string(),
        ));
    }
    Ok(())
}

/// Check a produced vector against the dimension fixed at construction.
pub(crate) fn ensure_dimensions(model: &str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(DocFinderError::Model(format!(
            "Model {} returned a {}-dimensional vector, expected {}",
            model, actual, expected
        )));
    }
    Ok(())
}

/// Preview of a text for log lines.
pub(crate) fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}

/// Timeout applied to embedding requests.
const EMBEDDING_TIMEOUT_SECS: u64 = 60;

/// Construct the embedder selected in the settings.
///
/// Model access problems surface here as [`DocFinderError::Model`].
pub async fn create_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let timeout = Duration::from_secs(EMBEDDING_TIMEOUT_SECS);
    let embedder: Arc<dyn Embedder> = match settings.provider {
        EmbeddingProvider::HuggingFace => {
            Arc::new(HuggingFaceEmbedder::load(settings, timeout).await?)
        }
        EmbeddingProvider::OpenAI => Arc::new(OpenAIEmbedder::from_settings(settings, timeout)?),
    };
    Ok(embedder)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Deterministic embedder used by tests across the crate.

    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embedder returning hand-crafted vectors.
    ///
    /// Known texts map to fixed vectors; anything else gets `fallback`.
    pub struct StubEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        fallback: Vec<f32>,
        pub calls: AtomicUsize,
    }

    impl StubEmbedder {
        pub fn new(dimensions: usize) -> Self {
            Self {
                vectors: HashMap::new(),
                fallback: vec![1.0; dimensions],
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.to_string(), vector);
            self
        }
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            ensure_embeddable(text)?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .vectors
                .get(text)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()))
        }

        fn dimensions(&self) -> usize {
            self.fallback.len()
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }
}
