//! OpenAI embeddings implementation.

use super::{ensure_dimensions, ensure_embeddable, preview, Embedder};
use crate::config::EmbeddingSettings;
use crate::error::{DocFinderError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder for the given model and dimensions.
    pub fn with_config(
        api_key: &str,
        api_base: Option<&str>,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(DocFinderError::Model(
                "Embedding dimensions must be positive".to_string(),
            ));
        }
        Ok(Self {
            client: create_client(api_key, api_base, timeout)?,
            model: model.to_string(),
            dimensions,
        })
    }

    /// Create an embedder from the embedding settings.
    pub fn from_settings(settings: &EmbeddingSettings, timeout: Duration) -> Result<Self> {
        Self::with_config(
            &settings.token,
            Some(settings.api_base.as_str()),
            &settings.model,
            settings.dimensions as usize,
            timeout,
        )
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_embeddable(text)?;
        debug!("Embedding text: {}...", preview(text));

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| DocFinderError::Model(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| DocFinderError::Model(format!("Embedding API error: {}", e)))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| DocFinderError::Model("Empty embedding response".to_string()))?;

        ensure_dimensions(&self.model, self.dimensions, embedding.len())?;
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let timeout = Duration::from_secs(5);
        let embedder =
            OpenAIEmbedder::with_config("sk-test", None, "text-embedding-3-small", 1536, timeout)
                .unwrap();
        assert_eq!(embedder.dimensions(), 1536);

        let embedder =
            OpenAIEmbedder::with_config("sk-test", None, "text-embedding-3-large", 3072, timeout)
                .unwrap();
        assert_eq!(embedder.dimensions(), 3072);
    }

    #[test]
    fn test_zero_dimensions_is_a_model_error() {
        let result = OpenAIEmbedder::with_config(
            "sk-test",
            None,
            "text-embedding-3-small",
            0,
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(DocFinderError::Model(_))));
    }

    #[tokio::test]
    async fn test_empty_text_fails_before_calling_api() {
        let embedder = OpenAIEmbedder::with_config(
            "sk-test",
            Some("http://127.0.0.1:9"),
            "text-embedding-3-small",
            8,
            Duration::from_secs(1),
        )
        .unwrap();
        let err = embedder.embed("").await.unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
