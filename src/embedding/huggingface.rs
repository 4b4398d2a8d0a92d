//! Hugging Face inference API embeddings.
//!
//! Calls the feature-extraction pipeline of a hosted sentence-transformers model.

use super::{ensure_dimensions, ensure_embeddable, preview, Embedder};
use crate::completion::error_body;
use crate::config::EmbeddingSettings;
use crate::error::{DocFinderError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Default base URL of the hosted inference API.
const DEFAULT_API_BASE: &str = "https://router.huggingface.co/hf-inference/models";

/// Text embedded once at load time to learn the model's dimension.
const SAMPLE_TEXT: &str = "dimension check";

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
}

/// Shapes the feature-extraction pipeline may answer with.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtraction {
    /// Sentence-level vector (models with a pooling head).
    Pooled(Vec<f32>),
    /// One vector per token.
    Tokens(Vec<Vec<f32>>),
    /// Token vectors wrapped in a batch of one.
    Batched(Vec<Vec<Vec<f32>>>),
}

impl FeatureExtraction {
    fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            FeatureExtraction::Pooled(v) => Some(v),
            FeatureExtraction::Tokens(tokens) => mean_pool(&tokens),
            FeatureExtraction::Batched(batch) => batch.into_iter().next().and_then(|t| mean_pool(&t)),
        }
    }
}

/// Average token vectors into one sentence vector.
fn mean_pool(tokens: &[Vec<f32>]) -> Option<Vec<f32>> {
    let width = tokens.first()?.len();
    if width == 0 || tokens.iter().any(|t| t.len() != width) {
        return None;
    }
    let mut sum = vec![0.0f32; width];
    for token in tokens {
        for (acc, value) in sum.iter_mut().zip(token) {
            *acc += value;
        }
    }
    let count = tokens.len() as f32;
    Some(sum.into_iter().map(|v| v / count).collect())
}

/// Embedder backed by the Hugging Face inference API.
pub struct HuggingFaceEmbedder {
    client: reqwest::Client,
    url: String,
    token: String,
    model: String,
    dimensions: usize,
}

impl HuggingFaceEmbedder {
    /// Connect to the model and discover its embedding dimension.
    ///
    /// Any failure here means the model is unusable and is reported as a model error.
    #[instrument(skip(settings), fields(model = %settings.model))]
    pub async fn load(settings: &EmbeddingSettings, timeout: Duration) -> Result<Self> {
        if settings.model.trim().is_empty() {
            return Err(DocFinderError::Model("No embedding model configured".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocFinderError::Model(format!("Failed to create HTTP client: {}", e)))?;

        let base = if settings.api_base.is_empty() {
            DEFAULT_API_BASE
        } else {
            settings.api_base.as_str()
        };
        let url = format!(
            "{}/{}/pipeline/feature-extraction",
            base.trim_end_matches('/'),
            settings.model
        );

        let mut embedder = Self {
            client,
            url,
            token: settings.token.clone(),
            model: settings.model.clone(),
            dimensions: 0,
        };

        let sample = embedder.request(SAMPLE_TEXT).await?;
        if sample.is_empty() {
            return Err(DocFinderError::Model(format!(
                "Model {} returned an empty vector",
                embedder.model
            )));
        }
        embedder.dimensions = sample.len();

        info!(
            "Initialized embedder with model {} ({} dimensions)",
            embedder.model, embedder.dimensions
        );
        Ok(embedder)
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>> {
        let body = FeatureExtractionRequest {
            inputs: text,
            options: RequestOptions {
                wait_for_model: true,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| DocFinderError::Model(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocFinderError::Model(format!(
                "Embedding API returned HTTP {}: {}",
                status.as_u16(),
                error_body(response).await
            )));
        }

        let parsed: FeatureExtraction = response
            .json()
            .await
            .map_err(|e| DocFinderError::Model(format!("Unexpected embedding response: {}", e)))?;

        parsed.into_vector().ok_or_else(|| {
            DocFinderError::Model("Embedding response contained no usable vector".to_string())
        })
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        ensure_embeddable(text)?;
        debug!("Embedding text: {}...", preview(text));

        let embedding = self.request(text).await?;
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
    use crate::test_support::serve;
    use axum::{http::StatusCode, routing::post, Json, Router};

    fn settings(api_base: String) -> EmbeddingSettings {
        EmbeddingSettings {
            model: "sentence-transformers/test-model".to_string(),
            api_base,
            token: "hf_test".to_string(),
            ..EmbeddingSettings::default()
        }
    }

    #[test]
    fn test_mean_pool() {
        let pooled = mean_pool(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(pooled, vec![2.0, 3.0]);
        assert!(mean_pool(&[]).is_none());
        assert!(mean_pool(&[vec![1.0], vec![1.0, 2.0]]).is_none());
    }

    #[test]
    fn test_response_shapes() {
        let pooled: FeatureExtraction = serde_json::from_str("[0.5, 0.5]").unwrap();
        assert_eq!(pooled.into_vector().unwrap(), vec![0.5, 0.5]);

        let tokens: FeatureExtraction = serde_json::from_str("[[0.0, 2.0], [2.0, 0.0]]").unwrap();
        assert_eq!(tokens.into_vector().unwrap(), vec![1.0, 1.0]);

        let batched: FeatureExtraction = serde_json::from_str("[[[1.0], [3.0]]]").unwrap();
        assert_eq!(batched.into_vector().unwrap(), vec![2.0]);
    }

    #[tokio::test]
    async fn test_load_discovers_dimension() {
        let app = Router::new().route(
            "/sentence-transformers/test-model/pipeline/feature-extraction",
            post(|| async { Json(vec![vec![0.0f32, 1.0, 2.0], vec![2.0, 1.0, 0.0]]) }),
        );
        let base = serve(app).await;

        let embedder = HuggingFaceEmbedder::load(&settings(base), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(embedder.dimensions(), 3);

        let vector = embedder.embed("cats are mammals").await.unwrap();
        assert_eq!(vector, vec![1.0, 1.0, 1.0]);
    }

    #[tokio::test]
    async fn test_load_failure_is_model_error() {
        let app = Router::new().route(
            "/sentence-transformers/test-model/pipeline/feature-extraction",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid token") }),
        );
        let base = serve(app).await;

        let result = HuggingFaceEmbedder::load(&settings(base), Duration::from_secs(5)).await;
        match result {
            Err(DocFinderError::Model(message)) => assert!(message.contains("401")),
            other => panic!("expected model error, got {:?}", other.map(|_| ())),
        }
    }
}
