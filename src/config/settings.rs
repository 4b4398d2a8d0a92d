//! Configuration settings for DocFinder.

use crate::completion::SamplingParams;
use crate::error::{DocFinderError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub embedding: EmbeddingSettings,
    pub endpoint: EndpointSettings,
    pub generation: GenerationSettings,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face inference feature-extraction pipeline (default).
    #[default]
    HuggingFace,
    /// OpenAI embeddings API.
    OpenAI,
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (huggingface, openai).
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Base URL of the embedding API. Empty means the provider default.
    pub api_base: String,
    /// Token used to reach the embedding model.
    pub token: String,
    /// Embedding dimensions (OpenAI provider only; Hugging Face models report their own).
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            model: "sentence-transformers/paraphrase-MiniLM-L6-v2".to_string(),
            api_base: String::new(),
            token: String::new(),
            dimensions: 1536,
        }
    }
}

/// Chat completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    /// Full URL of the chat completion endpoint.
    pub api_url: String,
    /// API key sent with every completion request.
    pub api_key: String,
    /// Base URL of the model listing service.
    pub models_url: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434/api/chat".to_string(),
            api_key: String::new(),
            models_url: "http://localhost:11434".to_string(),
            timeout_seconds: 60,
        }
    }
}

/// Sampling parameters for response generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model used to generate responses.
    pub model: String,
    /// Sampling temperature (0.0-1.0).
    pub temperature: f32,
    /// Nucleus sampling probability (0.0-1.0).
    pub top_p: f32,
    /// Maximum number of tokens in the response.
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "llama3.2".to_string(),
            temperature: 0.1,
            top_p: 0.95,
            max_tokens: 3000,
        }
    }
}

impl GenerationSettings {
    /// Convert to the parameters carried by a completion request.
    pub fn sampling_params(&self) -> SamplingParams {
        SamplingParams {
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of documents retrieved per query.
    pub top_n: usize,
    /// File extension of the documents to index (without the dot).
    pub extension: String,
    /// Number of documents embedded concurrently during a build.
    pub embed_concurrency: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_n: 3,
            extension: "txt".to_string(),
            embed_concurrency: 4,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied on top of whatever the file holds.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(settings)
    }

    /// Override credentials and endpoint from the environment.
    ///
    /// Takes a lookup function so callers (and tests) decide where values come from.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("API_KEY") {
            self.endpoint.api_key = key;
        }
        if let Some(url) = non_empty("API_URL") {
            self.endpoint.api_url = url;
        }
        match self.embedding.provider {
            EmbeddingProvider::HuggingFace => {
                if let Some(token) = non_empty("HUGGINGFACE_TOKEN") {
                    self.embedding.token = token;
                }
            }
            EmbeddingProvider::OpenAI => {
                if let Some(token) = non_empty("OPENAI_API_KEY") {
                    self.embedding.token = token;
                }
            }
        }
    }

    /// Check that everything needed to run the pipeline is present and sane.
    ///
    /// Reports every problem at once rather than stopping at the first.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.endpoint.api_key.trim().is_empty() {
            problems.push("endpoint.api_key is blank (set API_KEY)".to_string());
        }
        if self.endpoint.api_url.trim().is_empty() {
            problems.push("endpoint.api_url is blank (set API_URL)".to_string());
        } else if let Err(e) = Url::parse(&self.endpoint.api_url) {
            problems.push(format!("endpoint.api_url is not a valid URL: {}", e));
        }
        if self.embedding.token.trim().is_empty() {
            let var = match self.embedding.provider {
                EmbeddingProvider::HuggingFace => "HUGGINGFACE_TOKEN",
                EmbeddingProvider::OpenAI => "OPENAI_API_KEY",
            };
            problems.push(format!("embedding.token is blank (set {})", var));
        }
        if self.embedding.model.trim().is_empty() {
            problems.push("embedding.model is blank".to_string());
        } else if self.embedding.provider == EmbeddingProvider::OpenAI
            && self.embedding.model.starts_with("sentence-transformers/")
        {
            problems.push(format!(
                "embedding.model {} is a Hugging Face model; set an OpenAI model such as text-embedding-3-small",
                self.embedding.model
            ));
        }
        if !self.embedding.api_base.is_empty() {
            if let Err(e) = Url::parse(&self.embedding.api_base) {
                problems.push(format!("embedding.api_base is not a valid URL: {}", e));
            }
        }
        if !(1..=600).contains(&self.endpoint.timeout_seconds) {
            problems.push(format!(
                "endpoint.timeout_seconds must be between 1 and 600, got {}",
                self.endpoint.timeout_seconds
            ));
        }
        if let Err(e) = self.generation.sampling_params().validate() {
            problems.push(e.to_string());
        }
        if self.retrieval.top_n == 0 {
            problems.push("retrieval.top_n must be at least 1".to_string());
        }
        if self.retrieval.embed_concurrency == 0 {
            problems.push("retrieval.embed_concurrency must be at least 1".to_string());
        }
        if self.retrieval.extension.trim().is_empty() {
            problems.push("retrieval.extension is blank".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DocFinderError::Config(problems.join("; ")))
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DocFinderError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docfinder")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn configured() -> Settings {
        let mut settings = Settings::default();
        settings.endpoint.api_key = "key".to_string();
        settings.embedding.token = "hf_token".to_string();
        settings
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.retrieval.top_n, 3);
        assert_eq!(settings.generation.model, "llama3.2");
        assert_eq!(settings.generation.max_tokens, 3000);
        assert_eq!(
            settings.embedding.model,
            "sentence-transformers/paraphrase-MiniLM-L6-v2"
        );
    }

    #[test]
    fn test_validate_reports_all_blank_credentials() {
        let err = Settings::default().validate().unwrap_err().to_string();
        assert!(err.contains("endpoint.api_key"));
        assert!(err.contains("embedding.token"));
    }

    #[test]
    fn test_validate_accepts_complete_settings() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url_and_ranges() {
        let mut settings = configured();
        settings.endpoint.api_url = "not a url".to_string();
        settings.generation.temperature = 1.5;
        settings.retrieval.top_n = 0;

        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("api_url"));
        assert!(err.contains("temperature"));
        assert!(err.contains("top_n"));
    }

    #[test]
    fn test_validate_rejects_huggingface_model_for_openai() {
        let mut settings = configured();
        settings.embedding.provider = EmbeddingProvider::OpenAI;

        let err = settings.validate().unwrap_err().to_string();
        assert!(err.contains("embedding.model"));

        settings.embedding.model = "text-embedding-3-small".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("API_KEY", "secret"),
            ("API_URL", "http://example.com/api/chat"),
            ("HUGGINGFACE_TOKEN", "hf_abc"),
            ("OPENAI_API_KEY", "sk-ignored"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.endpoint.api_key, "secret");
        assert_eq!(settings.endpoint.api_url, "http://example.com/api/chat");
        assert_eq!(settings.embedding.token, "hf_abc");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut settings = Settings::default();
        settings.endpoint.api_key = "from-file".to_string();
        settings.apply_env_overrides(|_| Some("   ".to_string()));
        assert_eq!(settings.endpoint.api_key, "from-file");
    }

    #[test]
    fn test_settings_toml_roundtrip_with_partial_file() {
        let settings: Settings = toml::from_str(
            r#"
            [embedding]
            provider = "openai"
            model = "text-embedding-3-small"

            [retrieval]
            top_n = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.embedding.provider, EmbeddingProvider::OpenAI);
        assert_eq!(settings.retrieval.top_n, 5);
        assert_eq!(settings.retrieval.extension, "txt");
        assert_eq!(settings.server.port, 8501);
    }
}
