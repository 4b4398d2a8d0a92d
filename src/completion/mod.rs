//! Chat completion client.
//!
//! Sends a single-turn chat request (one system message, one user message) to
//! a remote endpoint and returns the generated text.

mod models;
mod sender;

pub use models::list_models;
pub use sender::{HttpRequestSender, RequestSender};
pub(crate) use sender::error_body;

use crate::error::{DocFinderError, EndpointFailure, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Largest `max_tokens` a request may ask for.
pub const MAX_TOKENS_UPPER_BOUND: u32 = 32768;

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl SamplingParams {
    /// Check every parameter is within its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(DocFinderError::Config(
                "generation.model is blank".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DocFinderError::Config(format!(
                "generation.temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(DocFinderError::Config(format!(
                "generation.top_p must be between 0 and 1, got {}",
                self.top_p
            )));
        }
        if !(1..=MAX_TOKENS_UPPER_BOUND).contains(&self.max_tokens) {
            return Err(DocFinderError::Config(format!(
                "generation.max_tokens must be between 1 and {}, got {}",
                MAX_TOKENS_UPPER_BOUND, self.max_tokens
            )));
        }
        Ok(())
    }
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Body of a non-streaming chat request.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

impl ChatRequest {
    /// Build a single-turn request.
    pub fn single_turn(system_prompt: &str, user_prompt: &str, params: &SamplingParams) -> Self {
        Self {
            model: params.model.clone(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: user_prompt.to_string(),
                },
            ],
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stream: false,
        }
    }
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Reply shapes the client understands.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChatResponse {
    /// Ollama style: `{"message": {"content": ...}}`.
    Message { message: ResponseMessage },
    /// OpenAI style: `{"choices": [{"message": {"content": ...}}]}`.
    Choices { choices: Vec<Choice> },
}

impl ChatResponse {
    fn into_content(self) -> Option<String> {
        match self {
            ChatResponse::Message { message } => Some(message.content),
            ChatResponse::Choices { choices } => {
                choices.into_iter().next().map(|c| c.message.content)
            }
        }
    }
}

/// Client for the chat completion endpoint.
pub struct CompletionClient {
    sender: Arc<dyn RequestSender>,
    endpoint: String,
    headers: Vec<(String, String)>,
}

impl CompletionClient {
    /// Create a client using the HTTP transport.
    pub fn new(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::with_sender(
            api_key,
            endpoint,
            Arc::new(HttpRequestSender::new(timeout)?),
        ))
    }

    /// Create a client with a custom transport.
    pub fn with_sender(api_key: &str, endpoint: &str, sender: Arc<dyn RequestSender>) -> Self {
        let headers = vec![
            ("api-key".to_string(), api_key.to_string()),
            ("Authorization".to_string(), format!("Bearer {}", api_key)),
        ];
        info!("Initialized completion client for {}", endpoint);
        Self {
            sender,
            endpoint: endpoint.to_string(),
            headers,
        }
    }

    /// Endpoint URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Generate a reply to a single system/user exchange.
    #[instrument(skip(self, system_prompt, user_prompt, params), fields(model = %params.model))]
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &SamplingParams,
    ) -> Result<String> {
        params.validate()?;

        let request = ChatRequest::single_turn(system_prompt, user_prompt, params);
        let payload = serde_json::to_value(&request)?;

        debug!("Sending payload to endpoint");
        let reply = self
            .sender
            .send(&self.endpoint, &self.headers, &payload)
            .await?;

        let parsed: ChatResponse = serde_json::from_value(reply).map_err(|e| {
            EndpointFailure::InvalidResponse {
                url: self.endpoint.clone(),
                message: e.to_string(),
            }
        })?;

        parsed.into_content().ok_or_else(|| {
            EndpointFailure::InvalidResponse {
                url: self.endpoint.clone(),
                message: "response contained no choices".to_string(),
            }
            .into()
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubSender;
    use super::*;
    use serde_json::json;

    fn params() -> SamplingParams {
        SamplingParams {
            model: "llama3.2".to_string(),
            temperature: 0.1,
            top_p: 0.95,
            max_tokens: 3000,
        }
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest::single_turn("system", "user", &params());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "llama3.2");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "user");
        assert_eq!(value["max_tokens"], 3000);
        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_validate_ranges() {
        assert!(params().validate().is_ok());

        let mut p = params();
        p.temperature = -0.1;
        assert!(p.validate().is_err());

        let mut p = params();
        p.top_p = 1.01;
        assert!(p.validate().is_err());

        let mut p = params();
        p.max_tokens = 0;
        assert!(p.validate().is_err());

        let mut p = params();
        p.max_tokens = MAX_TOKENS_UPPER_BOUND + 1;
        assert!(p.validate().is_err());
    }

    #[tokio::test]
    async fn test_complete_reads_message_content() {
        let sender = Arc::new(StubSender::replying(
            json!({ "message": { "role": "assistant", "content": "Cats are mammals." } }),
        ));
        let client = CompletionClient::with_sender("key", "http://stub/api/chat", sender.clone());

        let text = client.complete("system", "user", &params()).await.unwrap();
        assert_eq!(text, "Cats are mammals.");

        let payloads = sender.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0]["temperature"].as_f64().unwrap() as f32, 0.1);
    }

    #[tokio::test]
    async fn test_complete_reads_openai_choices() {
        let sender = Arc::new(StubSender::replying(
            json!({ "choices": [{ "message": { "content": "From choices." } }] }),
        ));
        let client = CompletionClient::with_sender("key", "http://stub", sender);

        let text = client.complete("s", "u", &params()).await.unwrap();
        assert_eq!(text, "From choices.");
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_endpoint_error() {
        let sender = Arc::new(StubSender::replying(json!({ "answer": "nope" })));
        let client = CompletionClient::with_sender("key", "http://stub", sender);

        let err = client.complete("s", "u", &params()).await.unwrap_err();
        assert!(matches!(
            err,
            DocFinderError::Endpoint(EndpointFailure::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_choices_is_endpoint_error() {
        let sender = Arc::new(StubSender::replying(json!({ "choices": [] })));
        let client = CompletionClient::with_sender("key", "http://stub", sender);

        assert!(client.complete("s", "u", &params()).await.is_err());
    }

    #[tokio::test]
    async fn test_status_failure_propagates() {
        let sender = Arc::new(StubSender::failing(500));
        let client = CompletionClient::with_sender("key", "http://stub", sender);

        let err = client.complete("s", "u", &params()).await.unwrap_err();
        match err {
            DocFinderError::Endpoint(failure) => assert_eq!(failure.status(), Some(500)),
            other => panic!("expected endpoint error, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_params_are_not_sent() {
        let sender = Arc::new(StubSender::replying(json!({})));
        let client = CompletionClient::with_sender("key", "http://stub", sender.clone());

        let mut p = params();
        p.temperature = 2.0;
        assert!(client.complete("s", "u", &p).await.is_err());
        assert!(sender.payloads.lock().unwrap().is_empty());
    }
}
