//! Model listing for the completion service.

use super::sender::error_body;
use crate::error::{DocFinderError, EndpointFailure, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Deserialize)]
struct ModelInfo {
    name: String,
}

/// Fetch the names of the models available at `base_url` (`GET /api/tags`).
#[instrument(skip(api_key))]
pub async fn list_models(base_url: &str, api_key: &str, timeout: Duration) -> Result<Vec<String>> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    info!("Fetching models from {}", url);

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DocFinderError::Config(format!("Failed to create HTTP client: {}", e)))?;

    let response = client
        .get(&url)
        .bearer_auth(api_key)
        .send()
        .await
        .map_err(|e| EndpointFailure::from_reqwest(&url, &e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EndpointFailure::Status {
            url,
            status: status.as_u16(),
            body: error_body(response).await,
        }
        .into());
    }

    let list: ModelList = response
        .json()
        .await
        .map_err(|e| EndpointFailure::InvalidResponse {
            url: url.clone(),
            message: e.to_string(),
        })?;

    let names: Vec<String> = list.models.into_iter().map(|m| m.name).collect();
    info!("Fetched {} models", names.len());
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve;
    use axum::{
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;

    #[tokio::test]
    async fn test_list_models() {
        let app = Router::new().route(
            "/api/tags",
            get(|headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer secret");
                if authorized {
                    Json(json!({ "models": [{ "name": "llama3.2" }, { "name": "mistral" }] }))
                        .into_response()
                } else {
                    StatusCode::UNAUTHORIZED.into_response()
                }
            }),
        );
        let base = serve(app).await;

        let models = list_models(&format!("{}/", base), "secret", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(models, vec!["llama3.2", "mistral"]);

        let err = list_models(&base, "wrong", Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            DocFinderError::Endpoint(failure) => assert_eq!(failure.status(), Some(401)),
            other => panic!("expected endpoint error, got {}", other),
        }
    }
}
