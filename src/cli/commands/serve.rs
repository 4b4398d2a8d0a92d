//! HTTP API server.
//!
//! Upload documents (or point at a server-side directory), then query them.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::completion::{list_models, SamplingParams};
use crate::config::Settings;
use crate::error::DocFinderError;
use crate::index::SearchHit;
use crate::orchestrator::{Orchestrator, Status};
use crate::rag::RagAnswer;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Largest request body accepted, to leave room for document uploads.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    orchestrator: Orchestrator,
    models_url: String,
    api_key: String,
    timeout: Duration,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, settings: &Settings) -> Self {
        Self {
            orchestrator,
            models_url: settings.endpoint.models_url.clone(),
            api_key: settings.endpoint.api_key.clone(),
            timeout: Duration::from_secs(settings.endpoint.timeout_seconds),
        }
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/models", get(models))
        .route("/documents", post(upload_documents))
        .route("/documents/reload", post(reload_documents))
        .route("/query", post(query))
        .route("/search", post(search))
        .route("/generation", put(update_generation))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    documents_dir: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Pipeline, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(&settings).await?;
    if let Some(dir) = documents_dir {
        let dir = preflight::documents_dir(&dir)?;
        let count = orchestrator.build(&dir).await?;
        Output::success(&format!("Indexed {} documents from {}", count, dir.display()));
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let state = Arc::new(AppState::new(orchestrator, &settings));
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("DocFinder API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Status", "GET  /status");
    Output::kv("Models", "GET  /models");
    Output::kv("Upload", "POST /documents");
    Output::kv("Reload", "POST /documents/reload");
    Output::kv("Query", "POST /query");
    Output::kv("Search", "POST /search");
    Output::kv("Generation", "PUT  /generation");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct UploadedFile {
    name: String,
    content: String,
}

#[derive(Deserialize)]
struct UploadRequest {
    files: Vec<UploadedFile>,
}

#[derive(Deserialize)]
struct ReloadRequest {
    path: String,
}

#[derive(Serialize)]
struct BuildResponse {
    documents: usize,
}

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Serialize)]
struct ModelsResponse {
    models: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Error returned from a handler, mapped onto an HTTP status.
struct ApiError(DocFinderError);

impl From<DocFinderError> for ApiError {
    fn from(err: DocFinderError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DocFinderError::InvalidInput(_) | DocFinderError::Config(_) => StatusCode::BAD_REQUEST,
            DocFinderError::State(_) => StatusCode::CONFLICT,
            DocFinderError::Processing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DocFinderError::Model(_) | DocFinderError::Endpoint(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<Status> {
    Json(state.orchestrator.status().await)
}

async fn models(State(state): State<Arc<AppState>>) -> ApiResult<ModelsResponse> {
    let models = list_models(&state.models_url, &state.api_key, state.timeout).await?;
    Ok(Json(ModelsResponse { models }))
}

/// Check an uploaded file name is a plain name the processor would index.
fn check_upload_name(orchestrator: &Orchestrator, name: &str) -> Result<(), DocFinderError> {
    let plain = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if !plain || !orchestrator.accepts(name) {
        return Err(DocFinderError::InvalidInput(format!(
            "Invalid file name {:?}: expected a plain *.{} file name",
            name,
            orchestrator.extension()
        )));
    }
    Ok(())
}

async fn upload_documents(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadRequest>,
) -> ApiResult<BuildResponse> {
    // Later files replace earlier ones with the same name.
    let mut files = BTreeMap::new();
    for file in req.files {
        check_upload_name(&state.orchestrator, &file.name)?;
        files.insert(file.name, file.content);
    }
    if files.is_empty() {
        return Err(DocFinderError::InvalidInput("No files uploaded".to_string()).into());
    }

    let dir = tempfile::tempdir().map_err(DocFinderError::from)?;
    for (name, content) in &files {
        tokio::fs::write(dir.path().join(name), content)
            .await
            .map_err(DocFinderError::from)?;
    }
    info!("Received {} documents", files.len());

    let documents = state.orchestrator.build_temporary(dir).await?;

    Ok(Json(BuildResponse { documents }))
}

async fn reload_documents(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReloadRequest>,
) -> ApiResult<BuildResponse> {
    let dir = preflight::documents_dir(&req.path)?;

    let documents = state.orchestrator.build(&dir).await?;

    Ok(Json(BuildResponse { documents }))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> ApiResult<RagAnswer> {
    Ok(Json(state.orchestrator.answer(&req.query).await?))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
    let results = state.orchestrator.search(&req.query, req.limit).await?;
    Ok(Json(SearchResponse { results }))
}

async fn update_generation(
    State(state): State<Arc<AppState>>,
    Json(params): Json<SamplingParams>,
) -> ApiResult<SamplingParams> {
    state.orchestrator.set_generation(params).await?;
    Ok(Json(state.orchestrator.generation().await))
}
