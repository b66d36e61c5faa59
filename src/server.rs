//! HTTP surface.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Upload-and-chat page |
//! | `POST` | `/api/upload` | Multipart PDF upload; rebuilds the index |
//! | `POST` | `/api/ask` | Answer a question against the current index |
//! | `GET`  | `/health` | Health check (version + index summary) |
//!
//! # Error Contract
//!
//! Error responses are flat JSON objects:
//!
//! ```json
//! { "error": "No question provided." }
//! ```
//!
//! Client input errors (missing files, missing question, asking before any
//! upload) map to 400; any processing failure (extraction, embedding,
//! retrieval, generation) maps to 500 with the underlying error text after
//! a fixed prefix.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the page can be
//! served from elsewhere during development.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::index::{IndexStats, VectorIndex};
use crate::ingest::{self, UploadedFile};
use crate::pipeline;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Uploads are whole PDFs held in memory; cap the request body well above
/// axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state passed to all route handlers.
///
/// The index slot is the only mutable state in the process. Uploads build
/// the new index outside the lock and swap the `Arc` in at the end; asks
/// clone the `Arc` under a read lock and release it before any network
/// call. A concurrent ask therefore sees either the old complete index or
/// the new complete one, never a partially built one; two concurrent
/// uploads serialize on the swap and the last writer wins.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    index: Arc<RwLock<Option<Arc<VectorIndex>>>>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            index: Arc::new(RwLock::new(None)),
        }
    }
}

/// Starts the HTTP server on the configured bind address and runs until
/// the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState::new(Arc::new(config.clone()));
    let app = router(state);

    tracing::info!(bind = %bind_addr, "docqa listening");
    println!("docqa listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the application router. Split out from [`run_server`] so tests
/// can drive the full surface on an ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_home))
        .route("/health", get(handle_health))
        .route("/api/upload", post(handle_upload))
        .route("/api/ask", post(handle_ask))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

/// API error kinds, mapped deterministically onto HTTP status codes.
#[derive(Debug)]
pub enum ApiError {
    /// The caller's fault: missing files, missing question, or asking
    /// before any successful upload. → 400
    InvalidInput(String),
    /// Anything that failed while doing the work: extraction, embedding,
    /// retrieval, generation. → 500
    ProcessingFailure(String),
}

/// Flat JSON error body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::ProcessingFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> String {
        match self {
            ApiError::InvalidInput(m) | ApiError::ProcessingFailure(m) => m,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { error: self.message() })).into_response()
    }
}

// ============ GET / ============

async fn handle_home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    /// Summary of the current index, or `null` before the first upload.
    index: Option<IndexStats>,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let index = state.index.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        index: index.as_ref().map(|i| i.stats()),
    })
}

// ============ POST /api/upload ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
}

/// Handler for `POST /api/upload`.
///
/// Accepts one or more PDFs under the multipart field name `files`,
/// rebuilds the vector index from scratch, and installs it in place of
/// any previous one. All-or-nothing: a failure on any file leaves the
/// previous index untouched.
async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("files") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload.pdf").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidInput(format!("Failed to read upload: {}", e)))?;
        files.push(UploadedFile {
            name,
            bytes: bytes.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(ApiError::InvalidInput("No files provided".to_string()));
    }

    let index = ingest::build_index(&state.config, &files)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "upload failed");
            ApiError::ProcessingFailure(format!("Failed to process files: {}", e))
        })?;

    let count = files.len();
    let stats = index.stats();
    *state.index.write().await = Some(Arc::new(index));
    tracing::info!(
        documents = count,
        chunks = stats.chunk_count,
        "index replaced"
    );

    Ok(Json(UploadResponse {
        message: format!("Successfully processed {} document(s).", count),
    }))
}

// ============ POST /api/ask ============

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

/// Handler for `POST /api/ask`.
///
/// The no-index check runs before the question check, so asking before
/// any upload is a 400 regardless of the body's content.
async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let index = state.index.read().await.clone().ok_or_else(|| {
        ApiError::InvalidInput("Please upload and process documents first.".to_string())
    })?;

    let question = match req.question.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return Err(ApiError::InvalidInput("No question provided.".to_string())),
    };

    let answer = pipeline::answer(&state.config, &index, &question)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "ask failed");
            ApiError::ProcessingFailure(format!("Failed to generate answer: {}", e))
        })?;

    Ok(Json(AskResponse { answer }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_400() {
        let resp = ApiError::InvalidInput("No files provided".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn processing_failure_maps_to_500() {
        let resp = ApiError::ProcessingFailure("boom".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
