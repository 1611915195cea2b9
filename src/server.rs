//! HTTP surface of the service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness probe |
//! | `POST` | `/upload-file` | Ingest a PDF or TXT document |
//! | `POST` | `/generate-content` | Retrieve context and generate |
//!
//! # Error Contract
//!
//! Failures return `{ "error": "<message>" }`. Caller mistakes (bad
//! file type, missing PDF method, short query, unknown task) get a
//! 400 with a specific message; everything else gets a 500 with a
//! generic per-stage message. Internal detail is logged under a
//! per-request id and never leaks to the caller.
//!
//! # Request lifecycle
//!
//! Each request runs as its own task with no shared mutable state;
//! the only shared state is the immutable [`AppState`] bundle of
//! config and service clients. A whole-request deadline covers every
//! external call a request makes. Uploaded files are staged in a
//! request-scoped temporary directory that is deleted on every exit
//! path.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

use crate::chunk::chunk_text;
use crate::clean::clean_text;
use crate::config::Config;
use crate::context::assemble_context;
use crate::error::PipelineError;
use crate::extract::{extract_text, PdfMethod};
use crate::generate::Generator;
use crate::index::VectorGateway;
use crate::models::Chunk;
use crate::ocr::OcrEngine;
use crate::prompt::{build_prompt, TaskType};
use crate::query::parse_user_query;
use crate::storage::ObjectStorage;

/// Maximum accepted upload size.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state: immutable config plus the injected
/// service clients, cheap to clone across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn ObjectStorage>,
    pub gateway: Arc<VectorGateway>,
    pub generator: Arc<Generator>,
    pub ocr: Arc<dyn OcrEngine>,
}

/// Start the HTTP server and serve until the process terminates.
pub async fn run_server(state: AppState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind.clone();
    let deadline = Duration::from_secs(state.config.server.request_deadline_secs);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(handle_root))
        .route("/upload-file", post(handle_upload))
        .route("/generate-content", post(handle_generate))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TimeoutLayer::new(deadline))
        .layer(cors)
        .with_state(state);

    tracing::info!("listening on http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

/// An HTTP failure: status plus the caller-facing message.
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ============ GET / ============

/// Liveness probe.
async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "FinEduGuide API is running" }))
}

// ============ POST /upload-file ============

/// Multipart fields read from an upload request.
struct UploadRequest {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
    pdf_processing_method: Option<String>,
}

/// Handler for `POST /upload-file`.
///
/// Validates the declared media type and (for PDFs) the processing
/// method, stages the file, then runs extract → clean → chunk →
/// storage upload → embedding store. Every stage failure maps to the
/// stage's generic message; any unexpected error becomes one generic
/// 500 so the caller never sees internals.
async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let request_id = uuid::Uuid::new_v4();

    let upload = read_upload(multipart).await?;
    tracing::info!(%request_id, file = %upload.filename, "received file upload request");

    if upload.content_type != "application/pdf" && upload.content_type != "text/plain" {
        tracing::error!(%request_id, content_type = %upload.content_type, "unsupported file type");
        return Err(AppError::bad_request(
            "Unsupported file type. Upload PDF or TXT only.",
        ));
    }

    let pdf_method = if upload.content_type == "application/pdf" {
        let raw = upload.pdf_processing_method.as_deref().ok_or_else(|| {
            AppError::bad_request("pdf_processing_method is required for PDF files")
        })?;
        let method = PdfMethod::parse(raw).ok_or_else(|| {
            tracing::error!(%request_id, method = raw, "invalid PDF processing method");
            AppError::bad_request(
                "Invalid PDF processing method. Use 'standard text extraction' or 'ocr based extraction'.",
            )
        })?;
        Some(method)
    } else {
        None
    };

    run_upload_pipeline(&state, &upload, pdf_method, request_id).await
}

/// The staged part of the upload flow. The `TempDir` drop guard
/// guarantees the staging copy is removed on every return path.
async fn run_upload_pipeline(
    state: &AppState,
    upload: &UploadRequest,
    pdf_method: Option<PdfMethod>,
    request_id: uuid::Uuid,
) -> Result<Json<serde_json::Value>, AppError> {
    let staging = tempfile::TempDir::new().map_err(|e| {
        tracing::error!(%request_id, error = %e, "failed to create staging directory");
        AppError::internal("Unexpected error occurred during file upload")
    })?;
    let staged_path = staging.path().join(&upload.filename);
    std::fs::write(&staged_path, &upload.bytes).map_err(|e| {
        tracing::error!(%request_id, error = %e, "failed to stage upload");
        AppError::internal("Unexpected error occurred during file upload")
    })?;
    tracing::debug!(%request_id, path = %staged_path.display(), "file staged");

    // Extract, clean, chunk.
    let chunks = match ingest_document(state, &staged_path, &upload.filename, pdf_method).await {
        Ok(chunks) => chunks,
        Err(err) => {
            tracing::error!(%request_id, error = %err, "file processing failed");
            return Err(AppError::internal("Failed to process file"));
        }
    };
    tracing::debug!(%request_id, chunks = chunks.len(), "file processed");

    // Upload the original to object storage.
    if let Err(err) = state
        .storage
        .upload(&upload.filename, &upload.bytes, &upload.content_type)
        .await
    {
        tracing::error!(%request_id, error = %err, "storage upload failed");
        return Err(AppError::internal("Failed to upload file to storage"));
    }

    // Store embeddings in the vector index.
    match state.gateway.store(&chunks).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::error!(%request_id, "vector index rejected the upsert");
            return Err(AppError::internal("Failed to store document embeddings"));
        }
        Err(err) => {
            tracing::error!(%request_id, error = %err, "embedding store failed");
            return Err(AppError::internal("Failed to store document embeddings"));
        }
    }

    tracing::info!(%request_id, file = %upload.filename, "file upload and processing completed");
    Ok(Json(serde_json::json!({
        "message": "File uploaded and processed successfully"
    })))
}

/// Extract, clean, and chunk a staged document.
async fn ingest_document(
    state: &AppState,
    path: &std::path::Path,
    filename: &str,
    pdf_method: Option<PdfMethod>,
) -> Result<Vec<Chunk>, PipelineError> {
    let text = extract_text(path, pdf_method, state.ocr.as_ref()).await?;
    let cleaned = clean_text(&text);
    chunk_text(
        &cleaned,
        filename,
        state.config.chunking.chunk_size,
        state.config.chunking.chunk_overlap,
    )
}

/// Read the multipart body: the `file` part (name, declared type,
/// bytes) and the optional `pdf_processing_method` text field.
async fn read_upload(mut multipart: Multipart) -> Result<UploadRequest, AppError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut pdf_processing_method: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("invalid multipart request: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(sanitize_filename)
                    .unwrap_or_else(|| "upload".to_string());
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("failed to read file: {}", e)))?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            Some("pdf_processing_method") => {
                let value = field.text().await.map_err(|e| {
                    AppError::bad_request(format!("failed to read pdf_processing_method: {}", e))
                })?;
                pdf_processing_method = Some(value);
            }
            _ => {}
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| AppError::bad_request("missing file field"))?;

    Ok(UploadRequest {
        filename,
        content_type,
        bytes,
        pdf_processing_method,
    })
}

/// Strip any path components from a client-supplied filename.
fn sanitize_filename(raw: &str) -> String {
    std::path::Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string()
}

// ============ POST /generate-content ============

/// Form fields of a generation request.
#[derive(Debug, Deserialize)]
struct GenerateRequest {
    user_query: String,
    task_type: String,
}

/// Handler for `POST /generate-content`.
///
/// Validates the task type and query at the boundary (no downstream
/// calls are made for invalid input), then retrieves context,
/// assembles the prompt, and invokes the task's model.
async fn handle_generate(
    State(state): State<AppState>,
    Form(request): Form<GenerateRequest>,
) -> Result<Json<String>, AppError> {
    let request_id = uuid::Uuid::new_v4();
    tracing::info!(%request_id, task = %request.task_type, "received content generation request");

    match retrieve_and_generate(&state, &request).await {
        Ok(generated) => {
            tracing::info!(%request_id, "content generated");
            Ok(Json(generated))
        }
        Err(err) if err.is_user_error() => {
            tracing::error!(%request_id, error = %err, "generation request rejected");
            Err(AppError::bad_request(user_facing_message(&err)))
        }
        Err(err) => {
            tracing::error!(%request_id, error = %err, "content generation failed");
            Err(AppError::internal("Failed to generate content"))
        }
    }
}

/// The specific message a caller error is reported with.
fn user_facing_message(err: &PipelineError) -> String {
    match err {
        PipelineError::UnsupportedTask(_) => {
            "Invalid task type. Valid options are: explain, quiz, summary".to_string()
        }
        PipelineError::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Boundary validation, retrieval, context assembly, prompt
/// construction, generation. Invalid input fails here before any
/// downstream call is made.
async fn retrieve_and_generate(
    state: &AppState,
    request: &GenerateRequest,
) -> Result<String, PipelineError> {
    let task: TaskType = request.task_type.parse()?;
    let query = parse_user_query(&request.user_query)?;

    let results = state
        .gateway
        .query(&query, state.config.retrieval.top_k)
        .await?;
    let context = assemble_context(&results, state.config.retrieval.relevance_threshold);
    let prompt = build_prompt(&context, &query, task);
    state.generator.generate(&prompt, task).await
}
