//! Route handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use tokio::sync::Semaphore;

use super::error::ApiError;
use crate::error::IngestError;
use crate::models::{
    HealthResponse, IngestConfig, MessageResponse, Namespace, QueryRequest, QueryResponse,
    ResetRequest, UploadResponse,
};
use crate::services::RagService;
use crate::utils::{TempFile, is_pdf_filename, temp_upload_path};

const FILE_FIELD: &str = "file";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RagService>,
    pub ingest_permits: Arc<Semaphore>,
    pub upload_dir: PathBuf,
}

impl AppState {
    pub fn new(service: Arc<RagService>, ingest: &IngestConfig) -> Self {
        Self {
            service,
            ingest_permits: Arc::new(Semaphore::new(ingest.max_concurrent.max(1))),
            upload_dir: ingest.upload_dir(),
        }
    }
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidMultipart(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !is_pdf_filename(&filename) {
            return Err(ApiError::UnsupportedFileType);
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidMultipart(e.body_text()))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or(ApiError::MissingFile)?;

    let _permit = state
        .ingest_permits
        .acquire()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let namespace = Namespace::new_session();
    tracing::info!(%namespace, filename = %filename, bytes = bytes.len(), "upload received");

    let temp = TempFile::write(temp_upload_path(&state.upload_dir, &namespace), &bytes)
        .await
        .map_err(IngestError::Io)?;
    let summary = state
        .service
        .ingest_file(temp.path(), &filename, &namespace)
        .await?;

    Ok(Json(UploadResponse {
        message: summary.message(),
        session_id: summary.session_id,
    }))
}

pub async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    let answer = state
        .service
        .answer(&request.question, request.session_id.as_deref())
        .await?;

    Ok(Json(QueryResponse { answer }))
}

pub async fn reset_handler(
    State(state): State<AppState>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    let namespace = Namespace::from_session_id(request.session_id.as_deref());
    if namespace.is_default() {
        return Err(ApiError::InvalidRequest(
            "session_id is required".to_string(),
        ));
    }

    state.service.reset(&namespace).await?;

    Ok(Json(MessageResponse {
        message: format!("Session {namespace} reset"),
    }))
}
