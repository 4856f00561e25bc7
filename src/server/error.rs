//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, QueryError, VectorStoreError};

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
}

#[derive(Debug)]
pub enum ApiError {
    UnsupportedFileType,
    MissingFile,
    InvalidMultipart(String),
    InvalidRequest(String),
    Ingest(IngestError),
    Query(QueryError),
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedFileType
            | ApiError::MissingFile
            | ApiError::InvalidMultipart(_)
            | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Ingest(_) | ApiError::Query(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UnsupportedFileType => "unsupported_file_type",
            ApiError::MissingFile => "missing_file",
            ApiError::InvalidMultipart(_) => "invalid_multipart",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::Ingest(IngestError::Io(_)) => "internal_error",
            ApiError::Ingest(IngestError::Extract(_)) => "extraction_failed",
            ApiError::Ingest(IngestError::Chunk(_)) => "chunking_failed",
            ApiError::Ingest(IngestError::Embedding(_)) => "embedding_failed",
            ApiError::Ingest(IngestError::VectorStore(_)) => "indexing_failed",
            ApiError::Query(QueryError::Embedding(_)) => "embedding_failed",
            ApiError::Query(QueryError::VectorStore(VectorStoreError::DeleteError(_))) => {
                "reset_failed"
            }
            ApiError::Query(QueryError::VectorStore(_)) => "retrieval_failed",
            ApiError::Query(QueryError::Chat(_)) => "generation_failed",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// Client-facing message. Downstream failures never expose their raw cause.
    pub fn detail(&self) -> String {
        match self {
            ApiError::UnsupportedFileType => "Only PDF files supported".to_string(),
            ApiError::MissingFile => "No file uploaded".to_string(),
            ApiError::InvalidMultipart(msg) => format!("Invalid multipart body: {msg}"),
            ApiError::InvalidRequest(msg) => msg.clone(),
            ApiError::Ingest(IngestError::Extract(_)) => {
                "Error: could not read text from the PDF".to_string()
            }
            ApiError::Ingest(IngestError::Chunk(_)) => {
                "Error: could not split the document into chunks".to_string()
            }
            ApiError::Ingest(IngestError::Embedding(_)) | ApiError::Query(QueryError::Embedding(_)) => {
                "Error: embedding service request failed".to_string()
            }
            ApiError::Ingest(IngestError::VectorStore(_)) => {
                "Error: storing document vectors failed".to_string()
            }
            ApiError::Query(QueryError::VectorStore(VectorStoreError::DeleteError(_))) => {
                "Error: clearing the session failed".to_string()
            }
            ApiError::Query(QueryError::VectorStore(_)) => {
                "Error: retrieving context failed".to_string()
            }
            ApiError::Query(QueryError::Chat(_)) => "Error: generating the answer failed".to_string(),
            ApiError::Ingest(IngestError::Io(_)) | ApiError::Internal(_) => {
                "Error: internal server error".to_string()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Ingest(e) => write!(f, "{}: {}", self.code(), e),
            ApiError::Query(e) => write!(f, "{}: {}", self.code(), e),
            ApiError::Internal(msg) => write!(f, "{}: {}", self.code(), msg),
            _ => write!(f, "{}", self.detail()),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        ApiError::Ingest(e)
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        ApiError::Query(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), detail = %self.detail(), "request rejected");
        }

        let body = ErrorBody {
            detail: self.detail(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChatError, EmbeddingError, ExtractError};

    #[test]
    fn test_client_errors_are_400() {
        assert_eq!(ApiError::UnsupportedFileType.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidRequest("session_id is required".into()).detail(),
            "session_id is required"
        );
    }

    #[test]
    fn test_downstream_errors_do_not_leak_detail() {
        let err = ApiError::from(IngestError::Embedding(EmbeddingError::ServerError(
            "status 401: key sk-secret rejected".to_string(),
        )));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "embedding_failed");
        assert!(!err.detail().contains("sk-secret"));
        assert!(err.to_string().contains("sk-secret"));
    }

    #[test]
    fn test_codes_per_stage() {
        let cases = [
            (
                ApiError::from(IngestError::Extract(ExtractError::ReadError("x".into()))),
                "extraction_failed",
            ),
            (
                ApiError::from(IngestError::VectorStore(VectorStoreError::UpsertError(
                    "x".into(),
                ))),
                "indexing_failed",
            ),
            (
                ApiError::from(QueryError::VectorStore(VectorStoreError::QueryError(
                    "x".into(),
                ))),
                "retrieval_failed",
            ),
            (
                ApiError::from(QueryError::VectorStore(VectorStoreError::DeleteError(
                    "x".into(),
                ))),
                "reset_failed",
            ),
            (
                ApiError::from(QueryError::Chat(ChatError::Timeout)),
                "generation_failed",
            ),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
        }
    }
}
