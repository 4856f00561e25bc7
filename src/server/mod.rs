//! HTTP surface: router construction and the serve loop.

mod error;
mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::{Config, IngestConfig, ServerConfig};
use crate::services::RagService;

pub use error::{ApiError, ErrorBody};
pub use handlers::AppState;

/// Build the router: routes, CORS for the one allowed origin, body limit and tracing.
pub fn create_app(
    state: AppState,
    server: &ServerConfig,
    ingest: &IngestConfig,
) -> Result<Router, AppError> {
    let origin = HeaderValue::from_str(&server.cors_origin).map_err(|e| {
        AppError::Server(format!("invalid CORS origin '{}': {}", server.cors_origin, e))
    })?;

    Ok(Router::new()
        .route("/upload", post(handlers::upload_handler))
        .route("/query", post(handlers::query_handler))
        .route("/reset", post(handlers::reset_handler))
        .route("/health", get(handlers::health_handler))
        .layer(DefaultBodyLimit::max(ingest.max_upload_bytes))
        .layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Build the service from configuration and serve until Ctrl-C or SIGTERM.
pub async fn run_server(config: Config) -> Result<(), AppError> {
    let service = Arc::new(RagService::from_config(&config).await?);
    let state = AppState::new(service, &config.ingest);
    let app = create_app(state, &config.server, &config.ingest)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| AppError::Server(format!("failed to bind {}: {}", config.server.bind, e)))?;

    tracing::info!(
        bind = %config.server.bind,
        cors_origin = %config.server.cors_origin,
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Server(e.to_string()))?;

    tracing::info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use crate::models::{Namespace, QueryResponse, UploadResponse};
    use crate::services::testing::{
        EchoChat, FailingChat, FailingEmbedder, FakeEmbedder, TEST_DIMENSION, write_pdf,
    };
    use crate::services::{ChatModel, Embedder, MemoryBackend, TextChunker, VectorStore};

    const BOUNDARY: &str = "ragdoc-test-boundary";

    struct TestApp {
        app: Router,
        embedder: Arc<FakeEmbedder>,
        store: Arc<MemoryBackend>,
        upload_dir: tempfile::TempDir,
    }

    fn test_app_with(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
    ) -> (Router, Arc<MemoryBackend>, tempfile::TempDir) {
        let store = Arc::new(MemoryBackend::new("test", TEST_DIMENSION));
        let upload_dir = tempfile::tempdir().unwrap();
        let mut ingest = IngestConfig::default();
        ingest.upload_dir = Some(upload_dir.path().to_path_buf());

        let service = RagService::new(
            embedder,
            chat,
            store.clone(),
            TextChunker::new(&ingest).unwrap(),
        );
        let state = AppState::new(Arc::new(service), &ingest);
        let app = create_app(state, &ServerConfig::default(), &ingest).unwrap();
        (app, store, upload_dir)
    }

    fn test_app() -> TestApp {
        let embedder = Arc::new(FakeEmbedder::new());
        let (app, store, upload_dir) = test_app_with(embedder.clone(), Arc::new(EchoChat::new()));
        TestApp {
            app,
            embedder,
            store,
            upload_dir,
        }
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixture.pdf");
        write_pdf(&path, pages);
        std::fs::read(path).unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn dir_is_empty(dir: &tempfile::TempDir) -> bool {
        std::fs::read_dir(dir.path()).unwrap().next().is_none()
    }

    #[tokio::test]
    async fn test_health() {
        let t = test_app();
        let response = t
            .app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body, serde_json::json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let t = test_app();
        let response = t
            .app
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "https://fullstack-dinesh.github.io")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "https://fullstack-dinesh.github.io"
        );
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_rejected_without_remote_calls() {
        let t = test_app();
        let response = t
            .app
            .oneshot(multipart_request("file", "notes.txt", b"plain text"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, "unsupported_file_type");
        assert_eq!(body.detail, "Only PDF files supported");
        assert_eq!(t.embedder.calls(), 0);
        assert!(dir_is_empty(&t.upload_dir));
    }

    #[tokio::test]
    async fn test_uppercase_pdf_extension_is_rejected() {
        let t = test_app();
        let pdf = pdf_bytes(&["Shouting filename"]);
        let response = t
            .app
            .oneshot(multipart_request("file", "X.PDF", &pdf))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, "unsupported_file_type");
        assert_eq!(t.embedder.calls(), 0);
        assert!(dir_is_empty(&t.upload_dir));
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let t = test_app();
        let response = t
            .app
            .oneshot(multipart_request("attachment", "doc.pdf", b"%PDF"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, "missing_file");
    }

    #[tokio::test]
    async fn test_upload_then_query_session() {
        let t = test_app();
        let pdf = pdf_bytes(&["Ferris is the Rust mascot"]);

        let response = t
            .app
            .clone()
            .oneshot(multipart_request("file", "mascot.pdf", &pdf))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let upload: UploadResponse = body_json(response).await;
        assert_eq!(upload.message, "Processed 1 chunks");
        assert!(uuid::Uuid::parse_str(&upload.session_id).is_ok());
        assert!(dir_is_empty(&t.upload_dir));
        assert_eq!(
            t.store
                .count(&Namespace::Session(upload.session_id.clone()))
                .await,
            1
        );

        let response = t
            .app
            .clone()
            .oneshot(json_request(
                "/query",
                serde_json::json!({"question": "Who is Ferris?", "session_id": upload.session_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let answer: QueryResponse = body_json(response).await;
        assert!(answer.answer.contains("Ferris is the Rust mascot"));

        let response = t
            .app
            .oneshot(json_request(
                "/query",
                serde_json::json!({"question": "Who is Ferris?"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let answer: QueryResponse = body_json(response).await;
        assert!(!answer.answer.contains("mascot"));
    }

    #[tokio::test]
    async fn test_failed_upload_returns_code_and_cleans_up() {
        let (app, store, upload_dir) = test_app_with(Arc::new(FailingEmbedder), Arc::new(EchoChat::new()));
        let pdf = pdf_bytes(&["Some content"]);

        let response = app
            .oneshot(multipart_request("file", "doc.pdf", &pdf))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, "embedding_failed");
        assert!(!body.detail.contains("401"));
        assert!(dir_is_empty(&upload_dir));
        let info = store.get_index_info().await.unwrap().unwrap();
        assert_eq!(info.record_count, 0);
    }

    #[tokio::test]
    async fn test_query_generation_failure() {
        let (app, _store, _upload_dir) =
            test_app_with(Arc::new(FakeEmbedder::new()), Arc::new(FailingChat));
        let response = app
            .oneshot(json_request(
                "/query",
                serde_json::json!({"question": "Anything?", "session_id": "s-1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, "generation_failed");
        assert!(!body.detail.contains("boom"));
        assert!(!body.detail.contains("500"));
    }

    #[tokio::test]
    async fn test_query_embedding_failure() {
        let (app, _store, _upload_dir) =
            test_app_with(Arc::new(FailingEmbedder), Arc::new(EchoChat::new()));
        let response = app
            .oneshot(json_request(
                "/query",
                serde_json::json!({"question": "Anything?", "session_id": "s-1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, "embedding_failed");
        assert!(!body.detail.contains("401"));
    }

    #[tokio::test]
    async fn test_malformed_pdf_upload() {
        let t = test_app();
        let response = t
            .app
            .oneshot(multipart_request("file", "broken.pdf", b"not really a pdf"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, "extraction_failed");
        assert!(dir_is_empty(&t.upload_dir));
        assert_eq!(t.embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_with_invalid_json() {
        let t = test_app();
        let response = t
            .app
            .oneshot(json_request("/query", serde_json::json!({"session_id": "x"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = body_json(response).await;
        assert_eq!(body.code, "invalid_request");
    }

    #[tokio::test]
    async fn test_reset() {
        let t = test_app();
        let pdf = pdf_bytes(&["Short lived"]);
        let response = t
            .app
            .clone()
            .oneshot(multipart_request("file", "doc.pdf", &pdf))
            .await
            .unwrap();
        let upload: UploadResponse = body_json(response).await;

        let response = t
            .app
            .clone()
            .oneshot(json_request(
                "/reset",
                serde_json::json!({"session_id": upload.session_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            t.store
                .count(&Namespace::Session(upload.session_id.clone()))
                .await,
            0
        );

        let response = t
            .app
            .oneshot(json_request("/reset", serde_json::json!({"session_id": " "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_cors_origin() {
        let server = ServerConfig {
            cors_origin: "bad\norigin".to_string(),
            ..Default::default()
        };
        let store = Arc::new(MemoryBackend::new("test", TEST_DIMENSION));
        let ingest = IngestConfig::default();
        let service = RagService::new(
            Arc::new(FakeEmbedder::new()),
            Arc::new(EchoChat::new()),
            store,
            TextChunker::new(&ingest).unwrap(),
        );
        let state = AppState::new(Arc::new(service), &ingest);
        assert!(matches!(
            create_app(state, &server, &ingest),
            Err(AppError::Server(_))
        ));
    }
}
