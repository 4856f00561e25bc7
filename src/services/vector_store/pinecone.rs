//! Pinecone vector store backend (REST API).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;

use super::{IndexInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{DocumentRecord, Namespace, RetrievedChunk, VectorStoreConfig};

const READY_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Pinecone rejects upsert bodies above 2 MB.
const MAX_UPSERT_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexModel>,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    name: String,
    #[serde(default)]
    dimension: Option<u64>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexStatus>,
}

impl IndexModel {
    fn is_ready(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.ready)
    }
}

#[derive(Debug, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    state: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: u64,
    metric: &'a str,
    spec: IndexSpec<'a>,
}

#[derive(Debug, Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Debug, Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [DocumentRecord],
    namespace: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: Vec<f32>,
    top_k: u64,
    include_metadata: bool,
    include_values: bool,
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, Value>>,
}

impl From<QueryMatch> for RetrievedChunk {
    fn from(m: QueryMatch) -> Self {
        let field = |key: &str| {
            m.metadata
                .as_ref()
                .and_then(|md| md.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        RetrievedChunk {
            text: field("text").unwrap_or_default(),
            filename: field("filename"),
            id: m.id,
            score: m.score,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    delete_all: bool,
    namespace: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    namespaces: std::collections::HashMap<String, NamespaceStats>,
    #[serde(default)]
    dimension: Option<u64>,
    #[serde(default)]
    total_vector_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: u64,
}

/// Pinecone serverless backend.
///
/// Control-plane calls go to the controller URL; data-plane calls go to the
/// index host, which is looked up once and cached.
pub struct PineconeBackend {
    client: Client,
    api_key: String,
    api_version: String,
    controller_url: String,
    index_name: String,
    dimension: u64,
    cloud: String,
    region: String,
    ready_timeout: Duration,
    host: OnceCell<String>,
}

impl PineconeBackend {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let pinecone = &config.pinecone;
        let api_key = pinecone.api_key.clone().ok_or_else(|| {
            VectorStoreError::ClientError("PINECONE_API_KEY is not set".to_string())
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(pinecone.timeout_secs))
            .build()
            .map_err(|e| VectorStoreError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            api_version: pinecone.api_version.clone(),
            controller_url: pinecone.controller_url.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            dimension: config.dimension,
            cloud: pinecone.cloud.clone(),
            region: pinecone.region.clone(),
            ready_timeout: Duration::from_secs(pinecone.index_ready_timeout_secs),
            host: OnceCell::new(),
        })
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    fn control(&self, method: Method, path: &str) -> RequestBuilder {
        self.request(method, format!("{}{}", self.controller_url, path))
    }

    async fn data(&self, path: &str) -> Result<RequestBuilder, VectorStoreError> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let index = self.describe_index().await?.ok_or_else(|| {
                    VectorStoreError::IndexError(format!("index '{}' not found", self.index_name))
                })?;
                index.host.map(|h| host_url(&h)).ok_or_else(|| {
                    VectorStoreError::IndexError(format!(
                        "index '{}' has no host yet",
                        self.index_name
                    ))
                })
            })
            .await?;
        Ok(self.request(Method::POST, format!("{}{}", host, path)))
    }

    async fn list_indexes(&self) -> Result<Vec<IndexModel>, VectorStoreError> {
        let response = send(self.control(Method::GET, "/indexes"), VectorStoreError::ConnectionError)
            .await?;
        let response = ensure_success(response, VectorStoreError::IndexError).await?;
        let list: IndexList = response
            .json()
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;
        Ok(list.indexes)
    }

    async fn describe_index(&self) -> Result<Option<IndexModel>, VectorStoreError> {
        let path = format!("/indexes/{}", self.index_name);
        let response = send(self.control(Method::GET, &path), VectorStoreError::ConnectionError)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response, VectorStoreError::IndexError).await?;
        let index: IndexModel = response
            .json()
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))?;
        Ok(Some(index))
    }

    async fn describe_stats(&self) -> Result<IndexStats, VectorStoreError> {
        let request = self.data("/describe_index_stats").await?.json(&serde_json::json!({}));
        let response = send(request, VectorStoreError::ConnectionError).await?;
        let response = ensure_success(response, VectorStoreError::IndexError).await?;
        response
            .json()
            .await
            .map_err(|e| VectorStoreError::IndexError(e.to_string()))
    }

    async fn wait_until_ready(&self) -> Result<(), VectorStoreError> {
        let started = Instant::now();
        loop {
            if let Some(index) = self.describe_index().await? {
                if index.is_ready() {
                    return Ok(());
                }
                tracing::debug!(
                    index = %self.index_name,
                    state = index.status.as_ref().and_then(|s| s.state.as_deref()).unwrap_or("unknown"),
                    "waiting for index to become ready"
                );
            }
            if started.elapsed() >= self.ready_timeout {
                return Err(VectorStoreError::IndexError(format!(
                    "index '{}' not ready after {}s",
                    self.index_name,
                    self.ready_timeout.as_secs()
                )));
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl VectorStore for PineconeBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.list_indexes().await.map(|_| true)
    }

    async fn get_index_info(&self) -> Result<Option<IndexInfo>, VectorStoreError> {
        let Some(index) = self.describe_index().await? else {
            return Ok(None);
        };
        if !index.is_ready() {
            return Ok(Some(IndexInfo {
                dimension: index.dimension.unwrap_or(self.dimension),
                record_count: 0,
                namespace_count: None,
            }));
        }

        let stats = self.describe_stats().await?;
        Ok(Some(IndexInfo {
            dimension: stats
                .dimension
                .or(index.dimension)
                .unwrap_or(self.dimension),
            record_count: stats.total_vector_count,
            namespace_count: Some(
                stats
                    .namespaces
                    .values()
                    .filter(|ns| ns.vector_count > 0)
                    .count() as u64,
            ),
        }))
    }

    async fn create_index(&self) -> Result<(), VectorStoreError> {
        let indexes = self.list_indexes().await?;
        if let Some(existing) = indexes.iter().find(|i| i.name == self.index_name) {
            if let Some(dimension) = existing.dimension
                && dimension != self.dimension
            {
                tracing::warn!(
                    index = %self.index_name,
                    index_dimension = dimension,
                    configured_dimension = self.dimension,
                    "existing index dimension differs from configuration"
                );
            }
            return Ok(());
        }

        tracing::info!(
            index = %self.index_name,
            dimension = self.dimension,
            cloud = %self.cloud,
            region = %self.region,
            "creating Pinecone index"
        );

        let request = CreateIndexRequest {
            name: &self.index_name,
            dimension: self.dimension,
            metric: "cosine",
            spec: IndexSpec {
                serverless: ServerlessSpec {
                    cloud: &self.cloud,
                    region: &self.region,
                },
            },
        };
        let response = send(
            self.control(Method::POST, "/indexes").json(&request),
            VectorStoreError::ConnectionError,
        )
        .await?;

        // Another process may have created it between list and create.
        if response.status() != StatusCode::CONFLICT {
            ensure_success(response, VectorStoreError::IndexError).await?;
        }

        self.wait_until_ready().await
    }

    async fn upsert(
        &self,
        records: Vec<DocumentRecord>,
        namespace: &Namespace,
    ) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let body = encode_upsert(&UpsertRequest {
            vectors: &records,
            namespace: namespace.as_str(),
        })?;
        let request = self
            .data("/vectors/upsert")
            .await?
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        let response = send(request, VectorStoreError::ConnectionError).await?;
        ensure_success(response, VectorStoreError::UpsertError).await?;
        Ok(())
    }

    async fn query(
        &self,
        vector: Vec<f32>,
        namespace: &Namespace,
        top_k: u64,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: namespace.as_str(),
        };
        let request = self.data("/query").await?.json(&body);
        let response = send(request, VectorStoreError::ConnectionError).await?;
        let response = ensure_success(response, VectorStoreError::QueryError).await?;
        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| VectorStoreError::QueryError(e.to_string()))?;

        Ok(result.matches.into_iter().map(RetrievedChunk::from).collect())
    }

    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorStoreError> {
        let body = DeleteRequest {
            delete_all: true,
            namespace: namespace.as_str(),
        };
        let request = self.data("/vectors/delete").await?.json(&body);
        let response = send(request, VectorStoreError::ConnectionError).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response, VectorStoreError::DeleteError).await?;
        Ok(())
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}

async fn send(
    request: RequestBuilder,
    on_error: fn(String) -> VectorStoreError,
) -> Result<Response, VectorStoreError> {
    request.send().await.map_err(|e| on_error(e.to_string()))
}

async fn ensure_success(
    response: Response,
    on_error: fn(String) -> VectorStoreError,
) -> Result<Response, VectorStoreError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(on_error(format!("status {}: {}", status, body)))
}

/// Serialize an upsert body, refusing one Pinecone would reject for size.
fn encode_upsert(request: &UpsertRequest<'_>) -> Result<Vec<u8>, VectorStoreError> {
    let body =
        serde_json::to_vec(request).map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;
    if body.len() > MAX_UPSERT_BYTES {
        return Err(VectorStoreError::UpsertError(format!(
            "{} records encode to {} bytes, over Pinecone's {} byte request limit; \
             use a larger chunk_size or a smaller document",
            request.vectors.len(),
            body.len(),
            MAX_UPSERT_BYTES
        )));
    }
    Ok(body)
}

/// Index hosts are returned without a scheme.
fn host_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
