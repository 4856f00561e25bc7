//! Embedding client for generating text embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::azure::AzureDeployment;
use crate::error::EmbeddingError;
use crate::models::AzureConfig;

/// Turns text into vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts. Output index `i` belongs to input index `i`.
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_batch(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    /// Name of the model or deployment producing the vectors.
    fn model(&self) -> &str;
}

/// Request body for the embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    input: Vec<String>,
    model: &'a str,
}

/// Response from the embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Client for an Azure OpenAI embedding deployment.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    deployment: AzureDeployment,
    batch_size: usize,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &AzureConfig) -> Result<Self, EmbeddingError> {
        let deployment =
            AzureDeployment::new(config, &config.embedding_deployment, "embeddings")
                .map_err(EmbeddingError::ClientError)?;

        Ok(Self {
            deployment,
            batch_size: (config.embedding_batch_size as usize).max(1),
        })
    }

    /// Internal method to embed a single batch with one API call.
    async fn embed_single_batch(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected = texts.len();
        let request = EmbedRequest {
            input: texts,
            model: &self.deployment.deployment,
        };

        let response = self
            .deployment
            .client
            .post(&self.deployment.url)
            .header("api-key", &self.deployment.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        order_by_index(embed_response.data, expected)
    }

    /// Get the endpoint URL of the deployment.
    pub fn url(&self) -> &str {
        &self.deployment.url
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.embed_single_batch(chunk.to_vec()).await?;
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    fn model(&self) -> &str {
        &self.deployment.deployment
    }
}

/// Place each returned vector at the position of the input it was computed from.
fn order_by_index(
    data: Vec<EmbeddingData>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if data.len() != expected {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            EmbeddingError::InvalidResponse(format!("embedding index {} out of range", item.index))
        })?;
        if slot.replace(item.embedding).is_some() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "duplicate embedding index {}",
                item.index
            )));
        }
    }

    // Every slot is filled: counts match and no index repeated.
    Ok(slots.into_iter().flatten().collect())
}
