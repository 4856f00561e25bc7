//! Vector store abstraction layer.
//!
//! This module provides a trait-based abstraction over the supported vector store
//! backends (Pinecone, Qdrant, in-process memory) so the rest of the service only
//! deals in records, namespaces and similarity queries.

mod memory;
mod pinecone;
mod qdrant;

pub use memory::{MemoryBackend, cosine_similarity};
pub use pinecone::PineconeBackend;
pub use qdrant::QdrantBackend;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{
    DEFAULT_EMBEDDING_DIMENSION, DocumentRecord, Namespace, RetrievedChunk, VectorDriver,
    VectorStoreConfig,
};

/// Dimension of the vectors produced by text-embedding-3-small.
pub const EMBEDDING_DIM: u64 = DEFAULT_EMBEDDING_DIMENSION;

/// Index information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub dimension: u64,
    pub record_count: u64,
    /// Number of non-empty namespaces, when the backend reports it.
    pub namespace_count: Option<u64>,
}

/// Abstract trait for vector store operations.
///
/// Records are always written to and read from exactly one namespace. Querying
/// [`Namespace::Default`] searches the store's unnamed partition only.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the vector store is healthy and accessible.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Get information about the index.
    /// Returns None if the index doesn't exist.
    async fn get_index_info(&self) -> Result<Option<IndexInfo>, VectorStoreError>;

    /// Create the index (cosine metric, configured dimension) if it doesn't exist.
    async fn create_index(&self) -> Result<(), VectorStoreError>;

    /// Insert or overwrite records in a namespace.
    async fn upsert(
        &self,
        records: Vec<DocumentRecord>,
        namespace: &Namespace,
    ) -> Result<(), VectorStoreError>;

    /// Return up to `top_k` records nearest to `vector` within `namespace`.
    async fn query(
        &self,
        vector: Vec<f32>,
        namespace: &Namespace,
        top_k: u64,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError>;

    /// Remove every record in a namespace. Missing namespaces are not an error.
    async fn delete_namespace(&self, namespace: &Namespace) -> Result<(), VectorStoreError>;

    /// Get the index/collection name.
    fn index_name(&self) -> &str;
}

/// Create a vector store backend based on configuration.
///
/// This is the main factory function that returns the appropriate backend
/// implementation based on the configuration.
pub async fn create_backend(
    config: &VectorStoreConfig,
) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    match config.driver {
        VectorDriver::Pinecone => {
            let backend = PineconeBackend::new(config)?;
            Ok(Box::new(backend))
        }
        VectorDriver::Qdrant => {
            let backend = QdrantBackend::new(config)?;
            Ok(Box::new(backend))
        }
        VectorDriver::Memory => Ok(Box::new(MemoryBackend::new(
            &config.index_name,
            config.dimension,
        ))),
    }
}
