mod config;
mod document;
mod search;
mod session;

pub use config::{
    AzureConfig, Config, DEFAULT_API_VERSION, DEFAULT_CHAT_DEPLOYMENT, DEFAULT_CHUNK_SIZE,
    DEFAULT_EMBEDDING_DEPLOYMENT, DEFAULT_EMBEDDING_DIMENSION, DEFAULT_INDEX_NAME, DEFAULT_TOP_K,
    IngestConfig, PineconeConfig, QdrantConfig, RetrievalConfig, ServerConfig, VectorDriver,
    VectorStoreConfig,
};
pub use document::{DocumentChunk, DocumentRecord, RecordMetadata, RetrievedChunk};
pub use search::{
    HealthResponse, IngestSummary, MessageResponse, OutputFormat, QueryRequest, QueryResponse,
    ResetRequest, UploadResponse,
};
pub use session::Namespace;
