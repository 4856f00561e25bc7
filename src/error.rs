//! Error types for the RAG service.

use thiserror::Error;

/// Errors related to PDF text extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read PDF: {0}")]
    ReadError(String),

    #[error("PDF extraction aborted: {0}")]
    Aborted(String),
}

/// Errors related to tokenization and chunking.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("failed to load tokenizer: {0}")]
    TokenizerLoad(String),

    #[error("failed to encode text: {0}")]
    Encode(String),

    #[error("failed to decode token window at offset {offset}: {message}")]
    Decode { offset: usize, message: String },

    #[error("chunk size must be at least 1")]
    InvalidChunkSize,
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to build embedding client: {0}")]
    ClientError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

/// Errors related to chat completion.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to build chat client: {0}")]
    ClientError(String),

    #[error("chat server error: {0}")]
    ServerError(String),

    #[error("chat request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid chat response: {0}")]
    InvalidResponse(String),

    #[error("chat timeout")]
    Timeout,
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("index error: {0}")]
    IndexError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("delete error: {0}")]
    DeleteError(String),

    #[error("vector store client error: {0}")]
    ClientError(String),
}

/// Errors related to document ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("upload IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

/// Errors related to answering a question.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("generation error: {0}")]
    Chat(#[from] ChatError),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("{0} is not set in environment variables")]
    MissingVar(&'static str),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("chunking error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("server error: {0}")]
    Server(String),
}
