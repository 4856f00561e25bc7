pub(crate) mod azure;
mod chat;
mod chunker;
mod embedding;
mod extractor;
mod pipeline;
pub mod vector_store;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatClient, ChatModel, build_prompt};
pub use chunker::{Cl100kEncoding, HfEncoding, TextChunker, TokenEncoding};
pub use embedding::{Embedder, EmbeddingClient};
pub use extractor::extract_text;
pub use pipeline::RagService;
pub use vector_store::{
    EMBEDDING_DIM, IndexInfo, MemoryBackend, PineconeBackend, QdrantBackend, VectorStore,
    create_backend,
};
