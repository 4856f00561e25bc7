//! Ingestion and question answering over one vector store.

use std::path::Path;
use std::sync::Arc;

use super::chat::{ChatClient, ChatModel, build_prompt};
use super::chunker::TextChunker;
use super::embedding::{Embedder, EmbeddingClient};
use super::extractor::extract_text;
use super::vector_store::{VectorStore, create_backend};
use crate::error::{AppError, ChunkError, IngestError, QueryError};
use crate::models::{Config, DocumentChunk, DocumentRecord, IngestSummary, Namespace};

/// Shared handle to the embedding model, chat model and vector store.
pub struct RagService {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    store: Arc<dyn VectorStore>,
    chunker: TextChunker,
    top_k: u64,
    system_prompt: String,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStore>,
        chunker: TextChunker,
    ) -> Self {
        Self {
            embedder,
            chat,
            store,
            chunker,
            top_k: crate::models::DEFAULT_TOP_K,
            system_prompt: crate::models::RetrievalConfig::default().system_prompt,
        }
    }

    pub fn with_top_k(mut self, top_k: u64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Build the clients from configuration and make sure the index exists.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let embedder = EmbeddingClient::new(&config.azure)?;
        let chat = ChatClient::new(&config.azure, &config.retrieval)?;
        let chunker = TextChunker::new(&config.ingest)?;
        let store = create_backend(&config.vector_store).await?;

        store.create_index().await?;

        tracing::info!(
            driver = %config.vector_store.driver,
            index = store.index_name(),
            embedding = embedder.model(),
            chat = chat.model(),
            tokenizer = chunker.encoding_name(),
            chunk_size = chunker.chunk_size(),
            "RAG service ready"
        );

        Ok(Self::new(
            Arc::new(embedder),
            Arc::new(chat),
            Arc::from(store),
            chunker,
        )
        .with_top_k(config.retrieval.top_k)
        .with_system_prompt(config.retrieval.system_prompt.clone()))
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    /// Extract, chunk, embed and upsert one PDF into `namespace`.
    ///
    /// Every chunk is embedded before anything is written, and all records go out
    /// in one upsert, so a failure leaves the namespace untouched.
    pub async fn ingest_file(
        &self,
        path: &Path,
        filename: &str,
        namespace: &Namespace,
    ) -> Result<IngestSummary, IngestError> {
        let text = extract_text(path).await?;
        // Scanned or blank PDFs extract to layout whitespace only.
        let chunks = if text.trim().is_empty() {
            Vec::new()
        } else {
            self.chunk_text(text).await?
        };

        let summary = IngestSummary {
            session_id: namespace.as_str().to_string(),
            filename: filename.to_string(),
            chunk_count: chunks.len(),
        };

        if chunks.is_empty() {
            tracing::warn!(%namespace, filename, "document has no extractable text");
            return Ok(summary);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.len() != chunks.len() {
            return Err(crate::error::EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            ))
            .into());
        }

        let records: Vec<DocumentRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, values)| DocumentRecord::from_chunk(chunk, filename, values))
            .collect();

        self.store.upsert(records, namespace).await?;

        tracing::info!(
            %namespace,
            filename,
            chunks = summary.chunk_count,
            "document indexed"
        );
        Ok(summary)
    }

    async fn chunk_text(&self, text: String) -> Result<Vec<DocumentChunk>, ChunkError> {
        let chunker = self.chunker.clone();
        tokio::task::spawn_blocking(move || chunker.chunk(&text))
            .await
            .map_err(|e| ChunkError::Encode(e.to_string()))?
    }

    /// Answer `question` from the `top_k` nearest chunks in the session's namespace.
    ///
    /// Without a session id the query runs against the default namespace, which
    /// uploads never write to.
    pub async fn answer(
        &self,
        question: &str,
        session_id: Option<&str>,
    ) -> Result<String, QueryError> {
        let namespace = Namespace::from_session_id(session_id);
        if namespace.is_default() {
            tracing::warn!("query without session_id; searching the default namespace");
        }

        let vector = self.embedder.embed_query(question).await?;
        let matches = self.store.query(vector, &namespace, self.top_k).await?;
        tracing::debug!(%namespace, matches = matches.len(), "retrieved context");

        let context: Vec<String> = matches.into_iter().map(|m| m.text).collect();
        let prompt = build_prompt(question, &context);

        Ok(self.chat.complete(&self.system_prompt, &prompt).await?)
    }

    /// Drop every record in a session's namespace.
    pub async fn reset(&self, namespace: &Namespace) -> Result<(), QueryError> {
        self.store.delete_namespace(namespace).await?;
        tracing::info!(%namespace, "namespace cleared");
        Ok(())
    }
}
