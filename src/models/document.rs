use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A token-bounded slice of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_index: u32,
    pub content: String,
    pub token_count: usize,
}

/// Metadata stored alongside every vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub text: String,
    pub filename: String,
    #[serde(default)]
    pub chunk_index: u32,
}

/// Unit of storage in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: RecordMetadata,
}

impl DocumentRecord {
    /// Record ids are random, so re-uploading a document adds records instead of replacing them.
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn from_chunk(chunk: DocumentChunk, filename: &str, values: Vec<f32>) -> Self {
        Self {
            id: Self::generate_id(),
            values,
            metadata: RecordMetadata {
                text: chunk.content,
                filename: filename.to_string(),
                chunk_index: chunk.chunk_index,
            },
        }
    }
}

/// A record returned by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub filename: Option<String>,
}
