//! Fixed-size token window chunking.

use std::path::Path;
use std::sync::Arc;

use tiktoken_rs::CoreBPE;
use tokenizers::Tokenizer;

use crate::error::ChunkError;
use crate::models::{DocumentChunk, IngestConfig};

/// Tokenizer used to measure and slice text.
pub trait TokenEncoding: Send + Sync {
    /// Encode text as plain content; special-token literals are not interpreted.
    fn encode(&self, text: &str) -> Result<Vec<u32>, ChunkError>;

    /// Decode a token window back to text. Fails when the window does not end on a
    /// character boundary.
    fn decode(&self, tokens: &[u32]) -> Result<String, ChunkError>;

    fn name(&self) -> &str;
}

/// The cl100k_base BPE encoding used by the OpenAI embedding models.
pub struct Cl100kEncoding {
    bpe: CoreBPE,
}

impl Cl100kEncoding {
    pub fn new() -> Result<Self, ChunkError> {
        let bpe =
            tiktoken_rs::cl100k_base().map_err(|e| ChunkError::TokenizerLoad(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenEncoding for Cl100kEncoding {
    fn encode(&self, text: &str) -> Result<Vec<u32>, ChunkError> {
        Ok(self.bpe.encode_ordinary(text))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, ChunkError> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| ChunkError::Decode {
                offset: 0,
                message: e.to_string(),
            })
    }

    fn name(&self) -> &str {
        "cl100k_base"
    }
}

/// A HuggingFace `tokenizer.json` tokenizer.
pub struct HfEncoding {
    tokenizer: Tokenizer,
    name: String,
}

impl HfEncoding {
    pub fn from_file(path: &Path) -> Result<Self, ChunkError> {
        let tokenizer =
            Tokenizer::from_file(path).map_err(|e| ChunkError::TokenizerLoad(e.to_string()))?;
        Ok(Self {
            tokenizer,
            name: path.display().to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8], name: &str) -> Result<Self, ChunkError> {
        let tokenizer =
            Tokenizer::from_bytes(bytes).map_err(|e| ChunkError::TokenizerLoad(e.to_string()))?;
        Ok(Self {
            tokenizer,
            name: name.to_string(),
        })
    }
}

impl TokenEncoding for HfEncoding {
    fn encode(&self, text: &str) -> Result<Vec<u32>, ChunkError> {
        self.tokenizer
            .encode(text, false)
            .map(|encoding| encoding.get_ids().to_vec())
            .map_err(|e| ChunkError::Encode(e.to_string()))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, ChunkError> {
        self.tokenizer
            .decode(tokens, false)
            .map_err(|e| ChunkError::Decode {
                offset: 0,
                message: e.to_string(),
            })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Splits text into contiguous, non-overlapping windows of `chunk_size` tokens.
#[derive(Clone)]
pub struct TextChunker {
    encoding: Arc<dyn TokenEncoding>,
    chunk_size: usize,
}

impl std::fmt::Debug for TextChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextChunker")
            .field("encoding", &self.encoding.name())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl TextChunker {
    /// Create a chunker from ingest settings. Uses cl100k_base unless a tokenizer file is set.
    pub fn new(config: &IngestConfig) -> Result<Self, ChunkError> {
        let encoding: Arc<dyn TokenEncoding> = match &config.tokenizer_path {
            Some(path) => Arc::new(HfEncoding::from_file(path)?),
            None => Arc::new(Cl100kEncoding::new()?),
        };
        Self::with_encoding(encoding, config.chunk_size)
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Result<Self, ChunkError> {
        Self::new(&IngestConfig::default())
    }

    pub fn with_encoding(
        encoding: Arc<dyn TokenEncoding>,
        chunk_size: usize,
    ) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidChunkSize);
        }
        Ok(Self {
            encoding,
            chunk_size,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn encoding_name(&self) -> &str {
        self.encoding.name()
    }

    pub fn count_tokens(&self, text: &str) -> Result<usize, ChunkError> {
        Ok(self.encoding.encode(text)?.len())
    }

    /// Chunk text into token windows. The final window may be shorter.
    pub fn chunk(&self, text: &str) -> Result<Vec<DocumentChunk>, ChunkError> {
        let tokens = self.encoding.encode(text)?;
        let mut chunks = Vec::with_capacity(tokens.len().div_ceil(self.chunk_size));

        let mut start = 0;
        while start < tokens.len() {
            let end = (start + self.chunk_size).min(tokens.len());
            let (content, end) = self.decode_window(&tokens, start, end)?;
            chunks.push(DocumentChunk {
                chunk_index: chunks.len() as u32,
                content,
                token_count: end - start,
            });
            start = end;
        }

        Ok(chunks)
    }

    /// Decode `tokens[start..end]`, pulling `end` back while the window splits a
    /// multi-byte character. When one character alone spans more than the window,
    /// `end` grows past it instead. Returns the text and the end actually used.
    fn decode_window(
        &self,
        tokens: &[u32],
        start: usize,
        end: usize,
    ) -> Result<(String, usize), ChunkError> {
        let mut last_err = None;
        for cut in (start + 1..=end).rev().chain(end + 1..=tokens.len()) {
            match self.encoding.decode(&tokens[start..cut]) {
                Ok(text) => return Ok((text, cut)),
                Err(ChunkError::Decode { message, .. }) => last_err = Some(message),
                Err(e) => return Err(e),
            }
        }

        Err(ChunkError::Decode {
            offset: start,
            message: last_err.unwrap_or_else(|| "empty token window".to_string()),
        })
    }
}
