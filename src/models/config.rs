use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_API_VERSION: &str = "2023-05-15";
pub const DEFAULT_EMBEDDING_DEPLOYMENT: &str = "text-embedding-3-small";
pub const DEFAULT_CHAT_DEPLOYMENT: &str = "gpt-35-turbo";
pub const DEFAULT_INDEX_NAME: &str = "rag-index";
pub const DEFAULT_PINECONE_REGION: &str = "us-east-1";
pub const DEFAULT_PINECONE_CONTROLLER_URL: &str = "https://api.pinecone.io";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_EMBEDDING_DIMENSION: u64 = 1536;
pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_TOP_K: u64 = 3;
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ORIGIN: &str = "https://fullstack-dinesh.github.io";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub const ENV_CONFIG_PATH: &str = "RAGDOC_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub azure: AzureConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(ENV_CONFIG_PATH)
            && !path.is_empty()
        {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("ragdoc").join("config.toml"))
    }

    /// Load the config file (if any), overlay the process environment and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_file()?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_file() -> Result<Self, ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            return Self::from_toml_str(&content);
        }
        Ok(Self::default())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay environment variables. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.azure.api_key = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.azure.endpoint = Some(v);
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.azure.api_version = v;
        }
        if let Some(v) = get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT") {
            self.azure.embedding_deployment = v;
        }
        if let Some(v) = get("AZURE_OPENAI_CHAT_DEPLOYMENT") {
            self.azure.chat_deployment = v;
        }

        if let Some(v) = get("RAGDOC_VECTOR_DRIVER") {
            self.vector_store.driver =
                v.parse()
                    .map_err(|message| ConfigError::InvalidValue {
                        key: "RAGDOC_VECTOR_DRIVER",
                        message,
                    })?;
        }
        if let Some(v) = get("PINECONE_API_KEY") {
            self.vector_store.pinecone.api_key = Some(v);
        }
        if let Some(v) = get("PINECONE_INDEX_NAME") {
            self.vector_store.index_name = v;
        }
        if let Some(v) = get("PINECONE_REGION") {
            self.vector_store.pinecone.region = v;
        }
        if let Some(v) = get("QDRANT_URL") {
            self.vector_store.qdrant.url = v;
        }
        if let Some(v) = get("QDRANT_API_KEY") {
            self.vector_store.qdrant.api_key = Some(v);
        }

        if let Some(v) = get("RAGDOC_UPLOAD_DIR") {
            self.ingest.upload_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("RAGDOC_BIND") {
            self.server.bind = v;
        }
        if let Some(v) = get("RAGDOC_CORS_ORIGIN") {
            self.server.cors_origin = v;
        }

        Ok(())
    }

    /// Check that required credentials are present and settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.azure.api_key.is_none() {
            return Err(ConfigError::MissingVar("AZURE_OPENAI_API_KEY"));
        }
        if self.azure.endpoint.is_none() {
            return Err(ConfigError::MissingVar("AZURE_OPENAI_ENDPOINT"));
        }
        if self.vector_store.driver == VectorDriver::Pinecone
            && self.vector_store.pinecone.api_key.is_none()
        {
            return Err(ConfigError::MissingVar("PINECONE_API_KEY"));
        }
        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.ingest.max_concurrent == 0 {
            return Err(ConfigError::ValidationError(
                "ingest.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.azure.embedding_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "azure.embedding_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_embedding_deployment")]
    pub embedding_deployment: String,

    #[serde(default = "default_chat_deployment")]
    pub chat_deployment: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: u32,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_embedding_deployment() -> String {
    DEFAULT_EMBEDDING_DEPLOYMENT.to_string()
}

fn default_chat_deployment() -> String {
    DEFAULT_CHAT_DEPLOYMENT.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_embedding_batch_size() -> u32 {
    2048
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            api_version: default_api_version(),
            embedding_deployment: default_embedding_deployment(),
            chat_deployment: default_chat_deployment(),
            timeout_secs: default_timeout(),
            embedding_batch_size: default_embedding_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Pinecone,
    Qdrant,
    Memory,
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Pinecone => write!(f, "pinecone"),
            VectorDriver::Qdrant => write!(f, "qdrant"),
            VectorDriver::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for VectorDriver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pinecone" => Ok(VectorDriver::Pinecone),
            "qdrant" => Ok(VectorDriver::Qdrant),
            "memory" => Ok(VectorDriver::Memory),
            other => Err(format!(
                "unknown vector driver '{other}' (expected pinecone, qdrant or memory)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    #[serde(default = "default_index_name")]
    pub index_name: String,

    #[serde(default = "default_dimension")]
    pub dimension: u64,

    #[serde(default)]
    pub pinecone: PineconeConfig,

    #[serde(default)]
    pub qdrant: QdrantConfig,
}

fn default_index_name() -> String {
    DEFAULT_INDEX_NAME.to_string()
}

fn default_dimension() -> u64 {
    DEFAULT_EMBEDDING_DIMENSION
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            index_name: default_index_name(),
            dimension: default_dimension(),
            pinecone: PineconeConfig::default(),
            qdrant: QdrantConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PineconeConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_cloud")]
    pub cloud: String,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_controller_url")]
    pub controller_url: String,

    #[serde(default = "default_pinecone_api_version")]
    pub api_version: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long to wait for a freshly created index to report ready.
    #[serde(default = "default_index_ready_timeout")]
    pub index_ready_timeout_secs: u64,
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    DEFAULT_PINECONE_REGION.to_string()
}

fn default_controller_url() -> String {
    DEFAULT_PINECONE_CONTROLLER_URL.to_string()
}

fn default_pinecone_api_version() -> String {
    "2024-07".to_string()
}

fn default_index_ready_timeout() -> u64 {
    300
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            cloud: default_cloud(),
            region: default_region(),
            controller_url: default_controller_url(),
            api_version: default_pinecone_api_version(),
            timeout_secs: default_timeout(),
            index_ready_timeout_secs: default_index_ready_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// HuggingFace `tokenizer.json` used instead of cl100k_base when set.
    #[serde(default)]
    pub tokenizer_path: Option<PathBuf>,

    #[serde(default)]
    pub upload_dir: Option<PathBuf>,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_max_concurrent() -> usize {
    4
}

impl IngestConfig {
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            tokenizer_path: None,
            upload_dir: None,
            max_upload_bytes: default_max_upload_bytes(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_top_k() -> u64 {
    DEFAULT_TOP_K
}

fn default_temperature() -> f32 {
    0.3
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_cors_origin() -> String {
    DEFAULT_CORS_ORIGIN.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origin: default_cors_origin(),
        }
    }
}
