use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub storage: StorageConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Whole-request deadline in seconds, covering every external call
    /// a request makes.
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,
}

fn default_request_deadline_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            relevance_threshold: default_relevance_threshold(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_relevance_threshold() -> f32 {
    0.5
}

/// Object storage bucket holding the original uploaded files.
///
/// Credentials are read from `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`
/// and optionally `AWS_SESSION_TOKEN`.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

/// External vector index holding one record per chunk.
///
/// The API key is read from `VECTOR_INDEX_API_KEY`.
#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Base URL of the index, e.g. `https://finedu-index.svc.example.io`.
    pub host: String,
    #[serde(default = "default_service_timeout_secs")]
    pub timeout_secs: u64,
}

/// Hosted embedding and chat models behind one OpenAI-compatible API.
///
/// The API key is read from `MODEL_API_KEY`.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_explain_model")]
    pub explain_model: String,
    #[serde(default = "default_quiz_model")]
    pub quiz_model: String,
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_service_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            embedding_model: default_embedding_model(),
            explain_model: default_explain_model(),
            quiz_model: default_quiz_model(),
            summary_model: default_summary_model(),
            temperature: default_temperature(),
            timeout_secs: default_service_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_explain_model() -> String {
    "llama-4-scout-17b-16e-instruct".to_string()
}
fn default_quiz_model() -> String {
    "gpt-4.1-nano".to_string()
}
fn default_summary_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_service_timeout_secs() -> u64 {
    30
}

/// Remote OCR engine used for scanned PDFs.
///
/// When no endpoint is configured, uploads requesting OCR extraction
/// fail with a descriptive error. The API key is read from
/// `MODEL_API_KEY`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct OcrConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_ocr_language")]
    pub language: String,
    #[serde(default = "default_ocr_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ocr_language() -> String {
    "en".to_string()
}
fn default_ocr_timeout_secs() -> u64 {
    60
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!("chunking.chunk_overlap must be < chunking.chunk_size");
    }

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.relevance_threshold) {
        anyhow::bail!("retrieval.relevance_threshold must be in [0.0, 1.0]");
    }

    if config.storage.bucket.is_empty() {
        anyhow::bail!("storage.bucket must not be empty");
    }
    if config.index.host.is_empty() {
        anyhow::bail!("index.host must not be empty");
    }

    if !(0.0..=2.0).contains(&config.model.temperature) {
        anyhow::bail!("model.temperature must be in [0.0, 2.0]");
    }

    Ok(config)
}
