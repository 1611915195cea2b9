//! Vector index client and the embedding-and-index gateway.
//!
//! The external index is an opaque capability behind the narrow
//! [`VectorIndex`] trait: upsert records, query nearest neighbors.
//! [`VectorGateway`] composes it with a [`TextEmbedder`] to implement
//! the two pipeline operations: `store` (upload time) and `query`
//! (generation time). Ranking of query results is finalized
//! downstream; the index's own order is passed through untouched.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::IndexConfig;
use crate::embedding::TextEmbedder;
use crate::error::PipelineError;
use crate::models::{Chunk, EmbeddingRecord, RetrievalResult};

/// Narrow contract over the hosted vector index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Upsert a batch of records in one call.
    async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<(), PipelineError>;

    /// Return the `top_k` nearest records with metadata, in the
    /// index's own nearest-neighbor order.
    async fn query(&self, vector: &[f32], top_k: usize)
        -> Result<Vec<RetrievalResult>, PipelineError>;
}

/// REST client for the hosted index.
///
/// Speaks `POST /vectors/upsert` and `POST /query` with an `Api-Key`
/// header, the wire contract of serverless vector index providers.
pub struct RemoteIndex {
    host: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemoteIndex {
    /// Build the client from configuration. Requires the
    /// `VECTOR_INDEX_API_KEY` environment variable.
    pub fn new(config: &IndexConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var("VECTOR_INDEX_API_KEY")
            .map_err(|_| anyhow::anyhow!("VECTOR_INDEX_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            host: config.host.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, PipelineError> {
        let response = self
            .client
            .post(format!("{}{}", self.host, path))
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| PipelineError::upstream("index", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                "index",
                format!(
                    "HTTP {}: {}",
                    status,
                    detail.chars().take(500).collect::<String>()
                ),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::upstream("index", e.to_string()))
    }
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<(), PipelineError> {
        let body = serde_json::json!({ "vectors": records });
        self.post("/vectors/upsert", &body).await?;
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, PipelineError> {
        let body = serde_json::json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
        });
        let json = self.post("/query", &body).await?;
        parse_matches(&json)
    }
}

/// Parse the `matches[]` of a query response into retrieval results.
fn parse_matches(json: &serde_json::Value) -> Result<Vec<RetrievalResult>, PipelineError> {
    let matches = json
        .get("matches")
        .and_then(|m| m.as_array())
        .ok_or_else(|| PipelineError::upstream("index", "missing matches array in response"))?;

    let mut results = Vec::with_capacity(matches.len());
    for item in matches {
        let score = item.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32;
        let metadata = item
            .get("metadata")
            .cloned()
            .ok_or_else(|| PipelineError::upstream("index", "match without metadata"))?;
        let metadata = serde_json::from_value(metadata)
            .map_err(|e| PipelineError::upstream("index", format!("bad metadata: {}", e)))?;
        results.push(RetrievalResult { score, metadata });
    }
    Ok(results)
}

/// The embedding-and-index gateway used by both pipeline directions.
pub struct VectorGateway {
    embedder: Arc<dyn TextEmbedder>,
    index: Arc<dyn VectorIndex>,
}

impl VectorGateway {
    pub fn new(embedder: Arc<dyn TextEmbedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embed and upsert a document's chunks.
    ///
    /// Embeds every chunk in one batched call, pairs each vector with
    /// the `"{source}_{index}"` identifier and the chunk's metadata,
    /// and upserts all records at once.
    ///
    /// Empty input is a validation error. An index rejection is logged
    /// and reported as `Ok(false)` so the caller can decide whether to
    /// retry or discard; an embedding failure is an error.
    pub async fn store(&self, chunks: &[Chunk]) -> Result<bool, PipelineError> {
        if chunks.is_empty() {
            return Err(PipelineError::Validation(
                "No documents provided for embedding storage.".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(PipelineError::upstream(
                "embedding",
                format!(
                    "expected {} vectors, got {}",
                    chunks.len(),
                    embeddings.len()
                ),
            ));
        }

        let records: Vec<EmbeddingRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, values)| EmbeddingRecord {
                id: format!("{}_{}", chunk.metadata.source, chunk.metadata.chunk_index),
                values,
                metadata: chunk.metadata.clone(),
            })
            .collect();

        match self.index.upsert(&records).await {
            Ok(()) => {
                tracing::info!(records = records.len(), "embeddings stored");
                Ok(true)
            }
            Err(err) => {
                tracing::error!(error = %err, "index rejected upsert");
                Ok(false)
            }
        }
    }

    /// Embed a query and fetch the `top_k` nearest chunks, in the
    /// index's own order.
    pub async fn query(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievalResult>, PipelineError> {
        let vectors = self.embedder.embed(&[text.to_string()]).await?;
        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::upstream("embedding", "empty embedding response"))?;
        self.index.query(&vector, top_k).await
    }
}
