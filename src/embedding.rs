//! Embedding service client.
//!
//! Defines the [`TextEmbedder`] trait and the [`RemoteEmbedder`]
//! implementation, which calls an OpenAI-compatible `/embeddings`
//! endpoint. One batched call embeds any number of texts; there is no
//! retry policy, a failed call aborts the surrounding request.

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::error::PipelineError;

/// Turns text into fixed-length vectors via an external service.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Embed a batch of texts in one service call, returning one
    /// vector per input in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;
}

/// Embedding client for a hosted OpenAI-compatible API.
pub struct RemoteEmbedder {
    api_base: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemoteEmbedder {
    /// Build the client from configuration. Requires the
    /// `MODEL_API_KEY` environment variable.
    pub fn new(config: &ModelConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var("MODEL_API_KEY")
            .map_err(|_| anyhow::anyhow!("MODEL_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.embedding_model.clone(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl TextEmbedder for RemoteEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::upstream("embedding", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                "embedding",
                format!(
                    "HTTP {}: {}",
                    status,
                    detail.chars().take(500).collect::<String>()
                ),
            ));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::upstream("embedding", e.to_string()))?;
        parse_embeddings(&json)
    }
}

/// Extract the `data[].embedding` arrays from an embeddings response,
/// in input order.
fn parse_embeddings(json: &serde_json::Value) -> Result<Vec<Vec<f32>>, PipelineError> {
    let data = json
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| PipelineError::upstream("embedding", "missing data array in response"))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let embedding = item
            .get("embedding")
            .and_then(|e| e.as_array())
            .ok_or_else(|| {
                PipelineError::upstream("embedding", "missing embedding in response item")
            })?;

        let vector: Vec<f32> = embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();
        embeddings.push(vector);
    }

    Ok(embeddings)
}
