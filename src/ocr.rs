//! OCR engine abstraction and implementations.
//!
//! The OCR engine is a narrow external capability: given a PDF and a
//! page number, return the text tokens recognized on that page. Two
//! implementations exist:
//! - [`DisabledOcr`], used when no OCR endpoint is configured; every
//!   call fails with a descriptive error.
//! - [`RemoteOcr`], which posts the document to an OCR HTTP service
//!   that renders the requested page and recognizes it server-side.

use async_trait::async_trait;
use base64::Engine as _;

use crate::config::OcrConfig;
use crate::error::PipelineError;

/// Page-level optical character recognition.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize the tokens on one page (1-based) of a PDF document.
    async fn recognize_page(&self, document: &[u8], page: u32)
        -> Result<Vec<String>, PipelineError>;
}

/// No-op engine used when `[ocr]` has no endpoint configured.
pub struct DisabledOcr;

#[async_trait]
impl OcrEngine for DisabledOcr {
    async fn recognize_page(
        &self,
        _document: &[u8],
        _page: u32,
    ) -> Result<Vec<String>, PipelineError> {
        Err(PipelineError::upstream(
            "ocr",
            "no OCR endpoint configured; set [ocr] endpoint to enable ocr based extraction",
        ))
    }
}

/// OCR over HTTP. The service receives the base64 document, a page
/// number and a language restriction, and returns the recognized
/// tokens for that page in reading order.
pub struct RemoteOcr {
    endpoint: String,
    language: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemoteOcr {
    /// Build the client from configuration. Requires an endpoint and
    /// the `MODEL_API_KEY` environment variable.
    pub fn new(config: &OcrConfig) -> anyhow::Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| anyhow::anyhow!("ocr.endpoint required for remote OCR"))?;
        let api_key = std::env::var("MODEL_API_KEY")
            .map_err(|_| anyhow::anyhow!("MODEL_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            endpoint,
            language: config.language.clone(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl OcrEngine for RemoteOcr {
    async fn recognize_page(
        &self,
        document: &[u8],
        page: u32,
    ) -> Result<Vec<String>, PipelineError> {
        let body = serde_json::json!({
            "document": base64::engine::general_purpose::STANDARD.encode(document),
            "page": page,
            "language": self.language,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::upstream("ocr", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                "ocr",
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
            .map_err(|e| PipelineError::upstream("ocr", e.to_string()))?;
        parse_tokens(&json)
    }
}

/// Pull the `tokens` array out of an OCR response.
fn parse_tokens(json: &serde_json::Value) -> Result<Vec<String>, PipelineError> {
    let tokens = json
        .get("tokens")
        .and_then(|t| t.as_array())
        .ok_or_else(|| PipelineError::upstream("ocr", "missing tokens array in response"))?;

    Ok(tokens
        .iter()
        .filter_map(|t| t.as_str())
        .map(|t| t.to_string())
        .collect())
}
