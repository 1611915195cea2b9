//! Error taxonomy for the ingestion and generation pipeline.
//!
//! Every failure in the pipeline is one of these variants. The HTTP
//! layer splits them into caller errors (4xx, specific message) and
//! internal/upstream errors (5xx, generic per-stage message with the
//! detail logged, never exposed).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad user input (wrong file type, missing PDF method, short
    /// query). Reported to the caller verbatim, never retried.
    #[error("{0}")]
    Validation(String),

    /// File extension or PDF processing method outside the supported
    /// set, detected inside the extraction stage.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Uploaded bytes are not valid UTF-8.
    #[error("text decoding failed: {0}")]
    Decode(String),

    /// The PDF parser or OCR engine could not extract text.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Invalid chunk size/overlap parameters.
    #[error("chunking failed: {0}")]
    Chunking(String),

    /// Task type outside explain/quiz/summary.
    #[error("unsupported task type: {0}")]
    UnsupportedTask(String),

    /// A storage, embedding, index, or OCR service call failed.
    #[error("{service} request failed: {detail}")]
    Upstream {
        service: &'static str,
        detail: String,
    },

    /// The language model call failed or returned no usable content.
    #[error("generation failed: {0}")]
    Generation(String),
}

impl PipelineError {
    pub fn upstream(service: &'static str, detail: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            detail: detail.into(),
        }
    }

    /// True when the failure was caused by the caller's input and the
    /// specific message is safe to return with a 4xx status.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnsupportedTask(_))
    }
}
