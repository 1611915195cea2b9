//! Generation gateway.
//!
//! Sends a built prompt to a hosted language model and returns its
//! text unmodified. The model id is selected by task type (one model
//! each for explanation, quiz, and summary) with a fixed sampling
//! temperature. A failed call or an empty response is terminal for
//! the request; there is no automatic retry.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ModelConfig;
use crate::error::PipelineError;
use crate::prompt::TaskType;

/// One-shot chat completion against an external model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, PipelineError>;
}

/// Chat client for a hosted OpenAI-compatible API.
pub struct RemoteChatModel {
    api_base: String,
    api_key: String,
    client: reqwest::Client,
}

impl RemoteChatModel {
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
            api_key,
            client,
        })
    }
}

#[async_trait]
impl ChatModel for RemoteChatModel {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, PipelineError> {
        let body = serde_json::json!({
            "model": model,
            "messages": [ { "role": "user", "content": prompt } ],
            "temperature": temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PipelineError::Generation(format!(
                "HTTP {}: {}",
                status,
                detail.chars().take(500).collect::<String>()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))?;
        parse_completion(&json)
    }
}

/// Extract `choices[0].message.content`, rejecting empty output.
fn parse_completion(json: &serde_json::Value) -> Result<String, PipelineError> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| PipelineError::Generation("no content in model response".to_string()))?;

    if content.is_empty() {
        return Err(PipelineError::Generation(
            "model returned empty content".to_string(),
        ));
    }
    Ok(content.to_string())
}

/// Task-aware wrapper selecting the model id and temperature.
pub struct Generator {
    chat: Arc<dyn ChatModel>,
    config: ModelConfig,
}

impl Generator {
    pub fn new(chat: Arc<dyn ChatModel>, config: ModelConfig) -> Self {
        Self { chat, config }
    }

    /// The configured model id for a task.
    pub fn model_for(&self, task: TaskType) -> &str {
        match task {
            TaskType::Explain => &self.config.explain_model,
            TaskType::Quiz => &self.config.quiz_model,
            TaskType::Summary => &self.config.summary_model,
        }
    }

    /// Invoke the task's model once with the built prompt.
    pub async fn generate(&self, prompt: &str, task: TaskType) -> Result<String, PipelineError> {
        let model = self.model_for(task);
        tracing::info!(task = task.as_str(), model, "invoking generation model");
        self.chat
            .complete(model, prompt, self.config.temperature)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice_content() {
        let json = serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": "APR explained." } } ]
        });
        assert_eq!(parse_completion(&json).unwrap(), "APR explained.");
    }

    #[test]
    fn empty_content_is_generation_error() {
        let json = serde_json::json!({
            "choices": [ { "message": { "content": "" } } ]
        });
        assert!(matches!(
            parse_completion(&json).unwrap_err(),
            PipelineError::Generation(_)
        ));
    }

    #[test]
    fn missing_choices_is_generation_error() {
        let json = serde_json::json!({ "error": { "message": "overloaded" } });
        assert!(parse_completion(&json).is_err());
    }

    #[test]
    fn model_selection_per_task() {
        struct Echo;

        #[async_trait]
        impl ChatModel for Echo {
            async fn complete(
                &self,
                model: &str,
                _prompt: &str,
                _temperature: f32,
            ) -> Result<String, PipelineError> {
                Ok(model.to_string())
            }
        }

        let generator = Generator::new(Arc::new(Echo), ModelConfig::default());
        assert_eq!(
            generator.model_for(TaskType::Explain),
            "llama-4-scout-17b-16e-instruct"
        );
        assert_eq!(generator.model_for(TaskType::Quiz), "gpt-4.1-nano");
        assert_eq!(generator.model_for(TaskType::Summary), "gemini-2.5-flash");
    }
}
