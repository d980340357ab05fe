use anyhow::{anyhow, Context};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::debug;

use super::{Prompt, QueryAnswerGenerator};

/// Generation capability backed by OpenAI chat completions.
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(api_key: &str, model: &str, temperature: f32) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            temperature,
        }
    }

    fn build_request(&self, prompt: &Prompt) -> anyhow::Result<CreateChatCompletionRequest> {
        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages([
                ChatCompletionRequestSystemMessage::from(prompt.system.as_str()).into(),
                ChatCompletionRequestUserMessage::from(prompt.user.as_str()).into(),
            ])
            .build()
            .context("building chat completion request")
    }

    async fn complete(&self, request: CreateChatCompletionRequest) -> anyhow::Result<String> {
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("calling chat completion endpoint")?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or_else(|| anyhow!("no content in chat completion response"))?;

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("chat completion returned empty content"));
        }
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl QueryAnswerGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &Prompt, language: &str) -> anyhow::Result<String> {
        let retry_strategy = ExponentialBackoff::from_millis(100).map(jitter).take(3);
        let result = Retry::spawn(retry_strategy, || async {
            let request = self.build_request(prompt)?;
            self.complete(request).await
        })
        .await?;

        debug!(
            model = %self.model,
            language,
            chars = result.chars().count(),
            "generation call completed"
        );
        Ok(result)
    }
}
