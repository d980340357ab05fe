mod openai;

pub use openai::OpenAiGenerator;

use async_trait::async_trait;

/// Prompt context handed to the generation capability. The QA stage chain
/// decides what goes into it; the capability only renders text.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Narrow interface over the external generation service. Implementations
/// own their retry and throttling policy; callers treat a returned error
/// as exhausted.
#[async_trait]
pub trait QueryAnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt, language: &str) -> anyhow::Result<String>;
}
