//! Moderation and enhancement backend abstraction.

use async_trait::async_trait;

use crate::error::LlmError;

/// A backend that can screen a draft prompt and rewrite it.
#[async_trait]
pub trait PromptService: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Return `true` when the prompt breaks the content policy.
    async fn moderate(&self, prompt: &str) -> Result<bool, LlmError>;

    /// Rewrite `prompt` following `instruction`, filling the gaps listed in
    /// `enhancement`.
    async fn enhance(
        &self,
        instruction: &str,
        prompt: &str,
        enhancement: &str,
    ) -> Result<String, LlmError>;
}
