//! LLM integration: moderation and enhancement of draft prompts.
//!
//! Uses the rig-core crate for chat completion and plain reqwest for the
//! moderation endpoint.

pub mod openai;
pub mod prompts;
pub mod provider;

pub use openai::OpenAiService;
pub use prompts::{ENHANCEMENT_INSTRUCTION, wrap_draft};
pub use provider::PromptService;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Default OpenAI API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Configuration for creating a prompt service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
    pub base_url: String,
    /// Optional `OpenAI-Organization` header value.
    pub organization: Option<String>,
    /// Upper bound for each moderation or enhancement call.
    pub timeout: Duration,
}

/// Create the prompt service from configuration.
pub fn create_service(config: &LlmConfig) -> Result<Arc<dyn PromptService>, LlmError> {
    let service = OpenAiService::new(
        config.api_key.clone(),
        &config.base_url,
        &config.model,
        config.timeout,
    )?
    .with_organization(config.organization.clone());
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(service))
}
