//! OpenAI-backed prompt service.
//!
//! Enhancement goes through a rig-core agent; moderation calls the
//! `/moderations` endpoint directly since rig has no wrapper for it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use secrecy::{ExposeSecret, SecretString};

use super::prompts::{enhancement_preamble, wrap_draft};
use super::provider::PromptService;
use crate::error::LlmError;

const PROVIDER: &str = "openai";

/// Sampling temperature for the rewrite.
const TEMPERATURE: f64 = 0.5;

/// OpenAI moderation + chat completion.
pub struct OpenAiService {
    client: openai::Client,
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    /// Sent as `OpenAI-Organization` on moderation requests when set.
    organization: Option<String>,
    model: String,
    timeout: Duration,
}

impl OpenAiService {
    pub fn new(
        api_key: SecretString,
        base_url: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = openai::Client::builder()
            .api_key(api_key.expose_secret())
            .base_url(&base_url)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            })?;

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            api_key,
            base_url,
            organization: None,
            model: model.to_string(),
            timeout,
        })
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    fn moderation_url(&self) -> String {
        format!("{}/moderations", self.base_url)
    }

    /// Run `fut`, failing with [`LlmError::Timeout`] once the budget is spent.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, LlmError>>,
    ) -> Result<T, LlmError> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| LlmError::Timeout {
                provider: PROVIDER.to_string(),
                timeout: self.timeout,
            })?
    }

    fn moderation_request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .post(self.moderation_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&serde_json::json!({ "input": prompt }));
        if let Some(ref org) = self.organization {
            request = request.header("OpenAI-Organization", org.as_str());
        }
        request
    }

    async fn request_moderation(&self, prompt: &str) -> Result<bool, LlmError> {
        let resp = self
            .moderation_request(prompt)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::AuthFailed {
                provider: PROVIDER.to_string(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("moderation returned {status}: {body}"),
            });
        }

        let data: serde_json::Value = resp.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;
        parse_flagged(&data)
    }
}

/// Read `results[0].flagged` from a moderation response.
fn parse_flagged(data: &serde_json::Value) -> Result<bool, LlmError> {
    data.get("results")
        .and_then(serde_json::Value::as_array)
        .and_then(|results| results.first())
        .and_then(|first| first.get("flagged"))
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "moderation response has no results[0].flagged".to_string(),
        })
}

#[async_trait]
impl PromptService for OpenAiService {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn moderate(&self, prompt: &str) -> Result<bool, LlmError> {
        tracing::info!(chars = prompt.len(), "Moderating draft prompt");
        let flagged = self.bounded(self.request_moderation(prompt)).await?;
        tracing::info!(flagged, "Moderation finished");
        Ok(flagged)
    }

    async fn enhance(
        &self,
        instruction: &str,
        prompt: &str,
        enhancement: &str,
    ) -> Result<String, LlmError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&enhancement_preamble(instruction, enhancement))
            .temperature(TEMPERATURE)
            .build();

        tracing::info!(model = %self.model, "Requesting prompt enhancement");
        let draft = wrap_draft(prompt);
        let text = self
            .bounded(async {
                agent
                    .prompt(draft)
                    .await
                    .map_err(|e| LlmError::RequestFailed {
                        provider: PROVIDER.to_string(),
                        reason: e.to_string(),
                    })
            })
            .await?;

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "empty completion".to_string(),
            });
        }
        Ok(text)
    }
}
