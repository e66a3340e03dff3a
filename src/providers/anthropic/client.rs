//! Anthropic Client Implementation

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::types::{AnthropicMessage, MessagesRequest, MessagesResponse};
use crate::config::AnthropicSettings;
use crate::error::FlowError;
use crate::providers::http::post_json;
use crate::providers::{LlmProvider, observe_call};
use crate::registry::ids::strip_vendor_prefix;
use crate::telemetry::{CallContext, CallObserver};
use crate::types::{ChatMessage, CompletionResponse, MessageRole, RunOptions};

/// Used when the options carry no model.
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";

/// The Messages API requires `max_tokens`.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// Anthropic Messages adapter
pub struct AnthropicClient {
    api_key: SecretString,
    base_url: String,
    api_version: String,
    http_client: reqwest::Client,
    observer: Arc<dyn CallObserver>,
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("provider_name", &"anthropic")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AnthropicClient {
    pub fn new(
        settings: &AnthropicSettings,
        http_client: reqwest::Client,
        observer: Arc<dyn CallObserver>,
    ) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            http_client,
            observer,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &RunOptions,
    ) -> Result<CompletionResponse, FlowError> {
        let (system, turns): (Vec<_>, Vec<_>) = messages
            .iter()
            .partition(|m| m.role == MessageRole::System);
        let system = (!system.is_empty()).then(|| {
            system
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        });

        let body = MessagesRequest {
            model,
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: turns
                .into_iter()
                .map(|m| AnthropicMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            system,
            temperature: options.temperature,
            top_p: options.top_p,
            stop_sequences: options.stop_sequences.as_deref(),
        };

        let request = self
            .http_client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", &self.api_version);

        let response: MessagesResponse = post_json("anthropic", request, &body).await?;
        let content = Some(response.text());
        Ok(CompletionResponse {
            content,
            usage: response.usage.into(),
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn provider_name(&self) -> &'static str {
        "anthropic"
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &RunOptions,
    ) -> Result<String, FlowError> {
        let model = match strip_vendor_prefix(&options.model) {
            "" => DEFAULT_MODEL,
            model => model,
        };
        let ctx = CallContext::new("anthropic", model, "chat_completion");
        observe_call(
            self.observer.as_ref(),
            ctx,
            messages,
            options,
            self.send(model, messages, options),
        )
        .await
    }
}
