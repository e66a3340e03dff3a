//! OpenAI Client Implementation

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::types::{ChatCompletionRequest, ChatCompletionResponse, OpenAiMessage};
use crate::config::OpenAiSettings;
use crate::error::FlowError;
use crate::providers::http::post_json;
use crate::providers::{LlmProvider, observe_call};
use crate::registry::ids::strip_vendor_prefix;
use crate::telemetry::{CallContext, CallObserver};
use crate::types::{ChatMessage, CompletionResponse, RunOptions, Usage};

/// Used when the options carry no model.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI Chat Completions adapter
pub struct OpenAiClient {
    api_key: SecretString,
    base_url: String,
    organization: Option<String>,
    http_client: reqwest::Client,
    observer: Arc<dyn CallObserver>,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("provider_name", &"openai")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(
        settings: &OpenAiSettings,
        http_client: reqwest::Client,
        observer: Arc<dyn CallObserver>,
    ) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            organization: settings.organization.clone(),
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
        let body = ChatCompletionRequest {
            model,
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            stop: options.stop_sequences.as_deref(),
        };

        let mut request = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret());
        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response: ChatCompletionResponse = post_json("openai", request, &body).await?;
        let usage = response.usage.map(Usage::from).unwrap_or_default();
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty());

        Ok(CompletionResponse { content, usage })
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        "openai"
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
        let ctx = CallContext::new("openai", model, "chat_completion");
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
