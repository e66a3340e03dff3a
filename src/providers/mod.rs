//! Provider adapters
//!
//! One adapter per vendor, all behind [`LlmProvider`]. Adapters translate the
//! uniform call into the vendor's wire format, normalize the vendor's typed
//! response into [`CompletionResponse`], and report every call to the
//! configured [`CallObserver`]. Vendor failures leave an adapter only as a
//! [`FlowError`] that went through [`CallObserver::on_api_error`].

use std::future::Future;

use async_trait::async_trait;

use crate::error::FlowError;
use crate::telemetry::{CallContext, CallObserver};
use crate::types::{ChatMessage, CompletionResponse, RunOptions};

pub(crate) mod http;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

/// Uniform execution contract implemented by every vendor adapter.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stable vendor name, e.g. `"openai"`.
    fn provider_name(&self) -> &'static str;

    /// Single-turn convenience: send `prompt` as one user message.
    async fn execute(&self, prompt: &str, options: &RunOptions) -> Result<String, FlowError> {
        self.chat_completion(&[ChatMessage::user(prompt)], options)
            .await
    }

    /// Run a chat completion and return the assistant text.
    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        options: &RunOptions,
    ) -> Result<String, FlowError>;
}

impl std::fmt::Debug for dyn LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmProvider")
            .field("provider_name", &self.provider_name())
            .finish()
    }
}

/// Drive one vendor call through the observer hooks.
pub(crate) async fn observe_call<F>(
    observer: &dyn CallObserver,
    ctx: CallContext,
    messages: &[ChatMessage],
    options: &RunOptions,
    call: F,
) -> Result<String, FlowError>
where
    F: Future<Output = Result<CompletionResponse, FlowError>>,
{
    let started = observer.on_call_start(&ctx);
    let response = match call.await {
        Ok(response) => response,
        Err(error) => return Err(observer.on_api_error(error, &ctx)),
    };

    // The vendor answered, so the call completes before content is checked.
    let duration = observer.on_call_complete(&ctx, &response.usage, options, started);
    let Some(content) = response.content else {
        let error = FlowError::ProviderApi {
            provider: ctx.provider.to_string(),
            status: None,
            message: "Message content is null or empty".to_string(),
            details: None,
        };
        return Err(observer.on_api_error(error, &ctx));
    };
    observer.on_token_usage(messages, &content, &response.usage, &ctx, options, duration);
    Ok(content)
}
