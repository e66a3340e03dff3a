//! Telemetry and Observability
//!
//! Every provider call reports to a [`CallObserver`]:
//!
//! 1. `on_call_start` before the request is sent
//! 2. `on_call_complete` once the vendor answered, yielding the call duration
//! 3. `on_token_usage` with the messages, the returned content and usage
//! 4. `on_api_error` when the vendor call failed; it receives the typed error
//!    and returns the error the adapter propagates
//!
//! All methods have `tracing`-based default implementations, so
//! [`TracingObserver`] is just the trait with nothing overridden. Install a
//! custom observer on the [`ProviderResolver`](crate::registry::ProviderResolver)
//! to forward these hooks to an external collector.
//!
//! [`subscriber`] contains opt-in helpers for installing a `tracing` subscriber.

pub mod subscriber;

use std::time::{Duration, Instant};

use crate::error::FlowError;
use crate::types::{ChatMessage, RunOptions, Usage};

/// Identifies one provider call in telemetry output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub provider: &'static str,
    pub model: String,
    pub operation: &'static str,
}

impl CallContext {
    pub fn new(provider: &'static str, model: impl Into<String>, operation: &'static str) -> Self {
        Self {
            provider,
            model: model.into(),
            operation,
        }
    }
}

/// Hooks invoked around every provider call.
pub trait CallObserver: Send + Sync {
    fn on_call_start(&self, ctx: &CallContext) -> Instant {
        tracing::debug!(
            provider = ctx.provider,
            model = %ctx.model,
            operation = ctx.operation,
            "LLM call started"
        );
        Instant::now()
    }

    fn on_call_complete(
        &self,
        ctx: &CallContext,
        usage: &Usage,
        options: &RunOptions,
        started: Instant,
    ) -> Duration {
        let duration = started.elapsed();
        tracing::info!(
            provider = ctx.provider,
            model = %ctx.model,
            operation = ctx.operation,
            duration_ms = duration.as_millis() as u64,
            total_tokens = usage.total_tokens,
            temperature = ?options.temperature,
            max_tokens = ?options.max_tokens,
            "LLM call completed"
        );
        duration
    }

    fn on_token_usage(
        &self,
        messages: &[ChatMessage],
        content: &str,
        usage: &Usage,
        ctx: &CallContext,
        _options: &RunOptions,
        duration: Duration,
    ) {
        tracing::debug!(
            provider = ctx.provider,
            model = %ctx.model,
            messages = messages.len(),
            content_chars = content.chars().count(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            duration_ms = duration.as_millis() as u64,
            "LLM token usage"
        );
    }

    /// Uniform error handler: log and hand back the typed failure.
    fn on_api_error(&self, error: FlowError, ctx: &CallContext) -> FlowError {
        tracing::error!(
            provider = ctx.provider,
            model = %ctx.model,
            operation = ctx.operation,
            status = ?error.status_code(),
            retryable = error.is_retryable(),
            "LLM call failed: {error}"
        );
        error
    }
}

/// Default observer: logs every hook through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {}
