//! Anthropic provider (Messages API)

mod client;
mod types;

pub use client::{AnthropicClient, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
