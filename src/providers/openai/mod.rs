//! OpenAI provider (Chat Completions API)

mod client;
mod types;

pub use client::{DEFAULT_MODEL, OpenAiClient};
