//! Core data types shared by flows and provider adapters.

mod chat;
mod options;
mod output;

pub use chat::{ChatMessage, CompletionResponse, MessageRole, Usage};
pub use options::RunOptions;
pub use output::FlowOutput;
