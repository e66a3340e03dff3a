//! # Siumai Flow - Prompt Flows over LLM Providers
//!
//! A flow binds one prompt template and one set of generation options to a
//! provider selected from the model name. Each run fills the template, calls
//! the provider, optionally snapshots the configuration to disk, and extracts
//! structured JSON from the reply when there is any.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Templates**: `{{name}}` placeholders with a derived variable contract
//! - **Provider Resolution**: model names map to a vendor; one shared adapter per vendor
//! - **Structured Output**: fenced or embedded JSON is extracted, with a text fallback
//! - **Versioning**: optional per-flow snapshots written as JSON files
//! - **Telemetry**: every provider call reports through `tracing` or a custom observer
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use siumai_flow::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let flow = create_flow(
//!         "Translate {{text}} to {{lang}}. Reply as JSON with a `translation` field.",
//!         RunOptions::new("gpt-4o-mini").with_temperature(0.0),
//!         None,
//!         None,
//!     )?;
//!
//!     let output = flow
//!         .run(&prompt_input!("text" => "hello", "lang" => "French"))
//!         .await?;
//!     println!("{}", output.into_value());
//!     Ok(())
//! }
//! ```
//!
//! ## Cargo Features
//!
//! - `openai`, `anthropic`: one adapter each
//! - `all-providers` (default): both
//!
//! A vendor whose feature is disabled resolves to
//! [`FlowError::ProviderUnavailable`].

pub mod config;
pub mod error;
pub mod flow;
pub mod parsing;
pub mod providers;
pub mod registry;
pub mod telemetry;
pub mod template;
pub mod types;
pub mod versioning;

pub use config::{AnthropicSettings, HttpConfig, OpenAiSettings, ProviderConfig};
pub use error::{ErrorCategory, FlowError, Result};
pub use flow::{Flow, FlowBuilder, FlowState, create_flow};
pub use providers::LlmProvider;
pub use registry::{ProviderFactory, ProviderKind, ProviderResolver, global_resolver};
pub use template::{PromptTemplate, TemplateInput, VariableContract, create_prompt_template};
pub use types::{ChatMessage, FlowOutput, MessageRole, RunOptions, Usage};
pub use versioning::{FileVersionStore, PromptVersion, VersionStore, VersioningOptions};

/// Re-exported for `prompt_input!`, so callers need no direct `serde_json` dependency.
#[doc(hidden)]
pub use serde_json as __serde_json;

/// Common imports
pub mod prelude {
    pub use crate::config::ProviderConfig;
    pub use crate::error::{FlowError, Result};
    pub use crate::flow::{Flow, FlowState, create_flow};
    pub use crate::prompt_input;
    pub use crate::registry::{ProviderKind, ProviderResolver};
    pub use crate::template::{PromptTemplate, TemplateInput, create_prompt_template};
    pub use crate::types::{FlowOutput, RunOptions};
    pub use crate::versioning::VersioningOptions;
}
