//! Error Handling Module
//!
//! A single error type covers every failure a flow can surface:
//! - construction-time configuration problems (`ConfigurationError`)
//! - provider resolution (`UnknownModel`, `ProviderUnavailable`)
//! - vendor calls (`ProviderApi`, `HttpError`, `ParseError`)
//! - snapshot persistence (`PersistenceError`)
//!
//! `ExtractionError` is produced by the response parser and absorbed by the
//! flow; callers only observe it when they use the parser directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use siumai_flow::error::{ErrorCategory, FlowError};
//!
//! let error = FlowError::api_error("openai", 429, "Rate limit reached");
//! assert_eq!(error.category(), ErrorCategory::Provider);
//! assert!(error.is_retryable());
//! ```

use thiserror::Error;

/// Errors produced by flows, providers and the version store.
#[derive(Error, Debug, Clone)]
pub enum FlowError {
    /// Missing or invalid configuration detected at construction time.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The model identifier does not map to any known vendor.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// The vendor adapter cannot be used (feature disabled, missing credential).
    #[error("Provider '{provider}' is unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    /// The vendor rejected the request.
    #[error("{provider} API error{}: {message}", status_suffix(.status))]
    ProviderApi {
        provider: String,
        status: Option<u16>,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Transport-level failure talking to a vendor.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// A payload could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No structured payload could be located in model output.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// A version snapshot could not be written or read.
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// A builder or helper was given an unusable argument.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Coarse grouping of [`FlowError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Network,
    Parsing,
    Persistence,
}

impl FlowError {
    /// Build a `ProviderApi` error with an HTTP status.
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ProviderApi {
            provider: provider.into(),
            status: Some(status),
            message: message.into(),
            details: None,
        }
    }

    /// Build a `ProviderUnavailable` error.
    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError(_) | Self::InvalidParameter(_) | Self::UnknownModel(_) => {
                ErrorCategory::Configuration
            }
            Self::ProviderUnavailable { .. } | Self::ProviderApi { .. } => ErrorCategory::Provider,
            Self::HttpError(_) => ErrorCategory::Network,
            Self::ParseError(_) | Self::ExtractionError(_) => ErrorCategory::Parsing,
            Self::PersistenceError(_) => ErrorCategory::Persistence,
        }
    }

    /// Whether retrying the same call could plausibly succeed.
    ///
    /// Nothing in this crate retries; the flag is for callers that do.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) => true,
            Self::ProviderApi {
                status: Some(code), ..
            } => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }

    /// HTTP status attached to a vendor error, if any.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ProviderApi { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FlowError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = FlowError> = std::result::Result<T, E>;
