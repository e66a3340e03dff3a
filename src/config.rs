//! Provider configuration
//!
//! Credentials and endpoints are an explicit value owned by whoever composes
//! the flows. Adapters receive the `ProviderConfig` when their factory builds
//! them and read only their own section; flows never see credentials.
//!
//! ```rust,ignore
//! use siumai_flow::config::ProviderConfig;
//!
//! // From OPENAI_API_KEY / ANTHROPIC_API_KEY (and optional *_BASE_URL)
//! let config = ProviderConfig::from_env();
//!
//! // Or explicitly
//! let config = ProviderConfig::default()
//!     .with_openai_api_key("sk-...")
//!     .with_openai_base_url("http://localhost:8080/v1");
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::FlowError;

pub mod defaults {
    use std::time::Duration;

    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
    pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &str = concat!("siumai-flow/", env!("CARGO_PKG_VERSION"));
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// OpenAI credentials and endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: SecretString,
    pub base_url: String,
    pub organization: Option<String>,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            base_url: defaults::OPENAI_BASE_URL.to_string(),
            organization: None,
        }
    }
}

/// Anthropic credentials and endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnthropicSettings {
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: SecretString,
    pub base_url: String,
    pub api_version: String,
}

impl Default for AnthropicSettings {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(String::new()),
            base_url: defaults::ANTHROPIC_BASE_URL.to_string(),
            api_version: defaults::ANTHROPIC_API_VERSION.to_string(),
        }
    }
}

/// HTTP client settings shared by all adapters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Some(defaults::REQUEST_TIMEOUT),
            connect_timeout: Some(defaults::CONNECT_TIMEOUT),
            user_agent: Some(defaults::USER_AGENT.to_string()),
        }
    }
}

impl HttpConfig {
    /// Build a `reqwest::Client` honoring these settings.
    pub fn build_client(&self) -> Result<reqwest::Client, FlowError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(ua) = &self.user_agent {
            builder = builder.user_agent(ua);
        }
        builder
            .build()
            .map_err(|e| FlowError::ConfigurationError(format!("Failed to build HTTP client: {e}")))
    }
}

/// Configuration for every built-in provider adapter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub openai: OpenAiSettings,
    pub anthropic: AnthropicSettings,
    pub http: HttpConfig,
}

impl ProviderConfig {
    /// Read credentials and endpoint overrides from the process environment.
    ///
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_ORGANIZATION`
    /// - `ANTHROPIC_API_KEY`, `ANTHROPIC_BASE_URL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(key) = non_empty("OPENAI_API_KEY") {
            config.openai.api_key = SecretString::from(key);
        }
        if let Some(url) = non_empty("OPENAI_BASE_URL") {
            config.openai.base_url = url;
        }
        config.openai.organization = non_empty("OPENAI_ORGANIZATION");
        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            config.anthropic.api_key = SecretString::from(key);
        }
        if let Some(url) = non_empty("ANTHROPIC_BASE_URL") {
            config.anthropic.base_url = url;
        }
        config
    }

    pub fn with_openai_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.openai.api_key = SecretString::from(api_key.into());
        self
    }

    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai.base_url = base_url.into();
        self
    }

    pub fn with_openai_organization(mut self, organization: impl Into<String>) -> Self {
        self.openai.organization = Some(organization.into());
        self
    }

    pub fn with_anthropic_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.anthropic.api_key = SecretString::from(api_key.into());
        self
    }

    pub fn with_anthropic_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.anthropic.base_url = base_url.into();
        self
    }

    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn has_openai_key(&self) -> bool {
        !self.openai.api_key.expose_secret().trim().is_empty()
    }

    pub fn has_anthropic_key(&self) -> bool {
        !self.anthropic.api_key.expose_secret().trim().is_empty()
    }
}
