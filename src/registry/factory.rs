//! Provider factories
//!
//! A [`ProviderFactory`] turns an explicit [`ProviderConfig`] into a shared
//! adapter for one vendor. Whether the vendor can be served at all is a
//! separate capability check, so "not installed" and "not configured" surface
//! as [`FlowError::ProviderUnavailable`] before any request is attempted.

use std::sync::Arc;

use async_trait::async_trait;

use super::ids::ProviderKind;
use crate::config::ProviderConfig;
use crate::error::FlowError;
use crate::providers::LlmProvider;
use crate::telemetry::CallObserver;

/// Builds the adapter for one vendor.
#[async_trait]
pub trait ProviderFactory: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether this vendor can be built from `config`.
    fn check_available(&self, config: &ProviderConfig) -> Result<(), FlowError>;

    async fn build(
        &self,
        config: &ProviderConfig,
        observer: Arc<dyn CallObserver>,
    ) -> Result<Arc<dyn LlmProvider>, FlowError>;
}

/// Factories for every vendor compiled into this build.
pub fn builtin_factories() -> Vec<Arc<dyn ProviderFactory>> {
    #[allow(unused_mut)]
    let mut factories: Vec<Arc<dyn ProviderFactory>> = Vec::new();
    #[cfg(feature = "openai")]
    factories.push(Arc::new(OpenAiFactory));
    #[cfg(feature = "anthropic")]
    factories.push(Arc::new(AnthropicFactory));
    factories
}

/// OpenAI adapter factory
#[cfg(feature = "openai")]
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiFactory;

#[cfg(feature = "openai")]
#[async_trait]
impl ProviderFactory for OpenAiFactory {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn check_available(&self, config: &ProviderConfig) -> Result<(), FlowError> {
        if config.has_openai_key() {
            Ok(())
        } else {
            Err(FlowError::unavailable(
                "openai",
                "no API key configured (set OPENAI_API_KEY)",
            ))
        }
    }

    async fn build(
        &self,
        config: &ProviderConfig,
        observer: Arc<dyn CallObserver>,
    ) -> Result<Arc<dyn LlmProvider>, FlowError> {
        self.check_available(config)?;
        let http_client = config.http.build_client()?;
        Ok(Arc::new(crate::providers::openai::OpenAiClient::new(
            &config.openai,
            http_client,
            observer,
        )))
    }
}

/// Anthropic adapter factory
#[cfg(feature = "anthropic")]
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicFactory;

#[cfg(feature = "anthropic")]
#[async_trait]
impl ProviderFactory for AnthropicFactory {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn check_available(&self, config: &ProviderConfig) -> Result<(), FlowError> {
        if config.has_anthropic_key() {
            Ok(())
        } else {
            Err(FlowError::unavailable(
                "anthropic",
                "no API key configured (set ANTHROPIC_API_KEY)",
            ))
        }
    }

    async fn build(
        &self,
        config: &ProviderConfig,
        observer: Arc<dyn CallObserver>,
    ) -> Result<Arc<dyn LlmProvider>, FlowError> {
        self.check_available(config)?;
        let http_client = config.http.build_client()?;
        Ok(Arc::new(
            crate::providers::anthropic::AnthropicClient::new(
                &config.anthropic,
                http_client,
                observer,
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "openai")]
    #[test]
    fn missing_key_is_unavailable_not_api_error() {
        let err = OpenAiFactory
            .check_available(&ProviderConfig::default())
            .unwrap_err();
        assert!(matches!(err, FlowError::ProviderUnavailable { .. }));

        let config = ProviderConfig::default().with_openai_api_key("sk-test");
        assert!(OpenAiFactory.check_available(&config).is_ok());
    }

    #[test]
    fn builtin_factories_follow_features() {
        let kinds: Vec<_> = builtin_factories().iter().map(|f| f.kind()).collect();
        assert_eq!(kinds.contains(&ProviderKind::OpenAi), cfg!(feature = "openai"));
        assert_eq!(
            kinds.contains(&ProviderKind::Anthropic),
            cfg!(feature = "anthropic")
        );
    }
}
