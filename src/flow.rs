//! Flow orchestration
//!
//! A [`Flow`] binds one prompt template and one set of [`RunOptions`] to a
//! provider resolved from the options' model. Resolution starts when the flow
//! is constructed and is shared by every run; a run then formats the prompt,
//! calls the provider, optionally writes a version snapshot, and turns the
//! model text into a [`FlowOutput`].
//!
//! ```rust,ignore
//! use siumai_flow::prelude::*;
//!
//! let flow = Flow::builder("Translate {{text}} to {{lang}}")
//!     .options(RunOptions::new("gpt-4o-mini"))
//!     .build()?;
//! let output = flow.run(&prompt_input!("text" => "hello", "lang" => "French")).await?;
//! ```

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::FlowError;
use crate::parsing;
use crate::providers::LlmProvider;
use crate::registry::{ProviderResolver, global_resolver};
use crate::template::{PromptTemplate, TemplateInput, to_template_input};
use crate::types::{FlowOutput, RunOptions};
use crate::versioning::{FileVersionStore, PromptVersion, SnapshotClock, VersionStore, VersioningOptions};

type ResolveFuture = Shared<BoxFuture<'static, Result<Arc<dyn LlmProvider>, FlowError>>>;

/// Provider binding state of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Resolution has not completed yet
    Resolving,
    /// A provider handle is bound; runs proceed without waiting
    Ready,
    /// Resolution failed; every run reports the same error
    Unavailable,
}

/// A reusable template + options pair bound to one provider.
pub struct Flow {
    template: PromptTemplate,
    options: RunOptions,
    versioning: VersioningOptions,
    version_id: Option<Uuid>,
    store: Arc<dyn VersionStore>,
    provider: ResolveFuture,
    clock: SnapshotClock,
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("template", &self.template.template())
            .field("model", &self.options.model)
            .field("state", &self.state())
            .field("version_id", &self.version_id)
            .finish()
    }
}

impl Flow {
    pub fn builder(template: impl Into<String>) -> FlowBuilder {
        FlowBuilder::new(template)
    }

    /// Create a flow.
    ///
    /// Fails with `ConfigurationError` when the options name no model; no
    /// resolution is attempted in that case.
    pub fn new(
        template: impl Into<String>,
        options: RunOptions,
        versioning: VersioningOptions,
        resolver: Arc<ProviderResolver>,
    ) -> Result<Self, FlowError> {
        let store = Arc::new(FileVersionStore::new(versioning.store_path.clone()));
        Self::assemble(template.into(), options, versioning, resolver, store)
    }

    fn assemble(
        template: String,
        options: RunOptions,
        versioning: VersioningOptions,
        resolver: Arc<ProviderResolver>,
        store: Arc<dyn VersionStore>,
    ) -> Result<Self, FlowError> {
        options.validate()?;

        let model = options.model.clone();
        let provider: ResolveFuture = async move { resolver.resolve(&model).await }
            .boxed()
            .shared();

        // Start resolving now when a runtime is available; otherwise the first run drives it.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(provider.clone().map(|_| ()));
        }

        let version_id = versioning.versioning_enabled.then(Uuid::new_v4);
        tracing::debug!(
            model = %options.model,
            version_id = ?version_id,
            "flow created"
        );

        Ok(Self {
            template: PromptTemplate::new(template),
            options,
            versioning,
            version_id,
            store,
            provider,
            clock: SnapshotClock::default(),
        })
    }

    pub fn state(&self) -> FlowState {
        match self.provider.peek() {
            None => FlowState::Resolving,
            Some(Ok(_)) => FlowState::Ready,
            Some(Err(_)) => FlowState::Unavailable,
        }
    }

    /// Wait for resolution and return the bound provider.
    pub async fn provider(&self) -> Result<Arc<dyn LlmProvider>, FlowError> {
        self.provider.clone().await
    }

    /// Snapshot id shared by every run; `None` when versioning is off.
    pub const fn version_id(&self) -> Option<Uuid> {
        self.version_id
    }

    pub const fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub const fn options(&self) -> &RunOptions {
        &self.options
    }

    pub const fn versioning(&self) -> &VersioningOptions {
        &self.versioning
    }

    /// Run the flow once.
    pub async fn run(&self, input: &TemplateInput) -> Result<FlowOutput, FlowError> {
        let provider = self.provider().await?;

        let missing = self.template.missing_variables(input);
        if !missing.is_empty() {
            tracing::debug!(?missing, "template variables missing; substituting empty strings");
        }
        let prompt = self.template.format(input);

        let response = provider.execute(&prompt, &self.options).await?;

        if let Some(id) = self.version_id {
            self.save_version(id).await?;
        }

        if self.options.dont_parse {
            return Ok(FlowOutput::Text(response));
        }
        Ok(parsing::post_process(&response))
    }

    /// Run with any input that serializes to a JSON object.
    pub async fn run_with<T: Serialize + ?Sized>(&self, input: &T) -> Result<FlowOutput, FlowError> {
        let input = to_template_input(input)?;
        self.run(&input).await
    }

    /// Run and decode the structured result into `T`.
    pub async fn run_as<T: DeserializeOwned>(&self, input: &TemplateInput) -> Result<T, FlowError> {
        match self.run(input).await? {
            FlowOutput::Json(value) => serde_json::from_value(value).map_err(|e| {
                FlowError::ParseError(format!("Structured output does not match target type: {e}"))
            }),
            FlowOutput::Text(_) => Err(FlowError::ParseError(
                "Model response contained no structured data".to_string(),
            )),
        }
    }

    async fn save_version(&self, id: Uuid) -> Result<(), FlowError> {
        let version = PromptVersion {
            id,
            timestamp: self.clock.next(),
            template: self.template.template().to_string(),
            options: self.options.clone(),
        };
        self.store.save(&version).await
    }
}

/// Builder for [`Flow`].
#[must_use]
pub struct FlowBuilder {
    template: String,
    options: RunOptions,
    versioning: VersioningOptions,
    resolver: Option<Arc<ProviderResolver>>,
    store: Option<Arc<dyn VersionStore>>,
}

impl FlowBuilder {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            options: RunOptions::default(),
            versioning: VersioningOptions::default(),
            resolver: None,
            store: None,
        }
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn versioning(mut self, versioning: VersioningOptions) -> Self {
        self.versioning = versioning;
        self
    }

    /// Resolver to bind through; defaults to [`global_resolver`].
    pub fn resolver(mut self, resolver: Arc<ProviderResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Snapshot store; defaults to a [`FileVersionStore`] at the versioning store path.
    pub fn version_store(mut self, store: Arc<dyn VersionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<Flow, FlowError> {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(FileVersionStore::new(self.versioning.store_path.clone())));
        let resolver = self.resolver.unwrap_or_else(global_resolver);
        Flow::assemble(self.template, self.options, self.versioning, resolver, store)
    }
}

/// Create a flow; `None` selects default versioning (off) and the global resolver.
pub fn create_flow(
    template: impl Into<String>,
    options: RunOptions,
    versioning: Option<VersioningOptions>,
    resolver: Option<Arc<ProviderResolver>>,
) -> Result<Flow, FlowError> {
    let mut builder = Flow::builder(template)
        .options(options)
        .versioning(versioning.unwrap_or_default());
    if let Some(resolver) = resolver {
        builder = builder.resolver(resolver);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::registry::{ProviderFactory, ProviderKind};
    use crate::telemetry::CallObserver;
    use crate::types::ChatMessage;
    use async_trait::async_trait;

    struct Fixed(&'static str);

    #[async_trait]
    impl LlmProvider for Fixed {
        fn provider_name(&self) -> &'static str {
            "openai"
        }

        async fn chat_completion(
            &self,
            _messages: &[ChatMessage],
            _options: &RunOptions,
        ) -> Result<String, FlowError> {
            Ok(self.0.to_string())
        }
    }

    struct FixedFactory(&'static str);

    #[async_trait]
    impl ProviderFactory for FixedFactory {
        fn kind(&self) -> ProviderKind {
            ProviderKind::OpenAi
        }

        fn check_available(&self, _config: &ProviderConfig) -> Result<(), FlowError> {
            Ok(())
        }

        async fn build(
            &self,
            _config: &ProviderConfig,
            _observer: Arc<dyn CallObserver>,
        ) -> Result<Arc<dyn LlmProvider>, FlowError> {
            Ok(Arc::new(Fixed(self.0)))
        }
    }

    fn resolver(reply: &'static str) -> Arc<ProviderResolver> {
        Arc::new(
            ProviderResolver::empty(ProviderConfig::default())
                .with_factory(Arc::new(FixedFactory(reply))),
        )
    }

    #[test]
    fn missing_model_fails_synchronously() {
        let err = Flow::builder("Hi {{name}}")
            .resolver(resolver("ok"))
            .build()
            .unwrap_err();
        assert!(matches!(err, FlowError::ConfigurationError(_)));
    }

    #[test]
    fn construction_without_runtime_defers_resolution() {
        let flow = Flow::builder("Hi {{name}}")
            .options(RunOptions::new("gpt-4o"))
            .resolver(resolver("hello"))
            .build()
            .unwrap();
        assert_eq!(flow.state(), FlowState::Resolving);

        let output = tokio_test::block_on(flow.run(&crate::prompt_input!("name" => "Ada"))).unwrap();
        assert_eq!(output, FlowOutput::Text("hello".to_string()));
        assert_eq!(flow.state(), FlowState::Ready);
    }

    #[tokio::test]
    async fn unknown_model_marks_flow_unavailable() {
        let flow = Flow::builder("x")
            .options(RunOptions::new("mystery-model"))
            .resolver(resolver("unused"))
            .build()
            .unwrap();

        let first = flow.run(&TemplateInput::new()).await.unwrap_err();
        let second = flow.run(&TemplateInput::new()).await.unwrap_err();
        assert!(matches!(first, FlowError::UnknownModel(_)));
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(flow.state(), FlowState::Unavailable);
    }

    #[tokio::test]
    async fn versioning_disabled_has_no_id() {
        let flow = create_flow("x", RunOptions::new("gpt-4o"), None, Some(resolver("ok"))).unwrap();
        assert_eq!(flow.version_id(), None);
        assert!(!flow.versioning().versioning_enabled);
    }
}
