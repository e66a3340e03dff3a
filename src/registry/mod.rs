//! Provider resolution
//!
//! [`ProviderResolver`] maps a model identifier to a shared adapter handle:
//!
//! 1. the vendor is selected from the model name ([`ProviderKind::from_model`])
//! 2. the vendor's [`ProviderFactory`] checks that it can be served
//! 3. the adapter is built once and cached; later resolutions for any model
//!    of the same vendor return the same `Arc`
//!
//! Concurrent first resolutions of one vendor are deduplicated with a
//! per-vendor async build lock, so at most one build runs per vendor.

pub mod factory;
pub mod ids;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

pub use factory::{ProviderFactory, builtin_factories};
#[cfg(feature = "anthropic")]
pub use factory::AnthropicFactory;
#[cfg(feature = "openai")]
pub use factory::OpenAiFactory;
pub use ids::{ProviderKind, strip_vendor_prefix};

use crate::config::ProviderConfig;
use crate::error::FlowError;
use crate::providers::LlmProvider;
use crate::telemetry::{CallObserver, TracingObserver};

type BuildLocks = HashMap<ProviderKind, Arc<tokio::sync::Mutex<()>>>;

/// Resolves model identifiers to cached provider handles.
pub struct ProviderResolver {
    config: ProviderConfig,
    observer: Arc<dyn CallObserver>,
    factories: HashMap<ProviderKind, Arc<dyn ProviderFactory>>,
    clients: Mutex<HashMap<ProviderKind, Arc<dyn LlmProvider>>>,
    in_flight: Mutex<BuildLocks>,
}

impl std::fmt::Debug for ProviderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut factories: Vec<_> = self.factories.keys().collect();
        factories.sort();
        f.debug_struct("ProviderResolver")
            .field("factories", &factories)
            .field("cached", &self.cached_kinds())
            .finish()
    }
}

impl Default for ProviderResolver {
    fn default() -> Self {
        Self::new(ProviderConfig::default())
    }
}

impl ProviderResolver {
    /// Resolver with every built-in factory and the tracing observer.
    pub fn new(config: ProviderConfig) -> Self {
        let mut resolver = Self::empty(config);
        for factory in builtin_factories() {
            resolver.register_factory(factory);
        }
        resolver
    }

    /// Resolver with no factories registered.
    pub fn empty(config: ProviderConfig) -> Self {
        Self {
            config,
            observer: Arc::new(TracingObserver),
            factories: HashMap::new(),
            clients: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver configured from the process environment.
    pub fn from_env() -> Self {
        Self::new(ProviderConfig::from_env())
    }

    /// Observer handed to every adapter built afterwards.
    pub fn with_observer(mut self, observer: Arc<dyn CallObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_factory(mut self, factory: Arc<dyn ProviderFactory>) -> Self {
        self.register_factory(factory);
        self
    }

    /// Register (or replace) the factory for `factory.kind()`.
    pub fn register_factory(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories.insert(factory.kind(), factory);
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Resolve `model` to a shared adapter handle.
    pub async fn resolve(&self, model: &str) -> Result<Arc<dyn LlmProvider>, FlowError> {
        let kind = ProviderKind::from_model(model)?;
        self.resolve_kind(kind).await
    }

    /// Resolve a vendor directly.
    pub async fn resolve_kind(&self, kind: ProviderKind) -> Result<Arc<dyn LlmProvider>, FlowError> {
        if let Some(client) = self.cached(kind) {
            return Ok(client);
        }

        let factory = self.factories.get(&kind).cloned().ok_or_else(|| {
            FlowError::unavailable(
                kind.as_str(),
                format!(
                    "adapter not compiled in (enable the `{}` feature)",
                    kind.as_str()
                ),
            )
        })?;

        // The build lock is held across build + insert so one build runs per vendor.
        let build_lock = {
            let mut map = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                map.entry(kind)
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        let _guard = build_lock.lock().await;

        if let Some(client) = self.cached(kind) {
            return Ok(client);
        }

        factory.check_available(&self.config)?;
        let client = factory
            .build(&self.config, Arc::clone(&self.observer))
            .await?;
        tracing::debug!(provider = kind.as_str(), "provider handle built");

        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(kind, Arc::clone(&client));
        Ok(client)
    }

    fn cached(&self, kind: ProviderKind) -> Option<Arc<dyn LlmProvider>> {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
    }

    /// Vendors with a built handle, in stable order.
    pub fn cached_kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self
            .clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        kinds.sort();
        kinds
    }

    /// Drop every cached handle; the next resolution rebuilds.
    pub fn clear(&self) {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

static GLOBAL: OnceLock<Arc<ProviderResolver>> = OnceLock::new();

/// Process-wide resolver configured from the environment on first use.
///
/// Flows built without an explicit resolver share this one, so they also
/// share provider handles.
pub fn global_resolver() -> Arc<ProviderResolver> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(ProviderResolver::from_env())))
}
