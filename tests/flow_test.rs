//! Flow orchestration tests with stub providers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use siumai_flow::prelude::*;
use siumai_flow::providers::LlmProvider;
use siumai_flow::registry::ProviderFactory;
use siumai_flow::telemetry::CallObserver;
use siumai_flow::types::ChatMessage;
use siumai_flow::versioning::{FileVersionStore, PromptVersion, VersionStore};

/// Replies with a fixed string and records every prompt it sees.
struct StubProvider {
    name: &'static str,
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl LlmProvider for StubProvider {
    fn provider_name(&self) -> &'static str {
        self.name
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        _options: &RunOptions,
    ) -> Result<String> {
        let prompt = messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt);
        Ok(self.reply.clone())
    }
}

struct StubFactory {
    kind: ProviderKind,
    reply: String,
    builds: AtomicUsize,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl StubFactory {
    fn new(kind: ProviderKind, reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            kind,
            reply: reply.into(),
            builds: AtomicUsize::new(0),
            prompts: Arc::default(),
        })
    }
}

#[async_trait]
impl ProviderFactory for StubFactory {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn check_available(&self, _config: &ProviderConfig) -> Result<()> {
        Ok(())
    }

    async fn build(
        &self,
        _config: &ProviderConfig,
        _observer: Arc<dyn CallObserver>,
    ) -> Result<Arc<dyn LlmProvider>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubProvider {
            name: self.kind.as_str(),
            reply: self.reply.clone(),
            prompts: Arc::clone(&self.prompts),
        }))
    }
}

fn stub_resolver(reply: &str) -> Arc<ProviderResolver> {
    Arc::new(
        ProviderResolver::empty(ProviderConfig::default())
            .with_factory(StubFactory::new(ProviderKind::OpenAi, reply)),
    )
}

#[tokio::test]
async fn translate_flow_returns_structured_output() {
    let flow = create_flow(
        "Translate {{text}} to {{lang}}",
        RunOptions::new("gpt-4o"),
        None,
        Some(stub_resolver("```json\n{\"translation\":\"bonjour\"}\n```")),
    )
    .unwrap();

    let output = flow
        .run(&prompt_input!("text" => "hello", "lang" => "French"))
        .await
        .unwrap();

    assert_eq!(output, FlowOutput::Json(json!({ "translation": "bonjour" })));
    assert_eq!(flow.state(), FlowState::Ready);
}

#[tokio::test]
async fn prompt_is_formatted_before_the_call() {
    let factory = StubFactory::new(ProviderKind::OpenAi, "done");
    let resolver = Arc::new(
        ProviderResolver::empty(ProviderConfig::default()).with_factory(factory.clone()),
    );
    let flow = Flow::builder("Summarize {{text}} in {{count}} words{{suffix}}")
        .options(RunOptions::new("gpt-4o"))
        .resolver(resolver.clone())
        .build()
        .unwrap();

    flow.run(&prompt_input!("text" => "the report", "count" => 12, "ignored" => true))
        .await
        .unwrap();

    assert_eq!(
        *factory.prompts.lock().unwrap(),
        vec!["Summarize the report in 12 words".to_string()]
    );

    let provider = flow.provider().await.unwrap();
    let again = resolver.resolve("gpt-4o").await.unwrap();
    assert!(Arc::ptr_eq(&provider, &again));
}

#[tokio::test]
async fn dont_parse_returns_raw_response() {
    let raw = "```json\n{\"a\":1}\n```";
    let flow = Flow::builder("{{q}}")
        .options(RunOptions::new("gpt-4o").with_dont_parse(true))
        .resolver(stub_resolver(raw))
        .build()
        .unwrap();

    let output = flow.run(&prompt_input!("q" => "x")).await.unwrap();
    assert_eq!(output, FlowOutput::Text(raw.to_string()));
}

#[tokio::test]
async fn unparseable_response_falls_back_to_cleaned_text() {
    let flow = Flow::builder("{{q}}")
        .options(RunOptions::new("gpt-4o"))
        .resolver(stub_resolver("```\nno json here\n```"))
        .build()
        .unwrap();

    let output = flow.run(&prompt_input!("q" => "x")).await.unwrap();
    assert_eq!(output.as_text(), Some("no json here"));
}

#[tokio::test]
async fn missing_model_fails_before_resolution() {
    let factory = StubFactory::new(ProviderKind::OpenAi, "unused");
    let resolver = Arc::new(
        ProviderResolver::empty(ProviderConfig::default()).with_factory(factory.clone()),
    );

    let err = create_flow("{{q}}", RunOptions::default(), None, Some(resolver.clone())).unwrap_err();
    assert!(matches!(err, FlowError::ConfigurationError(_)));

    tokio::task::yield_now().await;
    assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
    assert!(resolver.cached_kinds().is_empty());
}

#[tokio::test]
async fn flows_share_handles_per_vendor() {
    let openai = StubFactory::new(ProviderKind::OpenAi, "a");
    let anthropic = StubFactory::new(ProviderKind::Anthropic, "b");
    let resolver = Arc::new(
        ProviderResolver::empty(ProviderConfig::default())
            .with_factory(openai.clone())
            .with_factory(anthropic.clone()),
    );

    let build = |model: &str| {
        Flow::builder("{{q}}")
            .options(RunOptions::new(model))
            .resolver(resolver.clone())
            .build()
            .unwrap()
    };
    let first = build("gpt-4o");
    let second = build("gpt-4o-mini");
    let third = build("claude-3-5-sonnet-latest");

    let p1 = first.provider().await.unwrap();
    let p2 = second.provider().await.unwrap();
    let p3 = third.provider().await.unwrap();

    assert!(Arc::ptr_eq(&p1, &p2));
    assert!(!Arc::ptr_eq(&p1, &p3));
    assert_eq!(p3.provider_name(), "anthropic");
    assert_eq!(openai.builds.load(Ordering::SeqCst), 1);
    assert_eq!(anthropic.builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_runs_resolve_once() {
    let factory = StubFactory::new(ProviderKind::OpenAi, "{\"ok\":true}");
    let resolver = Arc::new(
        ProviderResolver::empty(ProviderConfig::default()).with_factory(factory.clone()),
    );
    let flow = Arc::new(
        Flow::builder("{{q}}")
            .options(RunOptions::new("gpt-4o"))
            .resolver(resolver)
            .build()
            .unwrap(),
    );

    let runs: Vec<_> = (0..5)
        .map(|i| {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.run(&prompt_input!("q" => i)).await })
        })
        .collect();
    for run in runs {
        assert_eq!(
            run.await.unwrap().unwrap(),
            FlowOutput::Json(json!({ "ok": true }))
        );
    }
    assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn versioning_overwrites_one_snapshot_per_flow() {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("prompt-versions");

    let flow = Flow::builder("Describe {{thing}}")
        .options(RunOptions::new("gpt-4o").with_temperature(0.3))
        .versioning(VersioningOptions::enabled(&store_path))
        .resolver(stub_resolver("plain answer"))
        .build()
        .unwrap();
    let id = flow.version_id().unwrap();
    let store = FileVersionStore::new(&store_path);

    flow.run(&prompt_input!("thing" => "a cat")).await.unwrap();
    let first: PromptVersion = store.load(id).await.unwrap().unwrap();

    flow.run(&prompt_input!("thing" => "a dog")).await.unwrap();
    let second: PromptVersion = store.load(id).await.unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert!(second.timestamp > first.timestamp);
    assert_eq!(second.template, "Describe {{thing}}");
    assert_eq!(second.options.temperature, Some(0.3));

    let files: Vec<_> = std::fs::read_dir(&store_path).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn snapshot_write_failure_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, "not a directory").unwrap();

    let flow = Flow::builder("{{q}}")
        .options(RunOptions::new("gpt-4o"))
        .versioning(VersioningOptions::enabled(&blocker))
        .resolver(stub_resolver("{\"a\":1}"))
        .build()
        .unwrap();

    let err = flow.run(&prompt_input!("q" => "x")).await.unwrap_err();
    assert!(matches!(err, FlowError::PersistenceError(_)));
}

#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Vec<PromptVersion>>,
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn save(&self, version: &PromptVersion) -> Result<()> {
        self.saved.lock().unwrap().push(version.clone());
        Ok(())
    }

    async fn load(&self, id: uuid::Uuid) -> Result<Option<PromptVersion>> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|v| v.id == id)
            .cloned())
    }
}

#[tokio::test]
async fn custom_version_store_sees_every_run() {
    let store = Arc::new(MemoryStore::default());
    let flow = Flow::builder("{{q}}")
        .options(RunOptions::new("gpt-4o"))
        .versioning(VersioningOptions::enabled("unused"))
        .version_store(store.clone())
        .resolver(stub_resolver("x"))
        .build()
        .unwrap();

    for _ in 0..3 {
        flow.run(&prompt_input!("q" => "x")).await.unwrap();
    }

    let saved = store.saved.lock().unwrap();
    assert_eq!(saved.len(), 3);
    assert!(saved.iter().all(|v| Some(v.id) == flow.version_id()));
    assert!(saved.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[derive(Debug, Deserialize, PartialEq)]
struct Translation {
    translation: String,
}

#[tokio::test]
async fn run_as_decodes_structured_output() {
    let flow = Flow::builder("Translate {{text}}")
        .options(RunOptions::new("gpt-4o"))
        .resolver(stub_resolver("Sure! {\"translation\": \"hola\"} Hope that helps."))
        .build()
        .unwrap();

    let result: Translation = flow.run_as(&prompt_input!("text" => "hello")).await.unwrap();
    assert_eq!(
        result,
        Translation {
            translation: "hola".to_string()
        }
    );
}

#[tokio::test]
async fn run_as_rejects_plain_text() {
    let flow = Flow::builder("{{q}}")
        .options(RunOptions::new("gpt-4o"))
        .resolver(stub_resolver("just words"))
        .build()
        .unwrap();

    let err = flow
        .run_as::<Translation>(&prompt_input!("q" => "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::ParseError(_)));
}

#[derive(serde::Serialize)]
struct TranslateInput<'a> {
    text: &'a str,
    lang: &'a str,
}

#[tokio::test]
async fn run_with_accepts_serializable_input() {
    let flow = Flow::builder("Translate {{text}} to {{lang}}")
        .options(RunOptions::new("gpt-4o"))
        .resolver(stub_resolver("[1, 2, 3]"))
        .build()
        .unwrap();

    let output = flow
        .run_with(&TranslateInput {
            text: "hi",
            lang: "German",
        })
        .await
        .unwrap();
    assert_eq!(output.into_value(), json!([1, 2, 3]));

    let err = flow.run_with(&vec!["not", "an", "object"]).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidParameter(_)));
}
