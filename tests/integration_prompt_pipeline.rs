//! Prompt pipeline integration tests
//!
//! Loads prompt files from a temporary directory and runs them through the
//! executor against mock backends.

use std::fs;
use std::sync::Arc;

use mockito::Server;
use promptstudio::llm::{BackendConfig, LlmClient, MockLlmClient, OpenAiClient};
use promptstudio::prompt::{DirectorySource, PromptRegistry, RegistryHandle, Variables};
use promptstudio::{PromptError, PromptExecutor, ProviderRouter};
use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const CODE_REVIEW: &str = r#"{
  "title": "Code Review",
  "description": "Review a code snippet",
  "prompt": {
    "persona": {"role": "Senior Reviewer"},
    "instructions": ["Check style"]
  },
  "user_input_template": "Review: ${code}",
  "variables": [{"name": "code", "type": "string", "required": true, "description": "Code to review"}],
  "test_cases": [{"name": "hello", "inputs": {"code": "print(1)"}}]
}"#;

fn prompts_dir() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("code-review.prompt.json"), CODE_REVIEW).unwrap();
    fs::write(temp_dir.path().join("broken.prompt.json"), "{ \"title\": ").unwrap();
    fs::write(temp_dir.path().join("README.md"), "not a prompt").unwrap();
    temp_dir
}

fn mock_router(openai: Arc<dyn LlmClient>) -> ProviderRouter {
    ProviderRouter::new(
        openai,
        Arc::new(MockLlmClient::replying("anthropic reply").named("anthropic")),
        Arc::new(MockLlmClient::replying("google reply").named("google")),
    )
}

#[test]
fn test_load_one_good_one_malformed() {
    let dir = prompts_dir();
    let (registry, report) = PromptRegistry::load(&DirectorySource::new(dir.path())).unwrap();

    assert_eq!(registry.count(), 1);
    assert_eq!(report.count(), 1);
    assert!(report.failed("broken"));
    assert!(!report.is_clean());

    let list = registry.list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "code-review");
    assert_eq!(list[0].title.as_deref(), Some("Code Review"));
    assert_eq!(list[0].variables[0].name, "code");
}

#[tokio::test]
async fn test_execute_end_to_end_with_mock_backend() {
    let dir = prompts_dir();
    let (registry, _) = PromptRegistry::load(&DirectorySource::new(dir.path())).unwrap();
    let openai = Arc::new(MockLlmClient::replying("LGTM").named("openai"));
    let executor = PromptExecutor::from_registry(registry, mock_router(openai.clone()));

    let mut vars = Variables::new();
    vars.insert("code".to_string(), json!("print(1)"));
    let result = executor.execute("code-review", &vars, "OpenAI").await.unwrap();

    assert_eq!(result, "LGTM");
    assert_eq!(
        openai.calls(),
        vec!["Senior Reviewer\n\nInstructions:\n- Check style\n\nReview: print(1)".to_string()]
    );
}

#[tokio::test]
async fn test_execute_unknown_prompt_never_calls_backend() {
    let dir = prompts_dir();
    let (registry, _) = PromptRegistry::load(&DirectorySource::new(dir.path())).unwrap();
    let openai = Arc::new(MockLlmClient::new().named("openai"));
    let executor = PromptExecutor::from_registry(registry, mock_router(openai.clone()));

    let err = executor.execute("broken", &Variables::new(), "openai").await.unwrap_err();
    assert!(matches!(err, PromptError::PromptNotFound(ref id) if id == "broken"));
    assert!(err.is_client_error());
    assert_eq!(openai.call_count(), 0);
}

#[tokio::test]
async fn test_execute_through_http_backend() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Style is fine"}}]}"#)
        .create_async()
        .await;

    let config = BackendConfig {
        api_key_env: "OPENAI_API_KEY".to_string(),
        base_url: server.url(),
        model: "gpt-4".to_string(),
        max_tokens: 1000,
        temperature: 0.1,
        timeout: std::time::Duration::from_secs(5),
    };
    let openai = Arc::new(OpenAiClient::with_api_key("test-key", config).unwrap());

    let dir = prompts_dir();
    let (registry, _) = PromptRegistry::load(&DirectorySource::new(dir.path())).unwrap();
    let executor = PromptExecutor::from_registry(registry, mock_router(openai));

    let mut vars = Variables::new();
    vars.insert("code".to_string(), json!("print(1)"));
    let result = executor.execute("code-review", &vars, "openai").await.unwrap();

    mock.assert_async().await;
    assert_eq!(result, "Style is fine");
}

#[tokio::test]
async fn test_reload_picks_up_new_files() {
    let dir = prompts_dir();
    let source = DirectorySource::new(dir.path());
    let (registry, _) = PromptRegistry::load(&source).unwrap();
    let handle = Arc::new(RegistryHandle::new(registry));
    let executor = PromptExecutor::new(handle.clone(), mock_router(Arc::new(MockLlmClient::new())));

    assert!(matches!(
        executor.compile("summary", &Variables::new()),
        Err(PromptError::PromptNotFound(_))
    ));

    fs::write(
        dir.path().join("summary.prompt.yaml"),
        "title: Summary\nuser_input_template: \"Summarize: ${text}\"\n",
    )
    .unwrap();
    let report = handle.reload(&source).unwrap();
    assert_eq!(report.count(), 2);

    let mut vars = Variables::new();
    vars.insert("text".to_string(), json!("a long story"));
    assert_eq!(executor.compile("summary", &vars).unwrap(), "Summarize: a long story");
}

#[tokio::test]
async fn test_evaluate_shipped_test_case_across_providers() {
    let dir = prompts_dir();
    let (registry, _) = PromptRegistry::load(&DirectorySource::new(dir.path())).unwrap();
    let openai = Arc::new(MockLlmClient::failing("quota exceeded").named("openai"));
    let executor = PromptExecutor::from_registry(registry, mock_router(openai.clone()));

    let results = executor
        .evaluate("code-review", "hello", &["openai", "anthropic", "google"], CancellationToken::new())
        .await
        .unwrap();

    let providers: Vec<&str> = results.iter().map(|e| e.provider.as_str()).collect();
    assert_eq!(providers, vec!["openai", "anthropic", "google"]);
    assert!(matches!(results[0].result, Err(PromptError::BackendInvocationFailed(_))));
    assert_eq!(results[1].result.as_deref().unwrap(), "anthropic reply");
    assert_eq!(results[2].result.as_deref().unwrap(), "google reply");
    assert_eq!(
        openai.calls(),
        vec!["Senior Reviewer\n\nInstructions:\n- Check style\n\nReview: print(1)".to_string()]
    );
}
