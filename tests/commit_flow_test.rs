//! End-to-end tests: config file, staged diff, mocked backend, commit.

mod common;

use commitline::backend::BackendKind;
use commitline::commit::{AutoConfirmer, commit_staged, generate_commit_message, staged_diff};
use commitline::config::{Config, ConfigStore};
use commitline::error::{GenerationError, MissingTag, ParseError};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{TestRepo, backend_record, ollama_body};

/// Seed a config file the way `commitline setup` does, then point Ollama at `host`.
fn configured_store(dir: &std::path::Path, host: &str) -> ConfigStore {
    let mut store = ConfigStore::load(dir.join(".commitline/llm.config.yaml")).unwrap();
    store.init_default(false).unwrap();

    let mut config = store.config().unwrap().clone();
    config.ollama.host = Some(host.to_string());
    store.save(config).unwrap();

    ConfigStore::load(store.path()).unwrap()
}

#[tokio::test]
async fn test_staged_change_to_commit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ollama_body(&["Sure!\n", "<Commit>feat(greeting): ", "add hello file</Commit>"]),
            "application/x-ndjson",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let test_repo = TestRepo::new();
    test_repo.stage("hello.txt", "hello\n");
    let store = configured_store(test_repo.dir.path(), &server.uri());

    let diff = staged_diff(&test_repo.repo).unwrap();
    assert!(diff.contains("+hello"));

    let cancel = CancellationToken::new();
    let outcome = generate_commit_message(&store, &diff, &AutoConfirmer, &cancel)
        .await
        .unwrap();
    assert_eq!(outcome.message, "feat(greeting): add hello file");
    assert_eq!(outcome.backend, BackendKind::Ollama);

    commit_staged(&test_repo.repo, &outcome.message).unwrap();
    assert_eq!(
        test_repo.head_message().as_deref(),
        Some("feat(greeting): add hello file")
    );
    assert_eq!(staged_diff(&test_repo.repo).unwrap(), "");
}

#[tokio::test]
async fn test_untagged_reply_is_regenerated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ollama_body(&["feat: forgot the tags"]),
            "application/x-ndjson",
        ))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ollama_body(&["<Commit>fix: second try</Commit>"]),
            "application/x-ndjson",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = configured_store(dir.path(), &server.uri());
    let cancel = CancellationToken::new();

    let outcome = generate_commit_message(&store, "diff", &AutoConfirmer, &cancel)
        .await
        .unwrap();
    assert_eq!(outcome.message, "fix: second try");
    assert_eq!(outcome.generations, 2);
    assert_eq!(outcome.parse_failures, 1);
}

#[tokio::test]
async fn test_gives_up_after_three_untagged_replies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ollama_body(&["<Commit>never closed"]),
            "application/x-ndjson",
        ))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = configured_store(dir.path(), &server.uri());
    let cancel = CancellationToken::new();

    let err = generate_commit_message(&store, "diff", &AutoConfirmer, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GenerationError::Exhausted {
            attempts: 3,
            last: ParseError::TagMissing(MissingTag::End)
        }
    ));
}

#[tokio::test]
async fn test_first_enabled_backend_is_the_only_one_called() {
    let local = MockServer::start().await;
    let remote = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            ollama_body(&["<Commit>test: cover selection</Commit>"]),
            "application/x-ndjson",
        ))
        .expect(1)
        .mount(&local)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&remote)
        .await;

    let config = Config {
        ollama: backend_record(&local.uri(), "gemma3:4b"),
        openai: backend_record(&remote.uri(), "gpt-4o-mini"),
        ..Default::default()
    };
    let store = ConfigStore::from_config("unused.yaml", config);
    let cancel = CancellationToken::new();

    let outcome = generate_commit_message(&store, "diff", &AutoConfirmer, &cancel)
        .await
        .unwrap();
    assert_eq!(outcome.backend, BackendKind::Ollama);
    assert_eq!(outcome.message, "test: cover selection");
}
