//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;

use commitline::config::BackendConfig;
use git2::Repository;

/// An enabled backend record pointing at `host`.
pub fn backend_record(host: &str, model: &str) -> BackendConfig {
    BackendConfig {
        enabled: true,
        host: Some(host.to_string()),
        model: Some(model.to_string()),
        api_key: Some("test-key".to_string()),
        location: Some("us-central1".to_string()),
        project: Some("acme".to_string()),
    }
}

/// NDJSON body in the shape Ollama streams from `/api/chat`.
pub fn ollama_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let chunk = serde_json::json!({
            "model": "gemma3:4b",
            "message": { "role": "assistant", "content": delta },
            "done": false
        });
        body.push_str(&chunk.to_string());
        body.push('\n');
    }
    body.push_str(r#"{"model":"gemma3:4b","message":{"role":"assistant","content":""},"done":true}"#);
    body.push('\n');
    body
}

/// SSE body in the shape Gemini streams from `streamGenerateContent?alt=sse`.
pub fn gemini_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let chunk = serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": delta }] } }]
        });
        body.push_str(&format!("data: {chunk}\r\n\r\n"));
    }
    body
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a committer identity.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        Self { dir, repo }
    }

    /// Write a file and add it to the index.
    pub fn stage(&self, name: &str, contents: &str) {
        std::fs::write(self.dir.path().join(name), contents).expect("Failed to write file");
        let mut index = self.repo.index().expect("Failed to open index");
        index.add_path(Path::new(name)).expect("Failed to stage file");
        index.write().expect("Failed to write index");
    }

    /// Message of the commit HEAD points at.
    pub fn head_message(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        let commit = head.peel_to_commit().ok()?;
        commit.message().map(String::from)
    }
}
