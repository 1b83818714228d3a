//! LLM backends and their selection.
//!
//! Every backend turns a diff into a [`DeltaStream`]. Setup failures (bad
//! config, unreachable endpoint, rejected credentials) are returned before a
//! stream exists; anything after that is reported through the stream.

pub mod anthropic;
pub mod gemini;
pub(crate) mod http;
pub mod ollama;
pub mod openai;
pub mod selector;
pub mod stream;

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BackendError;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use http::TIMEOUT_ENV_VAR;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use selector::{build_backend, first_enabled, select_backend, select_from_store};
pub use stream::{DeltaSender, DeltaStream};

/// Supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Ollama,
    Gemini,
    Vertex,
    Anthropic,
    OpenAi,
}

impl BackendKind {
    /// Selection order: the first enabled backend in this list wins.
    pub const PRIORITY: [BackendKind; 5] = [
        BackendKind::Ollama,
        BackendKind::Gemini,
        BackendKind::Vertex,
        BackendKind::Anthropic,
        BackendKind::OpenAi,
    ];

    /// Key of this backend's record in the config file.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "ollama",
            BackendKind::Gemini => "gemini",
            BackendKind::Vertex => "vertex",
            BackendKind::Anthropic => "anthropic",
            BackendKind::OpenAi => "openai",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service that can produce a commit message for a diff.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Start a generation for `diff`.
    ///
    /// Returns only after the request has been accepted by the service. The
    /// returned stream is fed by one background task that stops when `cancel`
    /// fires or the stream is dropped.
    async fn generate(
        &self,
        cancel: &CancellationToken,
        diff: &str,
    ) -> Result<DeltaStream, BackendError>;
}
