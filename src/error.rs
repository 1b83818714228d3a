//! Error types for commitline modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::BackendKind;

/// Errors from reading or writing the backend configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No LLM configuration found at {0}. Run 'commitline setup' first.")]
    Missing(PathBuf),

    #[error("Failed to read config {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[source] serde_yaml::Error),

    #[error("Failed to write config {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config already exists at {0}. Use --force to overwrite.")]
    AlreadyExists(PathBuf),
}

/// Errors raised by a backend before any delta is handed back.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{backend} is enabled but has no '{field}' configured")]
    MissingSetting {
        backend: BackendKind,
        field: &'static str,
    },

    #[error("{backend} endpoint '{url}' is invalid")]
    InvalidEndpoint { backend: BackendKind, url: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{backend} request failed: {source}")]
    Request {
        backend: BackendKind,
        #[source]
        source: reqwest::Error,
    },

    #[error("{backend} rejected the credentials (HTTP {status}): {body}")]
    Unauthorized {
        backend: BackendKind,
        status: u16,
        body: String,
    },

    #[error("{backend} returned HTTP {status}: {body}")]
    Status {
        backend: BackendKind,
        status: u16,
        body: String,
    },

    #[error("{backend} request was cancelled")]
    Cancelled { backend: BackendKind },
}

/// Errors surfaced by a delta stream after it was handed back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Generation was cancelled")]
    Cancelled,

    #[error("Failed to read response stream: {0}")]
    Read(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Backend reported an error mid-stream: {0}")]
    Backend(String),
}

/// Which half of the `<Commit>...</Commit>` pair could not be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingTag {
    Start,
    End,
}

impl MissingTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingTag::Start => "<Commit>",
            MissingTag::End => "</Commit>",
        }
    }
}

/// The model output did not contain a complete commit tag pair.
///
/// Recoverable: the confirm/retry loop regenerates on this error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no {} tag found in output", .0.as_str())]
    TagMissing(MissingTag),
}

/// Errors from the interactive confirm prompt.
#[derive(Error, Debug)]
pub enum ConfirmError {
    #[error("Failed to read confirmation: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Confirmation aborted: {0}")]
    Aborted(String),
}

/// Errors from the end-to-end commit message pipeline.
///
/// Every variant is fatal. Tag-missing failures are absorbed by the retry loop
/// and only surface through [`GenerationError::Exhausted`].
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("LLM is not configured: {0}")]
    ConfigMissing(#[source] ConfigError),

    #[error(
        "No LLM backend is enabled. Enable one of ollama, gemini, vertex, anthropic or openai in the config file."
    )]
    NoBackendEnabled,

    #[error("Failed to start generation: {0}")]
    BackendSetup(#[source] BackendError),

    #[error("{backend} stream failed: {source}")]
    Stream {
        backend: BackendKind,
        #[source]
        source: StreamError,
    },

    #[error("Gave up after {attempts} unparseable generations: {last}")]
    Exhausted { attempts: u32, last: ParseError },

    #[error(transparent)]
    Confirm(#[from] ConfirmError),
}

impl GenerationError {
    /// Every error that leaves the pipeline is final; parse failures are
    /// retried internally and never surface on their own.
    pub fn is_recoverable(&self) -> bool {
        false
    }

    /// Whether the failure came from the caller cancelling the generation.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            GenerationError::Stream {
                source: StreamError::Cancelled,
                ..
            } | GenerationError::BackendSetup(BackendError::Cancelled { .. })
        )
    }
}

/// Errors from reading the staged diff or writing the commit with git2.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Failed to open git repository: {0}")]
    OpenFailed(#[source] git2::Error),

    #[error("Failed to collect staged diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),
}
