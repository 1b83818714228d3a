//! commitline - Conventional Commit messages for staged changes, written by an LLM.
//!
//! # Overview
//!
//! commitline reads the staged diff, sends it to the first enabled backend
//! (Ollama, Gemini, Vertex AI, Anthropic or OpenAI), streams the reply, pulls
//! the message out of its `<Commit>...</Commit>` tags and asks the operator to
//! confirm it before committing.

pub mod backend;
pub mod commit;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use backend::{Backend, BackendKind, DeltaStream, select_backend};
pub use commit::{CommitOutcome, Confirmer, generate_commit_message, parse_commit_message};
pub use config::{BackendConfig, Config, ConfigStore};
pub use error::{
    BackendError, CommitError, ConfigError, ConfirmError, GenerationError, ParseError, StreamError,
};
