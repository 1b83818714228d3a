//! The confirm/retry loop around a single backend.
//!
//! Each round generates, aggregates and parses one message. A parse failure
//! counts against [`MAX_PARSE_FAILURES`]; an operator rejection does not. Any
//! other error ends the loop immediately.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendKind, select_from_store};
use crate::config::ConfigStore;
use crate::error::{GenerationError, ParseError, StreamError};

use super::aggregate::aggregate;
use super::confirm::Confirmer;
use super::parse::parse_commit_message;

/// Unparseable generations tolerated before giving up.
pub const MAX_PARSE_FAILURES: u32 = 3;

/// An accepted commit message and how it was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
    pub message: String,
    pub backend: BackendKind,
    /// Every `generate` call made, including rejected and unparseable ones.
    pub generations: u32,
    /// Generations whose output had no complete tag pair.
    pub parse_failures: u32,
}

#[derive(Debug)]
enum State {
    Generating,
    AwaitingConfirmation(String),
    ParseFailed(ParseError),
    Accepted(String),
    Exhausted(ParseError),
}

/// Select a backend from `store` and run the loop until a message is accepted.
pub async fn generate_commit_message(
    store: &ConfigStore,
    diff: &str,
    confirmer: &dyn Confirmer,
    cancel: &CancellationToken,
) -> Result<CommitOutcome, GenerationError> {
    let backend = select_from_store(store)?;
    run_confirm_loop(backend.as_ref(), diff, confirmer, cancel).await
}

/// One generation: start the backend, drain its stream, parse the result.
///
/// The outer `Result` carries fatal errors; the inner one a recoverable
/// parse failure.
pub async fn generate_once(
    backend: &dyn Backend,
    diff: &str,
    cancel: &CancellationToken,
) -> Result<Result<String, ParseError>, GenerationError> {
    let kind = backend.kind();
    let stream = backend
        .generate(cancel, diff)
        .await
        .map_err(GenerationError::BackendSetup)?;
    let text = aggregate(stream)
        .await
        .map_err(|source| GenerationError::Stream {
            backend: kind,
            source,
        })?;
    debug!("{} produced {} chars", kind, text.len());
    Ok(parse_commit_message(&text))
}

/// Drive generate/parse/confirm rounds against `backend`.
pub async fn run_confirm_loop(
    backend: &dyn Backend,
    diff: &str,
    confirmer: &dyn Confirmer,
    cancel: &CancellationToken,
) -> Result<CommitOutcome, GenerationError> {
    let kind = backend.kind();
    let mut generations = 0u32;
    let mut parse_failures = 0u32;
    let mut state = State::Generating;

    loop {
        state = match state {
            State::Generating => {
                if cancel.is_cancelled() {
                    return Err(GenerationError::Stream {
                        backend: kind,
                        source: StreamError::Cancelled,
                    });
                }
                generations += 1;
                debug!("Generation {} with {}", generations, kind);
                match generate_once(backend, diff, cancel).await? {
                    Ok(message) => State::AwaitingConfirmation(message),
                    Err(e) => State::ParseFailed(e),
                }
            }
            State::ParseFailed(err) => {
                parse_failures += 1;
                if parse_failures >= MAX_PARSE_FAILURES {
                    State::Exhausted(err)
                } else {
                    warn!(
                        "Generation {} unusable ({}), retrying ({}/{} failures)",
                        generations, err, parse_failures, MAX_PARSE_FAILURES
                    );
                    State::Generating
                }
            }
            State::AwaitingConfirmation(message) => {
                if confirmer.confirm(&message)? {
                    State::Accepted(message)
                } else {
                    info!("Message rejected, retrying...");
                    State::Generating
                }
            }
            State::Accepted(message) => {
                info!(
                    "Accepted message after {} generations ({} unparseable)",
                    generations, parse_failures
                );
                return Ok(CommitOutcome {
                    message,
                    backend: kind,
                    generations,
                    parse_failures,
                });
            }
            State::Exhausted(last) => {
                warn!("Giving up after {} unparseable generations", parse_failures);
                return Err(GenerationError::Exhausted {
                    attempts: parse_failures,
                    last,
                });
            }
        };
    }
}
