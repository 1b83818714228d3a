//! Turning a staged diff into an accepted Conventional Commit line.

pub mod aggregate;
pub mod confirm;
pub mod flow;
pub mod git;
pub mod parse;
pub mod prompt;

pub use aggregate::aggregate;
pub use confirm::{AutoConfirmer, Confirmer, TerminalConfirmer};
pub use flow::{
    CommitOutcome, MAX_PARSE_FAILURES, generate_commit_message, generate_once, run_confirm_loop,
};
pub use git::{commit_staged, open_repository, staged_diff};
pub use parse::parse_commit_message;
pub use prompt::{COMMIT_END_TAG, COMMIT_INSTRUCTIONS, COMMIT_START_TAG};
