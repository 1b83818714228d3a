//! Asking the operator whether to keep a generated message.

use dialoguer::Confirm;

use crate::error::ConfirmError;

/// Decides whether a parsed commit message is accepted.
///
/// This abstraction allows scripting the operator in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Confirmer: Send + Sync {
    /// `Ok(true)` accepts the message, `Ok(false)` asks for another one.
    fn confirm(&self, message: &str) -> Result<bool, ConfirmError>;
}

/// Interactive yes/no prompt on the terminal.
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, message: &str) -> Result<bool, ConfirmError> {
        Confirm::new()
            .with_prompt(confirm_prompt(message))
            .default(true)
            .interact_opt()?
            .ok_or_else(|| ConfirmError::Aborted("no answer given".to_string()))
    }
}

/// Accepts every message without asking.
pub struct AutoConfirmer;

impl Confirmer for AutoConfirmer {
    fn confirm(&self, _message: &str) -> Result<bool, ConfirmError> {
        Ok(true)
    }
}

fn confirm_prompt(message: &str) -> String {
    format!("Confirm commit message: `{message}`?")
}
