// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Confirmation-gated command execution.
//!
//! Every destructive step of the installer (cloning, moving files into the
//! backup directory, writing the wrapper script, running bootstrap) goes
//! through one reusable describe/confirm/execute primitive: state the intent
//! and the exact operation, ask for y/N confirmation, then run the action
//! and propagate its result. Declining any step aborts the entire run.
//!
//! Prompting itself hides behind the [`ConfirmPort`] trait so the rest of
//! the installer never touches a terminal directly. Interactive runs use
//! [`TerminalPort`]. Non-interactive runs use [`AssumeYes`], which affirms
//! every gate unconditionally and therefore never blocks, preserving the
//! automatic-proceed behavior expected of unattended installs.

use inquire::{Confirm, Text};
use tracing::{debug, info};

/// Capability to answer confirmation and free-form prompts.
pub trait ConfirmPort {
    /// Answer a y/N question. Default answer is no.
    fn confirm(&self, message: &str) -> Result<bool>;

    /// Answer a free-form question with one line of text.
    fn ask_line(&self, message: &str) -> Result<String>;
}

/// Prompt the user at the terminal through inquire.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPort;

impl ConfirmPort for TerminalPort {
    fn confirm(&self, message: &str) -> Result<bool> {
        Ok(Confirm::new(message).with_default(false).prompt()?)
    }

    fn ask_line(&self, message: &str) -> Result<String> {
        Ok(Text::new(message).prompt()?)
    }
}

/// Affirm every gate without prompting.
///
/// Used for non-interactive runs, which must never block on input. Asking
/// for a line of text is still an error, because there is nobody to answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl ConfirmPort for AssumeYes {
    fn confirm(&self, message: &str) -> Result<bool> {
        debug!("assuming yes: {message}");
        Ok(true)
    }

    fn ask_line(&self, _message: &str) -> Result<String> {
        Err(ConfirmError::NonInteractive)
    }
}

/// Describe an action, confirm it, then execute it.
///
/// Logs the intent and the exact operation before asking the port. The
/// action only runs on an affirmative answer; its result passes through
/// untouched. A negative answer surfaces as [`ConfirmError::Declined`],
/// which the caller's error type absorbs.
///
/// # Errors
///
/// - Return [`ConfirmError::Declined`] if the port answers no.
/// - Return whatever the action itself returns on failure.
pub fn gated<T, E, F>(
    port: &dyn ConfirmPort,
    intent: &str,
    operation: &str,
    action: F,
) -> Result<T, E>
where
    E: From<ConfirmError>,
    F: FnOnce() -> Result<T, E>,
{
    info!("{intent}");
    info!("  {operation}");

    if !port.confirm("proceed?").map_err(E::from)? {
        return Err(ConfirmError::Declined(intent.into()).into());
    }

    action()
}

/// Confirmation error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfirmError {
    /// User answered no to a gate.
    #[error("declined: {0}")]
    Declined(String),

    /// Prompting itself failed.
    #[error(transparent)]
    Prompt(#[from] inquire::InquireError),

    /// A prompt was reached while running non-interactively.
    #[error("cannot prompt for input in non-interactive mode")]
    NonInteractive,
}

/// Friendly result alias :3
type Result<T, E = ConfirmError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    struct Scripted(Cell<bool>);

    impl ConfirmPort for Scripted {
        fn confirm(&self, _message: &str) -> Result<bool> {
            Ok(self.0.get())
        }

        fn ask_line(&self, _message: &str) -> Result<String> {
            Err(ConfirmError::NonInteractive)
        }
    }

    #[test]
    fn gated_runs_action_on_yes() {
        let port = Scripted(Cell::new(true));
        let result: Result<i32> = gated(&port, "do the thing", "thing --now", || Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn gated_declines_on_no() {
        let port = Scripted(Cell::new(false));
        let mut ran = false;
        let result: Result<()> = gated(&port, "do the thing", "thing --now", || {
            ran = true;
            Ok(())
        });

        assert!(matches!(result, Err(ConfirmError::Declined(_))));
        assert!(!ran);
    }

    #[test]
    fn assume_yes_affirms_everything() {
        assert!(AssumeYes.confirm("whatever").unwrap());
        assert!(matches!(
            AssumeYes.ask_line("whatever"),
            Err(ConfirmError::NonInteractive)
        ));
    }
}
