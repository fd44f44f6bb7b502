//! Command dispatch: bridges CLI args -> panel operations -> output.

pub mod bind;
pub mod config_cmd;
pub mod devices;
pub mod harden;
pub mod identity;
pub mod print;
pub mod util;

use std::sync::Arc;

use tsplpanel_core::{CoreError, PanelController};

use crate::cli::{Command, OutputFormat};
use crate::error::CliError;
use crate::notify::{self, ConsoleNotifier};

/// A panel wired to the terminal for one CLI invocation.
pub struct Session {
    pub panel: PanelController,
    pub console: Arc<ConsoleNotifier>,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Session {
    /// Apply agent outcomes until nothing is in flight, spinning meanwhile.
    pub async fn settle(&mut self) {
        let _spinner =
            notify::track_pending(self.console.spinner(), self.panel.subscribe_pending());
        self.panel.settle().await;
    }

    /// Fail if any error was notified so far. An agent that could not be
    /// reached or did not answer in time gets its own error, and exit code.
    pub fn check(&mut self) -> Result<(), CliError> {
        let failures = self.panel.take_failures();
        match self.console.error_count() {
            0 => Ok(()),
            count => Err(failures
                .into_iter()
                .find_map(unreachable_agent)
                .unwrap_or(CliError::OperationFailed { count })),
        }
    }

    /// An operation that returned without starting a call was turned down by
    /// a pre-condition; its warning has already been shown.
    pub fn ensure_started(&mut self, operation: &str) -> Result<(), CliError> {
        self.check()?;
        if self.panel.is_loading() {
            Ok(())
        } else {
            Err(CliError::NotAttempted {
                operation: operation.into(),
            })
        }
    }
}

fn unreachable_agent(failure: CoreError) -> Option<CliError> {
    match failure {
        CoreError::Timeout { .. } | CoreError::ConnectionFailed { .. } => Some(failure.into()),
        _ => None,
    }
}

/// Dispatch an agent-bound command to its handler.
pub async fn dispatch(cmd: Command, session: &mut Session) -> Result<(), CliError> {
    match cmd {
        Command::Devices => devices::handle(session).await,
        Command::Identity => identity::handle(session).await,
        Command::Bind(args) => bind::handle(session, args).await,
        Command::Print(args) => print::handle(session, args).await,
        // Local commands are handled before a session exists
        Command::Harden(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
