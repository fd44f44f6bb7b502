//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use tsplpanel_config::ConfigError;
use tsplpanel_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the agent at {url}")]
    #[diagnostic(
        code(tsplpanel::connection_failed),
        help(
            "Check that the USB agent is running and listening.\n\
             URL: {url}\n\
             Override with --agent-url or: tsplpanel config set-url <URL>"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Agent did not answer within {seconds}s")]
    #[diagnostic(
        code(tsplpanel::timeout),
        help("Check the agent and any proxy in front of it.")
    )]
    Timeout { seconds: u64 },

    // ── Agent outcomes ───────────────────────────────────────────────
    #[error("{count} agent operation(s) failed")]
    #[diagnostic(
        code(tsplpanel::operation_failed),
        help("See the messages above. Re-run the command to retry.")
    )]
    OperationFailed { count: usize },

    #[error("{operation} was not attempted")]
    #[diagnostic(
        code(tsplpanel::not_attempted),
        help("See the warning above.")
    )]
    NotAttempted { operation: String },

    #[error("Agent error: {message}")]
    #[diagnostic(code(tsplpanel::agent_error))]
    Agent { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(tsplpanel::not_found),
        help("Run: tsplpanel {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(tsplpanel::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(tsplpanel::config),
        help("Inspect the file with: tsplpanel config path")
    )]
    Config(Box<ConfigError>),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NotAttempted { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout { timeout_ms } => CliError::Timeout {
                seconds: timeout_ms.div_ceil(1000),
            },

            CoreError::Validation { message } => CliError::Validation {
                field: "document".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "agent_base_url".into(),
                reason: message,
            },

            other @ (CoreError::Agent { .. }
            | CoreError::Callback { .. }
            | CoreError::Internal(_)) => CliError::Agent {
                message: other.to_string(),
            },
        }
    }
}
