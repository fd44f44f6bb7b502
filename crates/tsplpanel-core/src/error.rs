// ── Core error types ──
//
// User-facing errors from tsplpanel-core. The `From<tsplpanel_api::Error>`
// impl translates transport-layer errors into panel-level variants while
// keeping the agent's problem document for the error extractor.

use serde_json::{Value, json};
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Pre-conditions ───────────────────────────────────────────────
    #[error("{message}")]
    Validation { message: String },

    // ── Transport ────────────────────────────────────────────────────
    #[error("Agent did not respond within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Cannot reach agent at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("{message}")]
    Agent {
        message: String,
        /// HTTP status code, when the agent answered.
        status: Option<u16>,
        /// Response body the agent sent with the failure.
        problem: Option<Value>,
    },

    // ── Panel ────────────────────────────────────────────────────────
    /// A success handler rejected the result it was given.
    #[error("{message}")]
    Callback { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }

    /// Loosely-typed view of this failure for [`crate::problem::extract`]:
    /// `{ "error": <problem body>, "message": <display text> }`.
    pub fn failure_value(&self) -> Value {
        let problem = match self {
            Self::Agent { problem, .. } => problem.clone().unwrap_or(Value::Null),
            _ => Value::Null,
        };
        json!({ "error": problem, "message": self.to_string() })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<tsplpanel_api::Error> for CoreError {
    fn from(err: tsplpanel_api::Error) -> Self {
        match err {
            tsplpanel_api::Error::Transport(ref e) if e.is_connect() => {
                CoreError::ConnectionFailed {
                    url: e
                        .url()
                        .map_or_else(|| "<unknown>".into(), ToString::to_string),
                    reason: e.to_string(),
                }
            }
            tsplpanel_api::Error::Timeout { timeout, .. } => CoreError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            tsplpanel_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid agent URL: {e}"),
            },
            tsplpanel_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            tsplpanel_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected agent response: {message}"))
            }
            other => CoreError::Agent {
                message: other.to_string(),
                status: other.status(),
                problem: other.problem().cloned(),
            },
        }
    }
}
