use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Top-level error type for the `tsplpanel-api` crate.
///
/// `tsplpanel-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The agent did not answer within the transport timeout.
    #[error("Agent did not answer within {}s", timeout.as_secs_f32())]
    Timeout {
        timeout: Duration,
        #[source]
        source: reqwest::Error,
    },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Agent ───────────────────────────────────────────────────────
    /// Non-2xx response. `body` is the parsed JSON problem document when
    /// the agent sent one, otherwise the raw text as a JSON string.
    #[error("Agent returned HTTP {status} for {path}")]
    Http {
        status: u16,
        path: String,
        body: Option<Value>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status, if the agent answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The response body the agent sent with a failure, if any.
    pub fn problem(&self) -> Option<&Value> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn http_failure_exposes_status_and_problem() {
        let err = Error::Http {
            status: 400,
            path: "/api/printer/print".into(),
            body: Some(json!({ "detail": "vid missing" })),
        };

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.problem(), Some(&json!({ "detail": "vid missing" })));
        assert_eq!(
            err.to_string(),
            "Agent returned HTTP 400 for /api/printer/print"
        );
    }

    #[test]
    fn bodyless_failure_has_no_problem() {
        let err = Error::Http {
            status: 503,
            path: "/api/usb/devices".into(),
            body: None,
        };
        assert_eq!(err.problem(), None);
    }
}
