// Agent HTTP client
//
// Wraps `reqwest::Client` with agent URL construction and problem-body
// capture. URL construction is split from sending so callers can fail fast
// on a bad base URL before any request is in flight.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{
    BindRequest, BindResponse, DevicesResponse, IdentityResponse, PrintRequest, PrintResponse,
};
use crate::transport::TransportConfig;

pub const DEVICES_PATH: &str = "/api/usb/devices";
pub const IDENTITY_PATH: &str = "/api/printer/identity";
pub const BIND_PATH: &str = "/api/printer/bind";
pub const PRINT_PATH: &str = "/api/printer/print";

/// HTTP client for the local USB printer agent.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AgentClient {
    /// Create a client for the agent at `base_url`.
    ///
    /// A single trailing slash is stripped so paths join cleanly.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, transport.timeout))
    }

    /// Create a client with a pre-built `reqwest::Client`. `timeout` is the
    /// request timeout that client was built with; it is reported back in
    /// [`Error::Timeout`].
    pub fn with_client(http: reqwest::Client, base_url: &str, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.strip_suffix('/').unwrap_or(base_url).to_owned(),
            timeout,
        }
    }

    /// The agent base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build the full URL for an agent path: `{base}{path}`.
    pub fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}{path}", self.base_url))?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/usb/devices`
    pub async fn list_devices(&self) -> Result<DevicesResponse, Error> {
        self.get(self.endpoint(DEVICES_PATH)?).await
    }

    /// `GET /api/printer/identity`
    pub async fn identity(&self) -> Result<IdentityResponse, Error> {
        self.get(self.endpoint(IDENTITY_PATH)?).await
    }

    /// `POST /api/printer/bind`
    pub async fn bind(&self, req: &BindRequest) -> Result<BindResponse, Error> {
        self.post(self.endpoint(BIND_PATH)?, req).await
    }

    /// `POST /api/printer/print`
    ///
    /// An `ok: false` body is still a successful HTTP exchange and is
    /// returned as-is; only non-2xx statuses become errors.
    pub async fn print(&self, req: &PrintRequest) -> Result<PrintResponse, Error> {
        self.post(self.endpoint(PRINT_PATH)?, req).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.timed_out(e.into()))?;
        parse_response(resp).await.map_err(|e| self.timed_out(e))
    }

    /// Send a POST request with JSON body and decode the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.timed_out(e.into()))?;
        parse_response(resp).await.map_err(|e| self.timed_out(e))
    }

    /// Tag transport timeouts with the deadline that was missed.
    fn timed_out(&self, err: Error) -> Error {
        match err {
            Error::Transport(source) if source.is_timeout() => Error::Timeout {
                timeout: self.timeout,
                source,
            },
            other => other,
        }
    }
}

/// Decode a 2xx body, or turn anything else into `Error::Http` carrying the
/// agent's problem document.
async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let path = resp.url().path().to_owned();
    let body = resp.text().await?;
    trace!(%status, len = body.len(), "agent response");

    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            path,
            body: problem_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

fn problem_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_owned())))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    const SHORT: Duration = Duration::from_secs(1);

    #[test]
    fn trailing_slash_is_stripped() {
        let client =
            AgentClient::with_client(reqwest::Client::new(), "http://localhost:5151/", SHORT);
        assert_eq!(client.base_url(), "http://localhost:5151");
        assert_eq!(
            client.endpoint(DEVICES_PATH).unwrap().as_str(),
            "http://localhost:5151/api/usb/devices"
        );
    }

    #[test]
    fn endpoint_rejects_garbage_base() {
        let client = AgentClient::with_client(reqwest::Client::new(), "not a url", SHORT);
        assert!(matches!(
            client.endpoint(DEVICES_PATH),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[test]
    fn problem_body_prefers_json() {
        assert_eq!(
            problem_body(r#"{"message":"no printer"}"#),
            Some(json!({ "message": "no printer" }))
        );
        assert_eq!(problem_body("Bad Gateway"), Some(json!("Bad Gateway")));
        assert_eq!(problem_body("  "), None);
    }
}
