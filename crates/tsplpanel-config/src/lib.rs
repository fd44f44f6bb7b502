//! Configuration for the tsplpanel CLI.
//!
//! A single TOML file at the platform config path, overlaid by `TSPLPANEL_*`
//! environment variables, translated to `tsplpanel_api::TransportConfig`.
//! A broken or missing file never stops the panel from starting: callers use
//! [`load_config_or_default`] and get the loopback agent.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use tsplpanel_api::{TlsMode, TransportConfig};

/// Agent address used when nothing else is configured.
pub const DEFAULT_AGENT_URL: &str = "http://localhost:5151";

const ENV_PREFIX: &str = "TSPLPANEL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the USB printer agent.
    #[serde(default = "default_agent_url", alias = "agentBaseUrl")]
    pub agent_base_url: String,

    /// HTTP transport timeout in seconds. Agent calls are additionally
    /// bounded by the panel's own 15 s deadline.
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,

    /// Path to a custom CA certificate for an HTTPS agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Accept any certificate the agent presents.
    #[serde(default)]
    pub insecure: bool,

    /// Default output format for the CLI.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agent_base_url: default_agent_url(),
            http_timeout_secs: default_timeout(),
            ca_cert: None,
            insecure: false,
            output: default_output(),
        }
    }
}

fn default_agent_url() -> String {
    DEFAULT_AGENT_URL.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_output() -> String {
    "table".into()
}

impl Config {
    /// The agent base URL without its trailing slash, falling back to
    /// [`DEFAULT_AGENT_URL`] when blank.
    pub fn agent_base_url(&self) -> &str {
        let trimmed = self.agent_base_url.trim();
        if trimmed.is_empty() {
            return DEFAULT_AGENT_URL;
        }
        trimmed.strip_suffix('/').unwrap_or(trimmed)
    }

    /// [`agent_base_url`](Self::agent_base_url), parsed.
    pub fn agent_url(&self) -> Result<url::Url, ConfigError> {
        self.agent_base_url()
            .parse()
            .map_err(|e: url::ParseError| ConfigError::Validation {
                field: "agent_base_url".into(),
                reason: format!("{e}: {}", self.agent_base_url),
            })
    }

    /// HTTP transport settings for the agent client.
    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            ..TransportConfig::default()
        }
        .with_timeout(Duration::from_secs(self.http_timeout_secs))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "tsplpanel", "tsplpanel").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("tsplpanel");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment. A missing file yields the
/// defaults.
///
/// Defaults come from the serde field defaults rather than a serialized
/// base layer, so the `agentBaseUrl` alias never collides with a default
/// `agent_base_url` key.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, logging and discarding any failure.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|err| {
        warn!(error = %err, "config unavailable, using defaults");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
