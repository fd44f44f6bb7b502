//! CLI configuration: thin wrapper around `tsplpanel_config`.
//!
//! Adds the `GlobalOpts` overrides (--agent-url, --timeout, --insecure,
//! --output) on top of the loaded file.

use tsplpanel_api::{AgentClient, TlsMode};
use tsplpanel_core::CoreError;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use tsplpanel_config::{
    Config, config_path, load_config, load_config_or_default, save_config,
};

/// Agent URL and transport after applying flag overrides.
#[derive(Debug)]
pub struct Resolved {
    pub config: Config,
    pub base_url: String,
}

pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let mut config = load_config_or_default();

    if let Some(ref url) = global.agent_url {
        config.agent_base_url.clone_from(url);
    }
    if let Some(secs) = global.timeout {
        config.http_timeout_secs = secs;
    }
    if global.insecure {
        config.insecure = true;
    }

    config.agent_url()?;
    let base_url = config.agent_base_url().to_owned();
    Ok(Resolved { config, base_url })
}

/// Build the agent client for a resolved configuration.
pub fn agent_client(resolved: &Resolved) -> Result<AgentClient, CliError> {
    let transport = resolved.config.transport();
    if matches!(transport.tls, TlsMode::DangerAcceptInvalid) {
        tracing::warn!("TLS certificate verification disabled");
    }
    tracing::debug!(
        url = %resolved.base_url,
        timeout = ?transport.timeout,
        "agent client"
    );
    AgentClient::new(&resolved.base_url, &transport)
        .map_err(|e| CliError::from(CoreError::from(e)))
}

/// Output format: flag > config file > table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        <OutputFormat as clap::ValueEnum>::from_str(&config.output, true)
            .unwrap_or(OutputFormat::Table)
    })
}

