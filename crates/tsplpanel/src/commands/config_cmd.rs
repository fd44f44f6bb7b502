//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, format: OutputFormat, quiet: bool) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(format, &cfg, format_toml, |c| {
                c.agent_base_url().to_owned()
            });
            output::print_output(&out, quiet);
            Ok(())
        }

        ConfigCommand::SetUrl { url } => {
            let mut cfg = config::load_config_or_default();
            cfg.agent_base_url = url;
            cfg.agent_url()?;
            cfg.agent_base_url = cfg.agent_base_url().to_owned();
            config::save_config(&cfg)?;

            tracing::info!(path = %config::config_path().display(), "config saved");
            output::print_output(
                &format!("Agent URL set to {}", cfg.agent_base_url()),
                quiet,
            );
            Ok(())
        }
    }
}

fn format_toml(cfg: &Config) -> String {
    toml::to_string_pretty(cfg).unwrap_or_else(|e| format!("# unrenderable config: {e}"))
}
