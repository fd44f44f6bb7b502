mod cli;
mod commands;
mod config;
mod error;
mod notify;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tsplpanel_core::PanelController;

use crate::cli::{Cli, Command};
use crate::commands::Session;
use crate::error::CliError;
use crate::notify::ConsoleNotifier;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let color = output::should_color(cli.global.color);

    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "tsplpanel", &mut std::io::stdout());
            Ok(())
        }

        Command::Config(args) => {
            let cfg = config::load_config_or_default();
            let format = config::output_format(&cli.global, &cfg);
            commands::config_cmd::handle(args, format, cli.global.quiet)
        }

        Command::Harden(args) => {
            let cfg = config::load_config_or_default();
            let format = config::output_format(&cli.global, &cfg);
            let console = ConsoleNotifier::new(color, cli.global.quiet);
            commands::harden::handle(&args, format, cli.global.quiet, &console)
        }

        // Everything else talks to the agent
        cmd => {
            let resolved = config::resolve(&cli.global)?;
            let agent = config::agent_client(&resolved)?;
            let console = Arc::new(ConsoleNotifier::new(color, cli.global.quiet));

            let mut session = Session {
                panel: PanelController::new(Arc::new(agent), console.clone()),
                console,
                format: config::output_format(&cli.global, &resolved.config),
                quiet: cli.global.quiet,
            };

            tracing::debug!(command = ?cmd, url = %resolved.base_url, "dispatching command");
            commands::dispatch(cmd, &mut session).await
        }
    }
}
