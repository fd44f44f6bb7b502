//! Clap derive structures for the `tsplpanel` CLI.
//!
//! Only depends on clap and clap_complete: `build.rs` includes this file
//! directly to render man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tsplpanel -- control panel for TSPL label printers
#[derive(Debug, Parser)]
#[command(
    name = "tsplpanel",
    version,
    about = "Bind and print to TSPL label printers through the local USB agent",
    long_about = "Lists USB printers seen by the local agent, binds one as the active\n\
        printer and sends hardened TSPL documents to it.\n\n\
        Every agent call is bounded by a 15 s deadline.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Agent base URL (overrides config)
    #[arg(long, short = 'a', env = "TSPLPANEL_AGENT_URL", global = true)]
    pub agent_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "TSPLPANEL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "TSPLPANEL_INSECURE", global = true)]
    pub insecure: bool,

    /// HTTP timeout in seconds (overrides config)
    #[arg(long, env = "TSPLPANEL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List USB devices that can be bound as a printer
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// Show the printer currently bound on this machine
    #[command(alias = "id")]
    Identity,

    /// Bind a listed device as the active printer
    Bind(BindArgs),

    /// Harden a TSPL document and print it on the bound printer
    #[command(alias = "p")]
    Print(PrintArgs),

    /// Harden a TSPL document locally without contacting the agent
    Harden(HardenArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BindArgs {
    /// Physical device id as shown by `tsplpanel devices`
    pub device_id: String,
}

#[derive(Debug, Args)]
pub struct PrintArgs {
    /// TSPL file to print ("-" or omitted reads stdin)
    pub file: Option<PathBuf>,

    /// Print the built-in sample label instead of reading a document
    #[arg(long, conflicts_with = "file")]
    pub sample: bool,
}

#[derive(Debug, Args)]
pub struct HardenArgs {
    /// TSPL file to harden ("-" or omitted reads stdin)
    pub file: Option<PathBuf>,

    /// Emit the base64 payload sent to the agent instead of the text
    #[arg(long)]
    pub base64: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display the current resolved configuration
    Show,

    /// Set the agent base URL
    SetUrl {
        /// Agent base URL, e.g. http://localhost:5151
        url: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
