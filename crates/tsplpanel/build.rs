//! Build-time assets for packaging: man pages and shell completions.
//!
//! Written under `$TSPLPANEL_ASSETS_DIR` when set (packagers point it at
//! their staging tree), else under `$OUT_DIR/assets`. Layout:
//!
//! ```text
//! man/tsplpanel.1, man/tsplpanel-devices.1, man/tsplpanel-config-set-url.1, ...
//! completions/tsplpanel.bash, completions/_tsplpanel, completions/tsplpanel.fish
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Command, CommandFactory};
use clap_complete::{Shell, generate_to};

// cli.rs only depends on clap + clap_complete (both build-dependencies).
#[path = "src/cli.rs"]
mod cli;

const BIN_NAME: &str = "tsplpanel";
const SHELLS: [Shell; 3] = [Shell::Bash, Shell::Zsh, Shell::Fish];

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");
    println!("cargo::rerun-if-env-changed=TSPLPANEL_ASSETS_DIR");

    let assets = assets_dir()?;
    let mut cmd = cli::Cli::command().name(BIN_NAME);

    let man_dir = assets.join("man");
    fs::create_dir_all(&man_dir)?;
    write_man_pages(&cmd, BIN_NAME, &man_dir)?;

    let completions_dir = assets.join("completions");
    fs::create_dir_all(&completions_dir)?;
    for shell in SHELLS {
        generate_to(shell, &mut cmd, BIN_NAME, &completions_dir)?;
    }

    Ok(())
}

fn assets_dir() -> io::Result<PathBuf> {
    if let Some(dir) = env::var_os("TSPLPANEL_ASSETS_DIR") {
        return Ok(dir.into());
    }
    env::var_os("OUT_DIR")
        .map(|out| PathBuf::from(out).join("assets"))
        .ok_or_else(|| io::Error::other("OUT_DIR is not set"))
}

/// One page per command path, `tsplpanel-config-set-url.1` style. Hidden
/// subcommands and clap's generated `help` get no page.
fn write_man_pages(cmd: &Command, page: &str, dir: &Path) -> io::Result<()> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone().name(page.to_owned())).render(&mut buf)?;
    fs::write(dir.join(format!("{page}.1")), buf)?;

    for sub in cmd
        .get_subcommands()
        .filter(|sub| !sub.is_hide_set() && sub.get_name() != "help")
    {
        write_man_pages(sub, &format!("{page}-{}", sub.get_name()), dir)?;
    }
    Ok(())
}
