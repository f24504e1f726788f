//! `catalog-merge completions <SHELL>`
//!
//! Prints a completion script for the whole command line, including the
//! `merge` and `list` options, to stdout:
//!
//! ```bash
//! catalog-merge completions bash > ~/.local/share/bash-completion/completions/catalog-merge
//! catalog-merge completions zsh > ~/.zfunc/_catalog-merge
//! ```

use std::io::{self, Write};

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell (bash, zsh, fish, powershell, elvish)
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_completions(args.shell, &mut out)?;
    out.flush()?;
    Ok(())
}

fn write_completions(shell: Shell, out: &mut impl Write) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, out);
    Ok(())
}
