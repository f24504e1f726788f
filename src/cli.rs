//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use catalog_merge::output::{ColorChoice, OutputConfig};

/// Catalog Merge - Compose catalog items from shared YAML defaults
#[derive(Parser, Debug)]
#[command(name = "catalog-merge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize the YAML header comments
    #[arg(long, global = true, value_name = "WHEN", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    /// Shorthand for --log-level debug
    #[arg(long, global = true)]
    debug: bool,

    /// Repository root. Found by walking up to the nearest `.git` when omitted.
    #[arg(long, global = true, value_name = "DIR", env = "CATALOG_MERGE_ROOT")]
    root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the merged variables of a catalog item
    Merge(commands::merge::MergeArgs),

    /// List the catalog items below a directory
    List(commands::list::ListArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub root: Option<PathBuf>,
    pub output: OutputConfig,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let level = if self.debug {
            "debug"
        } else {
            self.log_level.as_str()
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
            .format_timestamp(None)
            .init();

        let output = OutputConfig::new(self.color);
        console::set_colors_enabled(output.use_color);
        console::set_colors_enabled_stderr(output.use_color);

        let globals = GlobalOptions {
            root: self.root,
            output,
        };

        match self.command {
            Commands::Merge(args) => commands::merge::execute(args, &globals),
            Commands::List(args) => commands::list::execute(args, &globals),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
