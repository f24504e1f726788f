//! # Merge Command Implementation
//!
//! This module implements the `merge` subcommand, which prints the final
//! variables of one catalog item.
//!
//! ## Output
//!
//! YAML output starts with a header made of comments, so it can be piped
//! into other tools as is:
//!
//! ```yaml
//! ---
//! # STRATEGIES:
//! #   merge           /__meta__
//! # MERGED:
//! #   common.yaml
//! #   team/dev.yaml
//! name: dev
//! ```
//!
//! JSON output holds the document only.
//!
//! This command is read-only.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use log::warn;

use catalog_merge::catalog::Catalog;
use catalog_merge::document;
use catalog_merge::error::Error;
use catalog_merge::git::GitCli;
use catalog_merge::include::SourceRef;
use catalog_merge::merge::{MergeOutput, Merger};
use catalog_merge::output::{comment, OutputConfig};
use catalog_merge::path::{absolutize, display_relative};
use catalog_merge::schema::Validator;
use catalog_merge::suggestions;

use crate::cli::GlobalOptions;
use crate::commands::open_catalog;

/// Print the merged variables of a catalog item
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// The catalog item to merge.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub output: MergeFormat,

    /// Skip validation of the merged document against the repository schemas.
    #[arg(long)]
    pub no_validate: bool,

    /// Skip the git lookup that fills `__meta__.last_update.git`.
    #[arg(long)]
    pub no_git: bool,
}

/// Output formats of the `merge` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum MergeFormat {
    /// Header comments followed by the YAML document
    #[default]
    Yaml,
    /// The document as compact JSON
    Json,
}

/// Execute the `merge` command.
pub fn execute(args: MergeArgs, globals: &GlobalOptions) -> Result<()> {
    let file = absolutize(&args.file).map_err(|e| suggestions::merge_failed(&args.file, e))?;
    if !file.is_file() {
        return Err(suggestions::merge_failed(
            &args.file,
            Error::PathNotFound { path: file },
        ));
    }

    let catalog = open_catalog(globals, &file)?;
    if !catalog.is_catalog_item(&file) {
        warn!("{} is not a catalog item", file.display());
    }

    let git = GitCli::new(catalog.root());
    let mut merger = Merger::new(&catalog);
    if !args.no_git {
        merger = merger.with_change_lookup(&git);
    }

    let merged = merger
        .merge(&file)
        .map_err(|e| suggestions::merge_failed(&args.file, e))?;

    if !args.no_validate {
        catalog.schemas().validate(&file, &merged.document)?;
    }

    let workdir = std::env::current_dir().context("Failed to get current directory")?;
    let rendered = render(&catalog, &merged, args.output, &workdir, &globals.output)?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn render(
    catalog: &Catalog,
    merged: &MergeOutput,
    format: MergeFormat,
    workdir: &Path,
    output: &OutputConfig,
) -> Result<String> {
    match format {
        MergeFormat::Json => Ok(serde_json::to_string(&merged.document)?),
        MergeFormat::Yaml => {
            let mut out = String::from("---\n");
            for line in header_lines(catalog, &merged.merge_list, workdir) {
                out.push_str(&comment(output, &line));
                out.push('\n');
            }
            out.push_str(&document::to_yaml_string(&merged.document)?);
            Ok(out)
        }
    }
}

fn header_lines(catalog: &Catalog, merge_list: &[SourceRef], workdir: &Path) -> Vec<String> {
    let mut lines = vec!["# STRATEGIES:".to_string()];
    for strategy in catalog.strategies() {
        lines.push(format!("#   {:<15} {}", strategy.kind.name(), strategy.path));
    }

    if !merge_list.is_empty() {
        lines.push("# MERGED:".to_string());
        for source in merge_list {
            lines.push(format!("#   {}", display_relative(&source.path, workdir)));
        }
    }
    lines
}
