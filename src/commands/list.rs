//! # List Command Implementation
//!
//! This module implements the `list` subcommand, which prints the catalog
//! items found below a directory.
//!
//! ## Functionality
//!
//! - **Related filters**: `--related` keeps items whose related files include
//!   every given path; `--or-related` also keeps items related to any one.
//! - **Content filter**: `--has` keeps items whose merged document holds a
//!   value at every given JSON pointer.
//! - **Formats**: one path per line, or a JSON or YAML list.
//!
//! Paths are printed relative to the listing directory. Listing never runs
//! git lookups.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use catalog_merge::catalog::{find_catalog_items, ItemFilter};
use catalog_merge::path::{absolutize, is_within_root, relative_to};
use catalog_merge::suggestions;

use crate::cli::GlobalOptions;
use crate::commands::open_catalog;

/// List the catalog items below a directory
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory to list. Defaults to the current directory.
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Keep items related to this file. Repeat to require several.
    #[arg(long, value_name = "FILE")]
    pub related: Vec<PathBuf>,

    /// Keep items related to this file, even if --related does not match.
    #[arg(long, value_name = "FILE")]
    pub or_related: Vec<PathBuf>,

    /// Keep items whose merged document has a value at this JSON pointer.
    #[arg(long, value_name = "POINTER")]
    pub has: Vec<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: ListFormat,
}

/// Output formats of the `list` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum ListFormat {
    /// One path per line
    #[default]
    Plain,
    /// A JSON list
    Json,
    /// A YAML list
    Yaml,
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, globals: &GlobalOptions) -> Result<()> {
    let dir = match &args.dir {
        Some(dir) => absolutize(dir)?,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    if !dir.is_dir() {
        return Err(suggestions::not_a_directory(&dir));
    }

    let catalog = open_catalog(globals, &dir)?;
    if !is_within_root(catalog.root(), &dir) {
        return Err(suggestions::dir_not_in_root(&dir, catalog.root()));
    }

    let filter = ItemFilter {
        related: absolutize_all(&args.related)?,
        or_related: absolutize_all(&args.or_related)?,
        has: args.has.clone(),
    };

    let items = find_catalog_items(&catalog, &dir, &filter)
        .with_context(|| format!("Failed to list catalog items in {}", dir.display()))?;
    let items: Vec<String> = items.iter().map(|item| display_item(item, &dir)).collect();

    print!("{}", render(&items, args.output)?);
    Ok(())
}

fn absolutize_all(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    Ok(paths
        .iter()
        .map(|p| absolutize(p))
        .collect::<catalog_merge::error::Result<Vec<_>>>()?)
}

fn display_item(item: &Path, dir: &Path) -> String {
    relative_to(item, dir)
        .unwrap_or_else(|| item.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn render(items: &[String], format: ListFormat) -> Result<String> {
    Ok(match format {
        ListFormat::Plain => items.iter().map(|item| format!("{item}\n")).collect(),
        ListFormat::Json => serde_json::to_string(items)?,
        ListFormat::Yaml => serde_yaml::to_string(items)?,
    })
}
