//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `catalog-merge` command-line tool, one file per subcommand.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `catalog_merge` library.

pub mod completions;
pub mod list;
pub mod merge;

use std::path::Path;

use anyhow::Result;
use catalog_merge::catalog::Catalog;
use catalog_merge::suggestions;

use crate::cli::GlobalOptions;

/// Open the catalog for `start`, honouring `--root` when given.
pub fn open_catalog(globals: &GlobalOptions, start: &Path) -> Result<Catalog> {
    match &globals.root {
        Some(root) => Catalog::open(root).map_err(|e| suggestions::catalog_failed(root, e)),
        None => Catalog::discover(start).map_err(|e| suggestions::catalog_failed(start, e)),
    }
}
