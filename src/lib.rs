//! # Catalog Merge Library
//!
//! This library builds the final variable set of catalog items: YAML files
//! in a version-controlled repository that inherit shared defaults from
//! their ancestor directories and pull in other files through directives.
//! It backs the `catalog-merge` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use catalog_merge::merge::{merge_documents, MergeStrategy, StrategyKind};
//! use serde_json::json;
//!
//! let common = json!({"region": "eu", "__meta__": {"tags": ["base"]}});
//! let item = json!({"size": 3, "__meta__": {"tags": ["item"]}});
//!
//! let strategies = vec![MergeStrategy::new("/__meta__", StrategyKind::Merge)];
//! let merged = merge_documents(&[common, item], &strategies).unwrap();
//!
//! assert_eq!(
//!     merged,
//!     json!({"region": "eu", "size": 3, "__meta__": {"tags": ["base", "item"]}})
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Catalog (`catalog`)**: The repository root, its configuration, its
//!   schemas and its merge strategies, bundled into one read-only context.
//!   Also decides which files are catalog items and lists them.
//! - **Directives (`directive`)**: `#include` and `#merge` comment lines that
//!   pull other files into a file's merge list.
//! - **Merge-List Resolver (`include`)**: Computes the ordered list of files
//!   a catalog item is built from: ancestor `common.yaml` files, meta files and
//!   directive targets.
//! - **Merge Executor (`merge`)**: Folds the listed documents into one, with
//!   path-scoped strategies (`overwrite`, `merge`, `merge-no-append`,
//!   `strategic-merge`).
//! - **Schemas (`schema`)** and **git (`git`)**: Optional collaborators that
//!   contribute strategies, validate results and record the last change.
//!
//! ## Execution Flow
//!
//! 1.  **Discovery**: Find the repository root above the item.
//! 2.  **Resolution**: Build the merge list.
//! 3.  **Loading**: Parse every listed file, wrapping meta files under
//!     `__meta__`.
//! 4.  **Merging**: Top-level overwrite, then each strategy at its path.
//! 5.  **Enrichment**: Load related files and the last git change.

pub mod catalog;
pub mod config;
pub mod defaults;
pub mod directive;
pub mod document;
pub mod error;
pub mod git;
pub mod include;
pub mod merge;
pub mod output;
pub mod path;
pub mod pointer;
pub mod schema;
pub mod suggestions;

#[cfg(test)]
mod path_proptest;
