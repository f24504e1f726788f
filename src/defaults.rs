//! Default values and layout conventions for catalog repositories.
//!
//! This module centralizes every file name, directory name and pointer that
//! the resolver and the merge executor agree on, so the conventions live in
//! one place.

/// Directory (or file) whose presence marks the repository root.
pub const ROOT_MARKER: &str = ".git";

/// Repository configuration file, looked up at the repository root.
pub const CONFIG_FILENAME: &str = ".catalog-merge.yaml";

/// Directory holding schema files, relative to the repository root.
pub const SCHEMA_DIR: &str = ".schemas";

/// Reserved ancestor file names, in lookup priority order.
///
/// The first one found in a directory is that directory's common file.
pub const COMMON_FILE_NAMES: &[&str] = &["common.yaml", "common.yml", "account.yaml", "account.yml"];

/// Extensions a document file may carry.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Directory name whose content is never a catalog item.
pub const INCLUDES_DIR: &str = "includes";

/// Top-level key that meta files are wrapped under.
pub const META_KEY: &str = "__meta__";

/// Pointer where version-control information is injected.
pub const GIT_INFO_POINTER: &str = "/__meta__/last_update/git";

/// Files next to a catalog item that always count as related to it.
pub const DEFAULT_RELATED_FILES: &[&str] = &["description.adoc", "description.html"];

/// Upper bound on nested directive expansions.
pub const MAX_INCLUDE_DEPTH: usize = 64;

/// Strategies applied before any configured or schema-provided strategy.
pub fn default_strategies() -> Vec<crate::merge::MergeStrategy> {
    vec![crate::merge::MergeStrategy::new(
        "/__meta__",
        crate::merge::StrategyKind::Merge,
    )]
}
