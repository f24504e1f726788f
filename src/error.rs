//! # Error Handling
//!
//! This module defines the centralized error type for `catalog-merge`. It uses
//! the `thiserror` library to build one `Error` enum covering every failure
//! mode of merge-list resolution and document merging.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failures. Resolution errors (`IncludeLoop`,
//!   `IncludeOutOfChroot`, `EmptyPath`, ...) abort the whole merge-list
//!   computation; merge errors (`IncorrectMeta`, `TypeMismatch`,
//!   `UnknownStrategy`, ...) abort the merge. Nothing is retried and no partial
//!   result is ever surfaced.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for catalog-merge operations
#[derive(Error, Debug)]
pub enum Error {
    /// A file was reached twice while expanding directives.
    #[error("Include loop: {} is included more than once", path.display())]
    IncludeLoop { path: PathBuf },

    /// A directive resolved to a path outside the repository root.
    #[error("Include path is out of chroot: {} is not inside {}", path.display(), root.display())]
    IncludeOutOfChroot { path: PathBuf, root: PathBuf },

    /// An empty path was given where a file path is required.
    #[error("Empty path")]
    EmptyPath,

    /// A meta file holds the meta key next to other top-level keys.
    #[error("Incorrect meta file {}: it has a __meta__ key and other variables", path.display())]
    IncorrectMeta { path: PathBuf },

    /// No version-control marker was found above the given path.
    #[error("Repository root not found for {}", path.display())]
    RootNotFound { path: PathBuf },

    /// A file that must exist does not.
    #[error("Path does not exist: {}", path.display())]
    PathNotFound { path: PathBuf },

    /// Directive expansion nested deeper than the allowed bound.
    #[error("Include depth exceeded {depth} while expanding {}", path.display())]
    IncludeDepthExceeded { path: PathBuf, depth: usize },

    /// A source document could not be parsed.
    #[error("Cannot parse {}: {message}", path.display())]
    DocumentParse { path: PathBuf, message: String },

    /// The accumulated value and a later value at a strategy path differ in kind.
    #[error("Merge strategy error at '{pointer}': destination is {expected} but source is {found}")]
    TypeMismatch {
        pointer: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A merge strategy name that is not known.
    #[error("Unknown merge strategy: {name}")]
    UnknownStrategy { name: String },

    /// A malformed JSON pointer, or a write through a non-container value.
    #[error("JSON pointer error for '{pointer}': {message}")]
    Pointer { pointer: String, message: String },

    /// Strategic list reconciliation failed.
    #[error("Strategic merge error: {message}")]
    Strategic { message: String },

    /// A merged document failed schema validation.
    #[error("{} - {message}", path.display())]
    Validation { path: PathBuf, message: String },

    /// The repository configuration file is invalid.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A git command failed.
    #[error("Git command failed: {command} - {stderr}")]
    GitCommand { command: String, stderr: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
