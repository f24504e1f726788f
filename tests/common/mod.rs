//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a catalog fixture and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = CatalogFixture::new()
//!         .with_file("common.yaml", "region: eu\n")
//!         .with_file("team/dev.yaml", "name: dev\n");
//!     let merged = fixture.merge("team/dev.yaml");
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

use catalog_merge::catalog::Catalog;
use catalog_merge::merge::{MergeOutput, Merger};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;
    #[allow(unused_imports)]
    pub use serde_json::json;

    pub use super::CatalogFixture;
}

/// A temporary catalog repository: a directory holding a `.git` marker.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = CatalogFixture::new().with_file("dev.yaml", "a: 1\n");
///
/// fixture
///     .command()
///     .args(["merge", "dev.yaml", "--no-git"])
///     .assert()
///     .success();
/// ```
pub struct CatalogFixture {
    temp_dir: assert_fs::TempDir,
}

impl CatalogFixture {
    /// Create a new catalog with an empty `.git` directory.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child(".git")
            .create_dir_all()
            .expect("Failed to create .git marker");
        Self { temp_dir }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add the repository configuration file.
    #[allow(dead_code)]
    pub fn with_config(self, content: &str) -> Self {
        self.with_file(".catalog-merge.yaml", content)
    }

    /// Add a schema file under `.schemas/`.
    #[allow(dead_code)]
    pub fn with_schema(self, name: &str, content: &str) -> Self {
        self.with_file(&format!(".schemas/{name}"), content)
    }

    /// Get the path to the catalog root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a file in the catalog.
    pub fn file(&self, path: &str) -> PathBuf {
        self.path().join(path)
    }

    /// Open the catalog.
    #[allow(dead_code)]
    pub fn catalog(&self) -> Catalog {
        Catalog::open(self.path()).expect("Failed to open catalog")
    }

    /// Merge a catalog item without git lookups.
    #[allow(dead_code)]
    pub fn merge(&self, path: &str) -> MergeOutput {
        let catalog = self.catalog();
        Merger::new(&catalog)
            .merge(&self.file(path))
            .expect("Failed to merge")
    }

    /// Merge list of a catalog item, as paths relative to the root.
    #[allow(dead_code)]
    pub fn merge_list(&self, path: &str) -> Vec<String> {
        let catalog = self.catalog();
        catalog_merge::include::get_merge_list(&catalog, &self.file(path))
            .expect("Failed to resolve merge list")
            .iter()
            .map(|source| self.relative(&source.path))
            .collect()
    }

    /// Express an absolute path relative to the catalog root.
    #[allow(dead_code)]
    pub fn relative(&self, path: &Path) -> String {
        path.strip_prefix(self.path())
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }

    /// Create a command running in the catalog root.
    #[allow(dead_code)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("catalog-merge");
        cmd.current_dir(self.path())
            .env_remove("CATALOG_MERGE_ROOT")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for CatalogFixture {
    fn default() -> Self {
        Self::new()
    }
}
