//! # Repository Configuration
//!
//! This module defines the optional `.catalog-merge.yaml` file found at the
//! repository root, and the logic for reading it.
//!
//! ## Format
//!
//! ```yaml
//! # Files next to a catalog item that count as related to it.
//! related_files:
//!   - README.adoc
//!
//! # Same, with the option to load the file's text into the merged document.
//! related_files_v2:
//!   - file: description.adoc
//!     load_into: /__meta__/catalog/description
//!     content_type: asciidoc
//!
//! # Extra merge strategies, applied after the built-in ones.
//! strategies:
//!   - path: /__meta__/secrets
//!     strategy: strategic-merge
//! ```
//!
//! A missing file is equivalent to an empty one.

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::defaults::CONFIG_FILENAME;
use crate::error::{Error, Result};

/// A related file with optional loading into the merged document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedFile {
    /// File name, relative to the catalog item's directory
    pub file: String,

    /// JSON pointer where the file's text is written after merging
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_into: Option<String>,

    /// Format of the content, written next to `load_into` as `<key>_format`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// A `{path, strategy}` pair as written in configuration and schema files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub path: String,
    pub strategy: String,
}

/// Contents of the repository configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    #[serde(default)]
    pub related_files: Vec<String>,

    #[serde(default)]
    pub related_files_v2: Vec<RelatedFile>,

    #[serde(default)]
    pub strategies: Vec<StrategySpec>,
}

impl RepoConfig {
    /// Every related file name, first occurrence wins.
    pub fn related_file_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let all = self
            .related_files
            .iter()
            .map(String::as_str)
            .chain(self.related_files_v2.iter().map(|r| r.file.as_str()));
        for name in all {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Whether `name` is configured as a related file.
    pub fn is_related_file_name(&self, name: &str) -> bool {
        self.related_files.iter().any(|f| f == name)
            || self.related_files_v2.iter().any(|f| f.file == name)
    }

    /// Related files that must be loaded into the merged document.
    pub fn loaded_files(&self) -> impl Iterator<Item = (&RelatedFile, &str)> {
        self.related_files_v2
            .iter()
            .filter_map(|f| f.load_into.as_deref().map(|pointer| (f, pointer)))
    }
}

/// Parses a YAML string into a `RepoConfig`.
pub fn parse(yaml_content: &str) -> Result<RepoConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(RepoConfig::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| Error::Config {
        message: e.to_string(),
    })
}

/// Parse a `RepoConfig` from a YAML file path
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<RepoConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Load the configuration of the repository rooted at `root`.
///
/// Returns the default configuration when the file does not exist.
pub fn load(root: &Path) -> Result<RepoConfig> {
    let path = root.join(CONFIG_FILENAME);
    if !path.is_file() {
        debug!("no configuration file at {}", path.display());
        return Ok(RepoConfig::default());
    }
    debug!("loading configuration from {}", path.display());
    from_file(&path).map_err(|e| match e {
        Error::Config { message } => Error::Config {
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })
}
