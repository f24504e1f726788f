//! # Merge Executor
//!
//! Turns a catalog item into its final document.
//!
//! ## Steps
//!
//! 1. Resolve the merge list (see [`crate::include`]).
//! 2. Load every listed file, wrapping meta files under `__meta__`.
//! 3. **Baseline**: overwrite top-level keys document by document, so later
//!    files win outright at the top level.
//! 4. **Strategies**: for each `(pointer, strategy)` pair, in order, fold every
//!    document's value at the pointer into an accumulator with that strategy,
//!    then write the accumulator into the strategy result with an overwrite.
//! 5. Overlay the strategy result onto the baseline, one strategy path at a
//!    time.
//! 6. Load configured related files into the document and, when a change
//!    lookup is set, inject the last change at `/__meta__/last_update/git`.
//!
//! Any error aborts the merge. No partial document is returned.

pub mod strategic;
pub mod strategy;

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::debug;
use serde_json::{Map, Value};

use crate::catalog::Catalog;
use crate::config::StrategySpec;
use crate::defaults::GIT_INFO_POINTER;
use crate::document;
use crate::error::{Error, Result};
use crate::git::ChangeLookup;
use crate::include::{get_merge_list, MergeList};
use crate::path::absolutize;
use crate::pointer::{self, escape};

/// How values at a strategy path are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// The last value wins entirely
    Overwrite,
    /// Deep-merge maps, concatenate lists
    Merge,
    /// Deep-merge maps, replace lists
    MergeNoAppend,
    /// Like `Merge`, then collapse list entries sharing a `name`
    StrategicMerge,
}

impl StrategyKind {
    /// Every strategy, in documentation order.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Overwrite,
        StrategyKind::Merge,
        StrategyKind::MergeNoAppend,
        StrategyKind::StrategicMerge,
    ];

    /// The name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::Overwrite => "overwrite",
            StrategyKind::Merge => "merge",
            StrategyKind::MergeNoAppend => "merge-no-append",
            StrategyKind::StrategicMerge => "strategic-merge",
        }
    }

    /// Every strategy name.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.name()).collect()
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| Error::UnknownStrategy {
                name: s.to_string(),
            })
    }
}

/// A strategy scoped to one JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStrategy {
    pub path: String,
    pub kind: StrategyKind,
}

impl MergeStrategy {
    pub fn new(path: impl Into<String>, kind: StrategyKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Validate a strategy read from a configuration or schema file.
    pub fn from_spec(spec: &StrategySpec) -> Result<Self> {
        pointer::parse(&spec.path)?;
        Ok(Self::new(spec.path.clone(), spec.strategy.parse()?))
    }
}

/// Result of merging one catalog item.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// The final document
    pub document: Value,
    /// The files it was built from, earliest first
    pub merge_list: MergeList,
}

/// Merges catalog items of one catalog.
pub struct Merger<'a> {
    catalog: &'a Catalog,
    change_lookup: Option<&'a dyn ChangeLookup>,
}

impl<'a> Merger<'a> {
    /// A merger that does not look up version-control information.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            change_lookup: None,
        }
    }

    /// Inject the most recent change of each merged item.
    pub fn with_change_lookup(mut self, lookup: &'a dyn ChangeLookup) -> Self {
        self.change_lookup = Some(lookup);
        self
    }

    /// Merge the catalog item at `path`.
    pub fn merge(&self, path: &Path) -> Result<MergeOutput> {
        let path = absolutize(path)?;
        debug!("merging {}", path.display());

        let merge_list = get_merge_list(self.catalog, &path)?;
        let documents = merge_list
            .iter()
            .map(|source| document::load_source(&source.path))
            .collect::<Result<Vec<_>>>()?;

        let mut document = merge_documents(&documents, self.catalog.strategies())?;
        self.load_related_files(&path, &mut document)?;

        if let Some(lookup) = self.change_lookup {
            let related = self.catalog.related_paths(&path, &merge_list);
            if let Some(change) = lookup.find_most_recent_change(&path, &related)? {
                debug!("last change of {}: {}", path.display(), change.hash);
                pointer::set_relative(&mut document, GIT_INFO_POINTER, serde_json::to_value(&change)?)?;
            }
        }

        Ok(MergeOutput {
            document,
            merge_list,
        })
    }

    fn load_related_files(&self, item: &Path, document: &mut Value) -> Result<()> {
        let dir = item.parent().unwrap_or(self.catalog.root());

        for (related, target) in self.catalog.config().loaded_files() {
            let file = dir.join(&related.file);
            if !file.is_file() {
                continue;
            }
            debug!("loading {} into {}", file.display(), target);
            let content = fs::read_to_string(&file)?;
            pointer::set_relative(document, target, Value::String(content))?;

            if let Some(content_type) = &related.content_type {
                if let Some(format_pointer) = format_pointer(target)? {
                    pointer::set_relative(document, &format_pointer, Value::String(content_type.clone()))?;
                }
            }
        }
        Ok(())
    }
}

/// Pointer of the `<key>_format` sibling of `target`.
fn format_pointer(target: &str) -> Result<Option<String>> {
    let mut tokens = pointer::parse(target)?;
    let Some(last) = tokens.last_mut() else {
        return Ok(None);
    };
    last.push_str("_format");
    Ok(Some(tokens.iter().map(|t| format!("/{}", escape(t))).collect()))
}

/// Merge loaded documents, earliest first, with the given strategies.
pub fn merge_documents(documents: &[Value], strategies: &[MergeStrategy]) -> Result<Value> {
    let mut baseline = Map::new();
    for doc in documents {
        if let Value::Object(map) = doc {
            for (key, value) in map {
                baseline.insert(key.clone(), value.clone());
            }
        }
    }
    let mut baseline = Value::Object(baseline);

    let mut merged = Value::Object(Map::new());
    for merge_strategy in strategies {
        debug!("applying {} at {}", merge_strategy.kind, merge_strategy.path);

        let mut accumulator = Value::Object(Map::new());
        for doc in documents {
            strategy::apply(&mut accumulator, doc, merge_strategy)?;
        }

        let write_back = MergeStrategy::new(merge_strategy.path.clone(), StrategyKind::Overwrite);
        strategy::apply(&mut merged, &accumulator, &write_back)?;
    }

    for merge_strategy in strategies {
        pointer::set(&mut baseline, &merge_strategy.path, &merged)?;
    }

    Ok(baseline)
}

/// Merge the catalog item at `path` without version-control information.
pub fn merge_vars(catalog: &Catalog, path: &Path) -> Result<MergeOutput> {
    Merger::new(catalog).merge(path)
}
