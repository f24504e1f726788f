//! # Catalog
//!
//! A catalog is a directory tree, rooted at a version-controlled repository,
//! whose YAML files are catalog items or shared defaults for them.
//!
//! ## Key Components
//!
//! - **[`Catalog`]**: The context every operation receives. It holds the
//!   repository root, the repository configuration, the loaded schemas and
//!   the ordered merge strategies. It is built once and only read afterwards.
//!
//! - **Root Locator**: [`find_root`] walks up from a path to the nearest
//!   directory holding a `.git` marker.
//!
//! - **Classifier**: [`Catalog::is_path_catalog_item`] and
//!   [`Catalog::is_catalog_item`] decide whether a file is a mergeable leaf.
//!
//! - **Listing**: [`find_catalog_items`] enumerates the catalog items below a
//!   directory, optionally filtered by related files or by pointers present
//!   in the merged document.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::config::{self, RepoConfig};
use crate::defaults::{
    default_strategies, COMMON_FILE_NAMES, DEFAULT_RELATED_FILES, INCLUDES_DIR, ROOT_MARKER,
};
use crate::error::{Error, Result};
use crate::include::{get_merge_list, SourceRef};
use crate::merge::{MergeStrategy, Merger};
use crate::path::{absolutize, has_document_extension, is_meta_path, is_within_root};
use crate::pointer;
use crate::schema::SchemaSet;

/// Find the repository root above `path`.
///
/// `path` may be a file or a directory. The root is the nearest directory,
/// `path` itself included, that contains a `.git` entry.
pub fn find_root(path: &Path) -> Result<PathBuf> {
    let path = absolutize(path)?;
    if !path.exists() {
        return Err(Error::PathNotFound { path });
    }

    let mut current = if path.is_dir() {
        Some(path.as_path())
    } else {
        path.parent()
    };

    while let Some(dir) = current {
        if dir.join(ROOT_MARKER).exists() {
            debug!("repository root for {} is {}", path.display(), dir.display());
            return Ok(dir.to_path_buf());
        }
        current = dir.parent();
    }

    Err(Error::RootNotFound { path })
}

fn opt_out_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t]*#[ \t]*catalog_item[ \t]+false[ \t]*$")
            .expect("opt-out regex is valid")
    })
}

/// Repository context shared by every operation.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: PathBuf,
    config: RepoConfig,
    schemas: SchemaSet,
    strategies: Vec<MergeStrategy>,
}

impl Catalog {
    /// Build a catalog from already loaded parts.
    pub fn new(
        root: PathBuf,
        config: RepoConfig,
        schemas: SchemaSet,
        strategies: Vec<MergeStrategy>,
    ) -> Self {
        Self {
            root,
            config,
            schemas,
            strategies,
        }
    }

    /// Open the catalog rooted at `root`.
    ///
    /// Loads the repository configuration and the schemas, then assembles the
    /// strategy list: built-in defaults, configured strategies, and schema
    /// strategies, in that order.
    pub fn open(root: &Path) -> Result<Self> {
        let root = absolutize(root)?;
        if !root.is_dir() {
            return Err(Error::PathNotFound { path: root });
        }

        let config = config::load(&root)?;
        let schemas = SchemaSet::load(&root)?;

        let mut strategies = default_strategies();
        for spec in &config.strategies {
            strategies.push(MergeStrategy::from_spec(spec)?);
        }
        strategies.extend(schemas.strategies()?);
        debug!("merge strategies: {:?}", strategies);

        Ok(Self::new(root, config, schemas, strategies))
    }

    /// Find the repository root above `path` and open it.
    pub fn discover(path: &Path) -> Result<Self> {
        Self::open(&find_root(path)?)
    }

    /// The repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The repository configuration.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// The loaded schemas.
    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// The ordered merge strategies.
    pub fn strategies(&self) -> &[MergeStrategy] {
        &self.strategies
    }

    /// Decide from the path alone whether `path` can be a catalog item.
    pub fn is_path_catalog_item(&self, path: &Path) -> bool {
        if path == self.root || !is_within_root(&self.root, path) {
            return false;
        }

        let Ok(relative) = path.strip_prefix(&self.root) else {
            return false;
        };
        for segment in relative.iter() {
            let segment = segment.to_string_lossy();
            if segment == "." || segment == ".." {
                continue;
            }
            if segment == INCLUDES_DIR || segment.starts_with('.') {
                return false;
            }
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if COMMON_FILE_NAMES.contains(&name.as_str()) || self.config.is_related_file_name(&name) {
            return false;
        }

        has_document_extension(path) && !is_meta_path(path)
    }

    /// Decide whether `path` is an existing, enabled catalog item.
    ///
    /// A file opts out with a `# catalog_item false` line.
    pub fn is_catalog_item(&self, path: &Path) -> bool {
        if !self.is_path_catalog_item(path) || !path.is_file() {
            return false;
        }

        match has_opt_out_marker(path) {
            Ok(opted_out) => !opted_out,
            Err(e) => {
                warn!("cannot read {}: {}", path.display(), e);
                false
            }
        }
    }

    /// The next ancestor common file above `position`.
    ///
    /// From a common file, the search resumes in the parent of the directory
    /// that holds it. From any other file, it starts in the file's directory.
    /// Returns `None` once the search would leave the repository root.
    pub fn next_common_file(&self, position: &Path) -> Option<PathBuf> {
        let mut position = position.to_path_buf();

        loop {
            let is_common = position
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| COMMON_FILE_NAMES.contains(&n));

            if is_common {
                let parent = position.parent()?.parent()?.to_path_buf();
                if !is_within_root(&self.root, &parent) {
                    debug!("{} is out of root {}", parent.display(), self.root.display());
                    return None;
                }
                position = parent;
                continue;
            }

            if !position.is_dir() {
                position = position.parent()?.to_path_buf();
                continue;
            }

            for name in COMMON_FILE_NAMES {
                let candidate = position.join(name);
                if candidate.is_file() {
                    debug!("common file found: {}", candidate.display());
                    return Some(candidate);
                }
            }

            let parent = position.parent()?.to_path_buf();
            if !is_within_root(&self.root, &parent) {
                return None;
            }
            position = parent;
        }
    }

    /// Files whose change affects the merged document of `item`.
    ///
    /// That is the merge list, the description files next to the item, and
    /// the configured related files next to the item.
    pub fn related_paths(&self, item: &Path, merge_list: &[SourceRef]) -> Vec<PathBuf> {
        let dir = item.parent().unwrap_or(self.root.as_path());
        let mut related: Vec<PathBuf> = merge_list.iter().map(|s| s.path.clone()).collect();

        related.extend(DEFAULT_RELATED_FILES.iter().map(|name| dir.join(name)));
        for name in self.config.related_file_names() {
            let path = dir.join(name);
            if !related.contains(&path) {
                related.push(path);
            }
        }
        related
    }
}

fn has_opt_out_marker(path: &Path) -> io::Result<bool> {
    let reader = BufReader::new(File::open(path)?);
    for line in reader.lines() {
        if opt_out_regex().is_match(&line?) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Filters applied while listing catalog items.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Keep items related to every one of these files
    pub related: Vec<PathBuf>,
    /// Also keep items related to any one of these files
    pub or_related: Vec<PathBuf>,
    /// Keep items whose merged document has all of these pointers
    pub has: Vec<String>,
}

impl ItemFilter {
    fn uses_related(&self) -> bool {
        !self.related.is_empty() || !self.or_related.is_empty()
    }
}

/// List the catalog items below `dir`, sorted by path.
///
/// Dot entries are never descended into. An item that fails to resolve or
/// merge while a filter needs it is skipped with a warning.
pub fn find_catalog_items(catalog: &Catalog, dir: &Path, filter: &ItemFilter) -> Result<Vec<PathBuf>> {
    for pointer in &filter.has {
        pointer::parse(pointer)?;
    }

    let dir = absolutize(dir)?;
    let merger = Merger::new(catalog);
    let mut items = Vec::new();

    let walker = WalkDir::new(&dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !catalog.is_catalog_item(path) {
            continue;
        }

        if !filter.has.is_empty() {
            let document = match merger.merge(path) {
                Ok(output) => output.document,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let mut keep = true;
            for ptr in &filter.has {
                if !pointer::contains(&document, ptr)? {
                    keep = false;
                    break;
                }
            }
            if !keep {
                continue;
            }
        }

        if filter.uses_related() {
            let merge_list = match get_merge_list(catalog, path) {
                Ok(list) => list,
                Err(e) => {
                    warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            let related = catalog.related_paths(path, &merge_list);
            if !matches_related(&related, filter) {
                continue;
            }
        }

        items.push(path.to_path_buf());
    }

    debug!("{} catalog items found in {}", items.len(), dir.display());
    Ok(items)
}

fn matches_related(related: &[PathBuf], filter: &ItemFilter) -> bool {
    let any = filter.or_related.iter().any(|p| related.contains(p));
    if any {
        return true;
    }
    !filter.related.is_empty() && filter.related.iter().all(|p| related.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo() -> (TempDir, Catalog) {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        let catalog = Catalog::open(temp.path()).unwrap();
        (temp, catalog)
    }

    fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_find_root_from_file_and_dir() {
        let (temp, catalog) = repo();
        let item = write(temp.path(), "a/b/item.yaml", "x: 1\n");
        assert_eq!(find_root(&item).unwrap(), catalog.root());
        assert_eq!(find_root(item.parent().unwrap()).unwrap(), catalog.root());
    }

    #[test]
    fn test_find_root_missing_path() {
        let err = find_root(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn test_is_path_catalog_item() {
        let (_temp, catalog) = repo();
        let root = catalog.root().to_path_buf();

        assert!(catalog.is_path_catalog_item(&root.join("team/dev.yaml")));
        assert!(catalog.is_path_catalog_item(&root.join("team/dev.yml")));
        assert!(!catalog.is_path_catalog_item(&root));
        assert!(!catalog.is_path_catalog_item(Path::new("/elsewhere/dev.yaml")));
        assert!(!catalog.is_path_catalog_item(&root.join("includes/dev.yaml")));
        assert!(!catalog.is_path_catalog_item(&root.join("team/includes/dev.yaml")));
        assert!(!catalog.is_path_catalog_item(&root.join(".hidden/dev.yaml")));
        assert!(!catalog.is_path_catalog_item(&root.join("team/.dev.yaml")));
        assert!(!catalog.is_path_catalog_item(&root.join("team/common.yaml")));
        assert!(!catalog.is_path_catalog_item(&root.join("team/account.yml")));
        assert!(!catalog.is_path_catalog_item(&root.join("team/dev.json")));
        assert!(!catalog.is_path_catalog_item(&root.join("team/dev.meta.yaml")));
    }

    #[test]
    fn test_related_file_names_are_not_catalog_items() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write(temp.path(), ".catalog-merge.yaml", "related_files: [extra.yaml]\n");
        let catalog = Catalog::open(temp.path()).unwrap();
        assert!(!catalog.is_path_catalog_item(&catalog.root().join("team/extra.yaml")));
    }

    #[test]
    fn test_is_catalog_item_opt_out_marker() {
        let (_temp, catalog) = repo();
        let root = catalog.root().to_path_buf();
        let enabled = write(&root, "team/a.yaml", "x: 1\n");
        let disabled = write(&root, "team/b.yaml", "x: 1\n  # catalog_item false  \n");
        let commented = write(&root, "team/c.yaml", "x: 1 # catalog_item false\n");

        assert!(catalog.is_catalog_item(&enabled));
        assert!(!catalog.is_catalog_item(&disabled));
        assert!(catalog.is_catalog_item(&commented));
        assert!(!catalog.is_catalog_item(&root.join("team/missing.yaml")));
    }

    #[test]
    fn test_next_common_file_walks_up() {
        let (_temp, catalog) = repo();
        let root = catalog.root().to_path_buf();
        let top = write(&root, "common.yaml", "a: 1\n");
        let mid = write(&root, "x/account.yml", "a: 2\n");
        let item = write(&root, "x/y/item.yaml", "b: 1\n");

        assert_eq!(catalog.next_common_file(&item), Some(mid.clone()));
        assert_eq!(catalog.next_common_file(&mid), Some(top.clone()));
        assert_eq!(catalog.next_common_file(&top), None);
    }

    #[test]
    fn test_next_common_file_priority() {
        let (_temp, catalog) = repo();
        let root = catalog.root().to_path_buf();
        let common = write(&root, "x/common.yaml", "a: 1\n");
        write(&root, "x/account.yaml", "a: 2\n");
        let item = write(&root, "x/item.yaml", "b: 1\n");

        assert_eq!(catalog.next_common_file(&item), Some(common));
    }

    #[test]
    fn test_related_paths() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        write(
            temp.path(),
            ".catalog-merge.yaml",
            "related_files: [notes.adoc, description.adoc]\n",
        );
        let catalog = Catalog::open(temp.path()).unwrap();
        let item = catalog.root().join("x/item.yaml");
        let list = vec![SourceRef::new(item.clone(), true)];

        let related = catalog.related_paths(&item, &list);
        let dir = catalog.root().join("x");
        assert_eq!(
            related,
            vec![
                item.clone(),
                dir.join("description.adoc"),
                dir.join("description.html"),
                dir.join("notes.adoc"),
            ]
        );
    }

    #[test]
    fn test_find_catalog_items_sorted_and_filtered() {
        let (_temp, catalog) = repo();
        let root = catalog.root().to_path_buf();
        write(&root, "common.yaml", "a: 1\n");
        let b = write(&root, "team/b.yaml", "__meta__:\n  catalog: {}\n");
        let a = write(&root, "team/a.yaml", "x: 1\n");
        write(&root, "team/a.meta.yaml", "owner: ops\n");
        write(&root, "includes/inc.yaml", "x: 1\n");
        write(&root, ".hidden/z.yaml", "x: 1\n");

        let all = find_catalog_items(&catalog, &root, &ItemFilter::default()).unwrap();
        assert_eq!(all, vec![a.clone(), b.clone()]);

        let filter = ItemFilter {
            has: vec!["/__meta__/catalog".to_string()],
            ..Default::default()
        };
        assert_eq!(find_catalog_items(&catalog, &root, &filter).unwrap(), vec![b]);
    }

    #[test]
    fn test_find_catalog_items_related() {
        let (_temp, catalog) = repo();
        let root = catalog.root().to_path_buf();
        let inc = write(&root, "includes/inc.yaml", "x: 1\n");
        let a = write(&root, "team/a.yaml", "#include /includes/inc.yaml\n");
        let b = write(&root, "team/b.yaml", "y: 1\n");

        let filter = ItemFilter {
            related: vec![inc.clone()],
            ..Default::default()
        };
        assert_eq!(find_catalog_items(&catalog, &root, &filter).unwrap(), vec![a.clone()]);

        let filter = ItemFilter {
            or_related: vec![inc, b.clone()],
            ..Default::default()
        };
        assert_eq!(find_catalog_items(&catalog, &root, &filter).unwrap(), vec![a, b]);
    }

    #[test]
    fn test_find_catalog_items_skips_broken_items_when_filtering() {
        let (_temp, catalog) = repo();
        let root = catalog.root().to_path_buf();
        write(&root, "team/broken.yaml", "#include missing.yaml\n");
        let ok = write(&root, "team/ok.yaml", "x: 1\n");

        let filter = ItemFilter {
            has: vec!["/x".to_string()],
            ..Default::default()
        };
        assert_eq!(find_catalog_items(&catalog, &root, &filter).unwrap(), vec![ok]);
    }

    #[test]
    fn test_find_catalog_items_rejects_bad_pointer() {
        let (_temp, catalog) = repo();
        let filter = ItemFilter {
            has: vec!["no-slash".to_string()],
            ..Default::default()
        };
        let err = find_catalog_items(&catalog, catalog.root(), &filter).unwrap_err();
        assert!(matches!(err, Error::Pointer { .. }));
    }
}
