//! # Merge-List Resolver
//!
//! Computes the ordered list of files that make up a catalog item:
//!
//! 1. The ancestor common files, root-most first.
//! 2. For every file placed in the list, its meta companion and the targets
//!    of its directives, expanded depth-first. `#include` targets land before
//!    the file, `#merge` targets after it.
//! 3. The item itself.
//!
//! Every file may be expanded once per resolution. Reaching a file a second
//! time is an [`Error::IncludeLoop`], never a silent skip.
//!
//! A recursive directive that targets another catalog item splices in that
//! item's complete merge list, resolved on its own. The files that item
//! reaches itself count as visited for the including item too, so reaching
//! one of them again is a loop. Ancestors may be shared between the two
//! lists; the final list keeps the first occurrence of each path.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, error};

use crate::catalog::Catalog;
use crate::defaults::MAX_INCLUDE_DEPTH;
use crate::directive::{scan_file, Placement};
use crate::error::{Error, Result};
use crate::path::{absolutize, is_meta_path, meta_path, resolve_include_path};

/// One file contributing to a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Whether directives inside the file were expanded
    pub recursive: bool,
}

impl SourceRef {
    pub fn new(path: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            path: path.into(),
            recursive,
        }
    }
}

/// Ordered merge sources, earliest (lowest priority) first.
pub type MergeList = Vec<SourceRef>;

/// Files to place around the file that was expanded.
#[derive(Debug, Default)]
struct Expansion {
    before: Vec<SourceRef>,
    after: Vec<SourceRef>,
}

impl Expansion {
    /// Flatten around `own`, the entry of the expanded file itself.
    fn surround(self, own: SourceRef) -> Vec<SourceRef> {
        let mut list = self.before;
        list.push(own);
        list.extend(self.after);
        list
    }
}

/// Compute the merge list of `path`.
pub fn get_merge_list(catalog: &Catalog, path: &Path) -> Result<MergeList> {
    let path = absolutize(path)?;
    let mut resolver = Resolver {
        catalog,
        chain: Vec::new(),
    };

    let list = resolver.merge_list(&path, 0).inspect_err(|e| {
        error!("cannot resolve the merge list of {}: {}", path.display(), e);
    })?;
    Ok(dedup_first(list))
}

fn dedup_first(list: MergeList) -> MergeList {
    let mut seen = HashSet::new();
    list.into_iter()
        .filter(|source| seen.insert(source.path.clone()))
        .collect()
}

struct Resolver<'a> {
    catalog: &'a Catalog,
    /// Catalog items whose merge list is being computed, outermost first
    chain: Vec<PathBuf>,
}

impl Resolver<'_> {
    fn merge_list(&mut self, path: &Path, depth: usize) -> Result<MergeList> {
        self.item_list(path, depth).map(|(list, _)| list)
    }

    /// Resolve the merge list of the catalog item `path`, together with the
    /// files the item reaches on its own: itself, its meta companion and its
    /// directive targets. Files reached only through ancestors are left out.
    fn item_list(&mut self, path: &Path, depth: usize) -> Result<(MergeList, HashSet<PathBuf>)> {
        if self.chain.iter().any(|p| p == path) {
            error!("{} includes itself through {:?}", path.display(), self.chain);
            return Err(Error::IncludeLoop {
                path: path.to_path_buf(),
            });
        }
        self.chain.push(path.to_path_buf());

        let mut visited = HashSet::new();
        let mut own = None;
        let mut result: MergeList = Vec::new();
        let mut next = Some(path.to_path_buf());

        while let Some(current) = next {
            let expansion = self.expand(&current, &mut visited, true, depth)?;
            if own.is_none() {
                own = Some(visited.clone());
            }
            let mut chunk = expansion.surround(SourceRef::new(current.clone(), true));
            chunk.append(&mut result);
            result = chunk;

            next = self
                .catalog
                .next_common_file(&current)
                .filter(|candidate| *candidate != current);
            if let Some(ancestor) = &next {
                debug!("ancestor of {}: {}", current.display(), ancestor.display());
            }
        }

        self.chain.pop();
        Ok((result, own.unwrap_or_default()))
    }

    fn expand(
        &mut self,
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        process_directives: bool,
        depth: usize,
    ) -> Result<Expansion> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(Error::IncludeDepthExceeded {
                path: path.to_path_buf(),
                depth: MAX_INCLUDE_DEPTH,
            });
        }
        if !path.is_file() {
            error!("{} does not exist", path.display());
            return Err(Error::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !visited.insert(path.to_path_buf()) {
            error!("{} is included more than once", path.display());
            return Err(Error::IncludeLoop {
                path: path.to_path_buf(),
            });
        }

        let mut expansion = Expansion::default();

        if !is_meta_path(path) {
            let meta = meta_path(path)?;
            if meta.is_file() {
                debug!("meta file of {}: {}", path.display(), meta.display());
                let inner = self.expand(&meta, visited, process_directives, depth + 1)?;
                expansion.before = inner.surround(SourceRef::new(meta, true));
            }
        }

        if !process_directives {
            return Ok(expansion);
        }

        for directive in scan_file(path)? {
            let Some(placement) = directive.kind.placement() else {
                continue;
            };
            let target = resolve_include_path(self.catalog.root(), &directive.path, path)?;

            let chunk = if directive.recursive && self.catalog.is_catalog_item(&target) {
                debug!("{} splices the merge list of {}", path.display(), target.display());
                let (list, reached) = self.item_list(&target, depth + 1)?;
                for file in reached {
                    if !visited.insert(file.clone()) {
                        error!("{} is included more than once", file.display());
                        return Err(Error::IncludeLoop { path: file });
                    }
                }
                list
            } else {
                self.expand(&target, visited, directive.recursive, depth + 1)?
                    .surround(SourceRef::new(target, directive.recursive))
            };

            match placement {
                Placement::Before => expansion.before.extend(chunk),
                Placement::After => expansion.after.extend(chunk),
            }
        }

        Ok(expansion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Repo {
        _temp: TempDir,
        catalog: Catalog,
    }

    impl Repo {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            fs::create_dir(temp.path().join(".git")).unwrap();
            let catalog = Catalog::open(temp.path()).unwrap();
            Self {
                _temp: temp,
                catalog,
            }
        }

        fn write(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.catalog.root().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn list(&self, rel: &str) -> Result<Vec<String>> {
            let list = get_merge_list(&self.catalog, &self.catalog.root().join(rel))?;
            Ok(list
                .iter()
                .map(|s| {
                    s.path
                        .strip_prefix(self.catalog.root())
                        .unwrap()
                        .to_string_lossy()
                        .into_owned()
                })
                .collect())
        }
    }

    #[test]
    fn test_ancestors_come_first() {
        let repo = Repo::new();
        repo.write("common.yaml", "a: 1\n");
        repo.write("x/common.yaml", "a: 2\n");
        repo.write("x/item.yaml", "b: 2\n");

        assert_eq!(
            repo.list("x/item.yaml").unwrap(),
            vec!["common.yaml", "x/common.yaml", "x/item.yaml"]
        );
    }

    #[test]
    fn test_include_before_and_merge_after() {
        let repo = Repo::new();
        repo.write("x/other.yaml", "a: 1\n");
        repo.write("x/patch.yaml", "a: 3\n");
        repo.write("x/item.yaml", "#include other.yaml\n#merge patch.yaml\na: 2\n");

        assert_eq!(
            repo.list("x/item.yaml").unwrap(),
            vec!["x/other.yaml", "x/item.yaml", "x/patch.yaml"]
        );
    }

    #[test]
    fn test_ancestor_directives_precede_item() {
        let repo = Repo::new();
        repo.write("includes/base.yaml", "a: 0\n");
        repo.write("common.yaml", "#include /includes/base.yaml\n");
        repo.write("x/item.yaml", "b: 1\n");

        assert_eq!(
            repo.list("x/item.yaml").unwrap(),
            vec!["includes/base.yaml", "common.yaml", "x/item.yaml"]
        );
    }

    #[test]
    fn test_nested_includes_depth_first() {
        let repo = Repo::new();
        repo.write("includes/c.yaml", "c: 1\n");
        repo.write("includes/b.yaml", "#include c.yaml\n");
        repo.write("includes/d.yaml", "d: 1\n");
        repo.write("x/item.yaml", "#include /includes/b.yaml\n#include /includes/d.yaml\n");

        assert_eq!(
            repo.list("x/item.yaml").unwrap(),
            vec![
                "includes/c.yaml",
                "includes/b.yaml",
                "includes/d.yaml",
                "x/item.yaml"
            ]
        );
    }

    #[test]
    fn test_meta_file_precedes_owner() {
        let repo = Repo::new();
        repo.write("x/item.meta.yaml", "owner: ops\n");
        repo.write("x/item.yaml", "a: 1\n");

        assert_eq!(
            repo.list("x/item.yaml").unwrap(),
            vec!["x/item.meta.yaml", "x/item.yaml"]
        );
    }

    #[test]
    fn test_non_recursive_include_skips_nested_directives() {
        let repo = Repo::new();
        repo.write("includes/b.yaml", "#include c.yaml\nb: 1\n");
        repo.write("x/item.yaml", "#include recursive=false /includes/b.yaml\n");

        let list = get_merge_list(&repo.catalog, &repo.catalog.root().join("x/item.yaml")).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].path.ends_with("includes/b.yaml"));
        assert!(!list[0].recursive);
    }

    #[test]
    fn test_recursive_catalog_item_brings_its_ancestors() {
        let repo = Repo::new();
        repo.write("other/common.yaml", "o: 1\n");
        repo.write("other/base.yaml", "b: 1\n");
        repo.write("x/item.yaml", "#include /other/base.yaml\n");

        assert_eq!(
            repo.list("x/item.yaml").unwrap(),
            vec!["other/common.yaml", "other/base.yaml", "x/item.yaml"]
        );
    }

    #[test]
    fn test_recursive_false_catalog_item_skips_ancestors() {
        let repo = Repo::new();
        repo.write("other/common.yaml", "o: 1\n");
        repo.write("other/base.yaml", "b: 1\n");
        repo.write("x/item.yaml", "#include recursive=false /other/base.yaml\n");

        assert_eq!(
            repo.list("x/item.yaml").unwrap(),
            vec!["other/base.yaml", "x/item.yaml"]
        );
    }

    #[test]
    fn test_shared_ancestors_are_collapsed() {
        let repo = Repo::new();
        repo.write("common.yaml", "a: 1\n");
        repo.write("x/base.yaml", "b: 1\n");
        repo.write("x/item.yaml", "#include base.yaml\n");

        assert_eq!(
            repo.list("x/item.yaml").unwrap(),
            vec!["common.yaml", "x/base.yaml", "x/item.yaml"]
        );
    }

    #[test]
    fn test_include_loop_between_includes() {
        let repo = Repo::new();
        repo.write("includes/a.yaml", "#include b.yaml\n");
        repo.write("includes/b.yaml", "#include a.yaml\n");
        repo.write("x/item.yaml", "#include /includes/a.yaml\n");

        let err = repo.list("x/item.yaml").unwrap_err();
        assert!(matches!(err, Error::IncludeLoop { .. }));
    }

    #[test]
    fn test_include_loop_between_catalog_items() {
        let repo = Repo::new();
        repo.write("x/a.yaml", "#include b.yaml\n");
        repo.write("x/b.yaml", "#include a.yaml\n");

        let err = repo.list("x/a.yaml").unwrap_err();
        assert!(matches!(err, Error::IncludeLoop { .. }));
    }

    #[test]
    fn test_self_include_is_loop() {
        let repo = Repo::new();
        repo.write("includes/a.yaml", "#include a.yaml\n");
        repo.write("x/item.yaml", "#include /includes/a.yaml\n");

        let err = repo.list("x/item.yaml").unwrap_err();
        assert!(matches!(err, Error::IncludeLoop { .. }));
    }

    #[test]
    fn test_same_include_twice_is_loop() {
        let repo = Repo::new();
        repo.write("includes/a.yaml", "a: 1\n");
        repo.write("common.yaml", "#include /includes/a.yaml\n");
        repo.write("x/item.yaml", "#include /includes/a.yaml\n");

        let err = repo.list("x/item.yaml").unwrap_err();
        assert!(matches!(err, Error::IncludeLoop { .. }));
    }

    #[test]
    fn test_same_catalog_item_twice_is_loop() {
        let repo = Repo::new();
        repo.write("other/base.yaml", "b: 1\n");
        repo.write(
            "x/item.yaml",
            "#include /other/base.yaml\n#include /other/base.yaml\n",
        );

        let err = repo.list("x/item.yaml").unwrap_err();
        assert!(matches!(err, Error::IncludeLoop { path } if path.ends_with("other/base.yaml")));
    }

    #[test]
    fn test_spliced_item_reincluding_a_visited_file_is_loop() {
        let repo = Repo::new();
        repo.write("includes/a.yaml", "a: 1\n");
        repo.write("other/base.yaml", "#include /includes/a.yaml\n");
        repo.write(
            "x/item.yaml",
            "#include /includes/a.yaml\n#include /other/base.yaml\n",
        );

        let err = repo.list("x/item.yaml").unwrap_err();
        assert!(matches!(err, Error::IncludeLoop { path } if path.ends_with("includes/a.yaml")));
    }

    #[test]
    fn test_spliced_item_meta_counts_as_visited() {
        let repo = Repo::new();
        repo.write("other/base.meta.yaml", "owner: ops\n");
        repo.write("other/base.yaml", "b: 1\n");
        repo.write(
            "x/item.yaml",
            "#include /other/base.yaml\n#merge recursive=false /other/base.meta.yaml\n",
        );

        let err = repo.list("x/item.yaml").unwrap_err();
        assert!(matches!(err, Error::IncludeLoop { .. }));
    }

    #[test]
    fn test_out_of_chroot_include() {
        let repo = Repo::new();
        repo.write("x/item.yaml", "#include ../../outside.yaml\n");

        let err = repo.list("x/item.yaml").unwrap_err();
        assert!(matches!(err, Error::IncludeOutOfChroot { .. }));
    }

    #[test]
    fn test_missing_include() {
        let repo = Repo::new();
        repo.write("x/item.yaml", "#include missing.yaml\n");

        let err = repo.list("x/item.yaml").unwrap_err();
        assert!(matches!(err, Error::PathNotFound { .. }));
    }

    #[test]
    fn test_no_duplicates_in_result() {
        let repo = Repo::new();
        repo.write("common.yaml", "a: 1\n");
        repo.write("x/common.yaml", "a: 2\n");
        repo.write("x/one.yaml", "o: 1\n");
        repo.write("x/two.yaml", "#include one.yaml\n");
        repo.write("x/item.yaml", "#include two.yaml\n");

        let list = repo.list("x/item.yaml").unwrap();
        let unique: HashSet<&String> = list.iter().collect();
        assert_eq!(unique.len(), list.len());
        assert_eq!(list.last().map(String::as_str), Some("x/item.yaml"));
    }
}
