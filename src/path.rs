//! Path manipulation utilities for catalog-merge
//!
//! Every containment decision in the crate goes through [`is_within_root`]: a
//! plain string prefix test on lexically cleaned paths. It does not resolve
//! symlinks.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::defaults::DOCUMENT_EXTENSIONS;
use crate::error::{Error, Result};

/// Check whether `candidate` is `root` itself or lives below it.
///
/// The test is string-based: `candidate` must equal `root`, or start with
/// `root` followed by a path separator.
pub fn is_within_root(root: &Path, candidate: &Path) -> bool {
    let root = root.to_string_lossy();
    let candidate = candidate.to_string_lossy();

    if root == candidate {
        return true;
    }

    let sep = std::path::MAIN_SEPARATOR;
    if root.ends_with(sep) {
        candidate.starts_with(root.as_ref())
    } else {
        candidate.starts_with(&format!("{}{}", root, sep))
    }
}

/// Lexically clean a path: drop `.` segments and fold `..` into its parent.
///
/// Leading `..` segments of a relative path are kept. A `..` directly below
/// the filesystem root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Turn `path` into a cleaned absolute path, relative to the working directory.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::EmptyPath);
    }
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir()?;
    Ok(normalize(&cwd.join(path)))
}

/// Resolve the path of a directive found in `context_file`.
///
/// A leading `/` anchors the path at the repository root; anything else is
/// relative to the directory of `context_file`. The resolved path must stay
/// inside `root` in both cases.
pub fn resolve_include_path(root: &Path, include: &str, context_file: &Path) -> Result<PathBuf> {
    if include.is_empty() {
        return Err(Error::EmptyPath);
    }

    let joined = if let Some(stripped) = include.strip_prefix('/') {
        root.join(stripped.trim_start_matches('/'))
    } else {
        let dir = context_file.parent().unwrap_or(root);
        dir.join(include)
    };
    let resolved = normalize(&joined);

    if !is_within_root(root, &resolved) {
        return Err(Error::IncludeOutOfChroot {
            path: resolved,
            root: root.to_path_buf(),
        });
    }
    Ok(resolved)
}

/// Compute the meta companion of a document path.
///
/// `dev.yaml` maps to `dev.meta.yml` if that file exists, else to
/// `dev.meta.yaml` if that exists, else to `dev.meta.yaml` (same extension as
/// the input). The returned path is not required to exist.
pub fn meta_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::EmptyPath);
    }

    let mut base: OsString = path.with_extension("").into_os_string();
    base.push(".meta");

    for ext in ["yml", "yaml"] {
        let mut candidate = base.clone();
        candidate.push(".");
        candidate.push(ext);
        let candidate = PathBuf::from(candidate);
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    if let Some(ext) = path.extension() {
        base.push(".");
        base.push(ext);
    }
    Ok(PathBuf::from(base))
}

/// Check whether `path` follows the meta file naming rule (`name.meta.<ext>`).
pub fn is_meta_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    DOCUMENT_EXTENSIONS.iter().any(|ext| {
        name.strip_suffix(ext)
            .and_then(|rest| rest.strip_suffix('.'))
            .is_some_and(|stem| stem.ends_with(".meta"))
    })
}

/// Check whether `path` carries one of the document extensions.
pub fn has_document_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
}

/// Express `path` relative to `base`, climbing with `..` where needed.
///
/// Returns `None` when the two paths share no common prefix (for example, one
/// is relative and the other absolute).
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    let path = normalize(path);
    let base = normalize(base);
    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    if common == 0 && path.is_absolute() {
        return None;
    }

    let mut result = PathBuf::new();
    for _ in common..base_parts.len() {
        result.push("..");
    }
    for part in &path_parts[common..] {
        result.push(part.as_os_str());
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    Some(result)
}

/// Display `path` relative to `workdir` when that is shorter.
pub fn display_relative(path: &Path, workdir: &Path) -> String {
    match relative_to(path, workdir) {
        Some(rel) if rel.as_os_str().len() < path.as_os_str().len() => {
            rel.to_string_lossy().into_owned()
        }
        _ => path.to_string_lossy().into_owned(),
    }
}
