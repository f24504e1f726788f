//! # Error Suggestions
//!
//! Turns library errors into messages that say what went wrong and how to
//! fix it. Library code returns [`crate::error::Error`]; the command layer
//! passes it through one of these helpers before handing it to `anyhow`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use catalog_merge::suggestions;
//!
//! let output = merger.merge(&file).map_err(|e| suggestions::merge_failed(&file, e))?;
//! ```

use std::path::Path;

use crate::defaults::{CONFIG_FILENAME, MAX_INCLUDE_DEPTH, META_KEY};
use crate::error::Error;
use crate::merge::StrategyKind;

/// Error for a failed merge, with hints specific to the failure.
pub fn merge_failed(path: &Path, error: Error) -> anyhow::Error {
    let hints: Vec<String> = match &error {
        Error::UnknownStrategy { name } => {
            let mut hints = did_you_mean(name, &StrategyKind::names());
            hints.push(format!(
                "Valid strategies are: {}",
                StrategyKind::names().join(", ")
            ));
            hints
        }
        Error::IncludeLoop { .. } => vec![
            "Remove one of the #include or #merge directives to break the loop".to_string(),
            "Run with --debug to see every directive as it is resolved".to_string(),
        ],
        Error::IncludeOutOfChroot { .. } => vec![
            "Directive paths starting with '/' are relative to the repository root".to_string(),
            "Other paths are relative to the file holding the directive".to_string(),
        ],
        Error::IncludeDepthExceeded { .. } => vec![format!(
            "Directives may nest at most {} levels deep; look for a chain that never ends",
            MAX_INCLUDE_DEPTH
        )],
        Error::IncorrectMeta { .. } => vec![format!(
            "A meta file holds either only a '{}' key or no '{}' key at all",
            META_KEY, META_KEY
        )],
        Error::TypeMismatch { .. } => vec![
            "Every file must use the same kind of value (map, list or scalar) at a strategy path"
                .to_string(),
            "Use null in a later file to reset a value".to_string(),
        ],
        Error::Strategic { .. } => {
            vec!["List entries merged with strategic-merge are keyed by a string 'name'".to_string()]
        }
        Error::Config { .. } => vec![format!(
            "Check {} at the repository root and the files under .schemas/",
            CONFIG_FILENAME
        )],
        Error::RootNotFound { .. } => root_hints(),
        Error::GitCommand { .. } => {
            vec!["Use --no-git to skip the last-update lookup".to_string()]
        }
        _ => Vec::new(),
    };

    with_hints(format!("Failed to merge {}: {}", path.display(), error), &hints)
}

/// Error for a listing directory that is not a directory.
pub fn not_a_directory(dir: &Path) -> anyhow::Error {
    with_hints(
        format!("{} is not a directory", dir.display()),
        &["--dir takes the directory to list catalog items from".to_string()],
    )
}

/// Error for a catalog that could not be opened.
pub fn catalog_failed(path: &Path, error: Error) -> anyhow::Error {
    let hints = match &error {
        Error::RootNotFound { .. } | Error::PathNotFound { .. } => root_hints(),
        Error::UnknownStrategy { name } => did_you_mean(name, &StrategyKind::names()),
        _ => Vec::new(),
    };
    with_hints(
        format!("Cannot open catalog for {}: {}", path.display(), error),
        &hints,
    )
}

/// Error for a listing directory outside the repository.
pub fn dir_not_in_root(dir: &Path, root: &Path) -> anyhow::Error {
    with_hints(
        format!("{} is not inside {}", dir.display(), root.display()),
        &["Pass a --dir below the repository root, or change --root".to_string()],
    )
}

fn root_hints() -> Vec<String> {
    vec![
        "Run from inside a git repository".to_string(),
        "Use --root to point at the repository root".to_string(),
        "Set the CATALOG_MERGE_ROOT environment variable".to_string(),
    ]
}

fn did_you_mean(input: &str, candidates: &[&str]) -> Vec<String> {
    find_similar(input, candidates)
        .map(|s| vec![format!("Did you mean '{s}'?")])
        .unwrap_or_default()
}

fn with_hints(message: String, hints: &[String]) -> anyhow::Error {
    if hints.is_empty() {
        return anyhow::anyhow!(message);
    }
    let hints: Vec<String> = hints.iter().map(|h| format!("hint: {h}")).collect();
    anyhow::anyhow!("{message}\n\n{}", hints.join("\n"))
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        previous = current;
    }
    previous[b.len()]
}
