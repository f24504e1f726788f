//! Directive parser.
//!
//! Documents pull other files into their merge list through comment lines:
//!
//! ```text
//! #include other.yaml
//! #include recursive=false /includes/base.yaml
//! #merge "path with spaces/patch.yaml"
//! ```
//!
//! `#include` targets are placed before the file holding the directive,
//! `#merge` targets after it. `recursive` defaults to `true`.
//!
//! `#insert` lines share the same grammar but have no place in a merge list;
//! [`scan_file`] reports and drops them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use crate::error::Result;

/// Directive keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Include,
    Merge,
    Insert,
}

/// Where a directive's target lands relative to the file that names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before,
    After,
}

impl DirectiveKind {
    /// The placement this keyword implies, if it contributes to a merge list.
    pub fn placement(self) -> Option<Placement> {
        match self {
            DirectiveKind::Include => Some(Placement::Before),
            DirectiveKind::Merge => Some(Placement::After),
            DirectiveKind::Insert => None,
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "include" => Some(DirectiveKind::Include),
            "merge" => Some(DirectiveKind::Merge),
            "insert" => Some(DirectiveKind::Insert),
            _ => None,
        }
    }
}

/// One directive line, with its path still unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub path: String,
    pub recursive: bool,
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^[ \t]*#(include|merge|insert)(?:[ \t]+recursive=(true|false))?[ \t]+(?:"(.*?[^\\])"|([^ \t"]+))[ \t]*$"#,
        )
        .expect("directive regex is valid")
    })
}

/// Parse a single line. Returns `None` for anything that is not a directive.
pub fn parse_line(line: &str) -> Option<Directive> {
    let caps = directive_regex().captures(line)?;

    let kind = DirectiveKind::from_keyword(caps.get(1)?.as_str())?;
    let recursive = caps.get(2).map(|m| m.as_str() == "true").unwrap_or(true);
    let path = caps.get(3).or_else(|| caps.get(4))?.as_str().to_string();

    Some(Directive {
        kind,
        path,
        recursive,
    })
}

/// Scan a file for directives, in textual order.
pub fn scan_file(path: &Path) -> Result<Vec<Directive>> {
    let reader = BufReader::new(File::open(path)?);
    let mut directives = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let Some(directive) = parse_line(&line) else {
            continue;
        };
        if directive.kind.placement().is_none() {
            warn!(
                "{}: #insert directives are not supported, ignoring '{}'",
                path.display(),
                directive.path
            );
            continue;
        }
        debug!(
            "{}: {:?} {} (recursive={})",
            path.display(),
            directive.kind,
            directive.path,
            directive.recursive
        );
        directives.push(directive);
    }
    Ok(directives)
}
