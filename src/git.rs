//! Version-control lookups, done with the system `git` binary.
//!
//! Using the git command picks up whatever the user has configured
//! (safe directories, alternates, worktrees) without extra work.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};

const LOG_FORMAT: &str = "--pretty=format:%H%x00%an <%ae>%x00%cn <%ce>%x00%aI%x00%cI%x00%s";

/// The most recent change touching a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeInfo {
    pub author: String,
    pub committer: String,
    pub when_author: String,
    pub when_committer: String,
    pub hash: String,
    pub message: String,
}

/// Finds the last change of a file and the files related to it.
pub trait ChangeLookup {
    fn find_most_recent_change(&self, path: &Path, related: &[PathBuf]) -> Result<Option<ChangeInfo>>;
}

/// [`ChangeLookup`] backed by `git log`, run from the repository root.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn run(&self, args: &[&str], paths: &[&Path]) -> Result<String> {
        let mut command = Command::new("git");
        command.current_dir(&self.workdir).args(args);
        if !paths.is_empty() {
            command.arg("--").args(paths);
        }
        debug!("{:?}", command);

        let output = command.output().map_err(|e| Error::GitCommand {
            command: args.join(" "),
            stderr: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(Error::GitCommand {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ChangeLookup for GitCli {
    fn find_most_recent_change(&self, path: &Path, related: &[PathBuf]) -> Result<Option<ChangeInfo>> {
        if !is_repo(&self.workdir) {
            debug!("{} is not a git work tree", self.workdir.display());
            return Ok(None);
        }

        let mut paths: Vec<&Path> = vec![path];
        paths.extend(related.iter().map(PathBuf::as_path));

        let stdout = self.run(&["log", "--max-count=1", LOG_FORMAT], &paths)?;
        parse_change(&stdout)
    }
}

/// Whether `path` is inside a git work tree.
pub fn is_repo(path: &Path) -> bool {
    Command::new("git")
        .current_dir(path)
        .args(["rev-parse", "--is-inside-work-tree"])
        .output()
        .map(|output| output.status.success() && output.stdout.starts_with(b"true"))
        .unwrap_or(false)
}

/// Parse the NUL-separated output of the log command.
///
/// Empty output means no commit touched the files.
pub fn parse_change(output: &str) -> Result<Option<ChangeInfo>> {
    let output = output.trim_end_matches('\n');
    if output.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = output.split('\0').collect();
    let [hash, author, committer, when_author, when_committer, message] = fields.as_slice() else {
        return Err(Error::GitCommand {
            command: "log".to_string(),
            stderr: format!("unexpected output: {:?}", output),
        });
    };

    Ok(Some(ChangeInfo {
        author: author.to_string(),
        committer: committer.to_string(),
        when_author: to_utc(when_author)?,
        when_committer: to_utc(when_committer)?,
        hash: hash.to_string(),
        message: message.to_string(),
    }))
}

fn to_utc(timestamp: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(timestamp).map_err(|e| Error::GitCommand {
        command: "log".to_string(),
        stderr: format!("invalid date '{}': {}", timestamp, e),
    })?;
    Ok(parsed
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true))
}
