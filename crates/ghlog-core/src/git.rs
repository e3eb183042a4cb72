//! Local git queries used to fill in changelog input.
//!
//! Shells out to `git` so the user's own configuration (credentials,
//! `safe.directory`, worktrees) applies unchanged.

use std::process::Command;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::error::CompileError;
use crate::input::parse_tag;
use crate::model::Tag;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to execute the `git` command.
    #[error("failed to run git: {0}")]
    Exec(#[from] std::io::Error),

    /// `git` returned a non-zero exit code.
    #[error("git {command} failed: {stderr}")]
    Command {
        /// The git subcommand that failed (e.g., "for-each-ref").
        command: String,
        /// Captured stderr.
        stderr: String,
    },

    /// Not inside a git repository.
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,

    /// A tag's creation date could not be read.
    #[error(transparent)]
    Tag(#[from] CompileError),
}

/// Result alias for git operations.
pub type GitResult<T> = Result<T, GitError>;

const TAG_FORMAT: &str = "--format=%(refname:short)%09%(creatordate:iso-strict)";

/// Whether a `git` executable is on `PATH`.
pub fn git_available() -> bool {
    which::which("git").is_ok()
}

/// List the repository's tags with their creation dates.
///
/// Annotated tags report the tagger date, lightweight tags the date of the
/// commit they point at.
#[instrument]
pub fn list_tags() -> GitResult<Vec<Tag>> {
    let output = git(&["for-each-ref", "refs/tags", TAG_FORMAT])?;
    let mut tags = Vec::new();
    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        match parse_tag_line(line) {
            Some(result) => tags.push(result?),
            None => warn!(%line, "skipping unreadable tag line"),
        }
    }
    debug!(count = tags.len(), "listed tags");
    Ok(tags)
}

/// Parse one `name<TAB>date` line from `for-each-ref`.
///
/// Returns `None` when the line has no tab separator.
fn parse_tag_line(line: &str) -> Option<Result<Tag, CompileError>> {
    let (name, date) = line.split_once('\t')?;
    Some(parse_tag(name.trim(), date))
}

/// Get the remote URL for a named remote.
#[instrument]
pub fn remote_url(remote: &str) -> GitResult<Option<String>> {
    let result = git(&["remote", "get-url", remote]);
    match result {
        Ok(url) => {
            let url = url.trim().to_string();
            debug!(%remote, %url, "remote URL");
            Ok(Some(url))
        }
        Err(GitError::Command { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Split a remote URL into host and repository path.
///
/// Accepts `scheme://[user@]host[:port]/path` and the scp-like
/// `[user@]host:path`.
fn split_remote(url: &str) -> Option<(&str, &str)> {
    let (authority, path) = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/')?,
        None => url.split_once(':')?,
    };
    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = host.split_once(':').map_or(host, |(host, _)| host);
    if host.is_empty() {
        return None;
    }
    Some((host, path))
}

/// Parse owner and repo from a git remote URL.
///
/// Handles both HTTPS and SSH formats:
/// - `https://github.com/owner/repo.git`
/// - `git@github.com:owner/repo.git`
///
/// Returns `None` if the URL cannot be parsed.
pub fn parse_owner_repo(url: &str) -> Option<(String, String)> {
    let (_, path) = split_remote(url)?;
    let path = path.strip_suffix(".git").unwrap_or(path);
    let (owner, repo) = path.split_once('/')?;

    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}

/// The `https://github.com/{owner}/{repo}` page for a remote URL.
///
/// `None` for remotes hosted anywhere other than github.com.
pub fn repo_web_url(remote: &str) -> Option<String> {
    let (host, _) = split_remote(remote)?;
    let on_github = ["github.com", "www.github.com"]
        .iter()
        .any(|known| host.eq_ignore_ascii_case(known));
    if !on_github {
        debug!(%host, "remote is not on github.com");
        return None;
    }
    parse_owner_repo(remote).map(|(owner, repo)| format!("https://github.com/{owner}/{repo}"))
}

/// Check if we're inside a git repository.
#[instrument]
pub fn is_inside_repo() -> GitResult<bool> {
    let result = git(&["rev-parse", "--is-inside-work-tree"]);
    match result {
        Ok(output) => Ok(output.trim() == "true"),
        Err(GitError::Command { .. } | GitError::NotARepo) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Run a git command and return its stdout.
fn git(args: &[&str]) -> GitResult<String> {
    let output = Command::new("git").args(args).output()?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if stderr.contains("not a git repository") {
            return Err(GitError::NotARepo);
        }

        Err(GitError::Command {
            command: args.first().unwrap_or(&"").to_string(),
            stderr,
        })
    }
}
