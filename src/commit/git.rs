//! Reading the staged diff and committing the index with git2.

use std::path::Path;

use git2::{DiffFormat, ErrorCode, Oid, Repository, Tree};
use tracing::{debug, warn};

use crate::error::CommitError;

/// Maximum characters of diff text sent to a backend.
const MAX_DIFF_LENGTH: usize = 30_000;

/// Open the repository containing `path`.
pub fn open_repository(path: &Path) -> Result<Repository, CommitError> {
    Repository::discover(path).map_err(CommitError::OpenFailed)
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits yet.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, CommitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(CommitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(CommitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Unified patch of the index against HEAD, like `git diff --staged`.
///
/// Empty when nothing is staged. Text beyond 30k characters is cut off.
pub fn staged_diff(repo: &Repository) -> Result<String, CommitError> {
    let head_tree = resolve_head_tree(repo)?;
    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(CommitError::DiffFailed)?;

    let mut text = String::new();
    let mut truncated = false;

    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if truncated {
            return true;
        }

        let content = String::from_utf8_lossy(line.content());
        if text.len() + content.len() + 1 > MAX_DIFF_LENGTH {
            truncated = true;
            return true;
        }

        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&content);
        true
    })
    .map_err(CommitError::DiffFailed)?;

    if truncated {
        warn!("Staged diff exceeds {} chars, truncating", MAX_DIFF_LENGTH);
    }
    debug!("Staged diff: {} files, {} chars", diff.deltas().len(), text.len());
    Ok(text)
}

/// Commit the current index on HEAD with `message`.
///
/// Works on an unborn branch, producing a root commit.
pub fn commit_staged(repo: &Repository, message: &str) -> Result<Oid, CommitError> {
    let mut index = repo.index().map_err(CommitError::CommitFailed)?;
    let tree_id = index.write_tree().map_err(CommitError::CommitFailed)?;
    let tree = repo.find_tree(tree_id).map_err(CommitError::CommitFailed)?;

    let sig = repo.signature().map_err(CommitError::ConfigError)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(CommitError::CommitFailed)?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(CommitError::CommitFailed(e)),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(CommitError::CommitFailed)
}
