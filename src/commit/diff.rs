//! Staged diff collection.

use tracing::debug;

use crate::error::RepositoryError;
use crate::git::GitBackend;

/// The staged changes a commit message is generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffContext {
    pub staged_files: Vec<String>,
    pub diff_text: String,
}

/// Read the staged file list and staged diff from `git`.
///
/// Fails with [`RepositoryError::NotAGitRepository`] outside a working tree
/// and with [`RepositoryError::NoStagedChanges`] when nothing is staged. The
/// diff text is returned as git produced it, binary markers included.
pub fn collect(git: &dyn GitBackend) -> Result<DiffContext, RepositoryError> {
    if !git.is_inside_repository() {
        return Err(RepositoryError::NotAGitRepository);
    }

    let staged_files = git.staged_file_names()?;
    if staged_files.is_empty() {
        return Err(RepositoryError::NoStagedChanges);
    }

    let diff_text = git.staged_diff_text()?;

    debug!(
        "Collected {} staged file(s), {} chars of diff",
        staged_files.len(),
        diff_text.len()
    );

    Ok(DiffContext {
        staged_files,
        diff_text,
    })
}
