//! Git access behind a mockable trait.
//!
//! The generation pipeline only needs a handful of repository operations, so
//! they are collected in [`GitBackend`]. [`Git2Backend`] implements them with
//! git2-rs against a discovered repository.

use std::path::Path;

use git2::{Commit, Delta, Diff, DiffFormat, ErrorCode, Repository, Tree};
use tracing::debug;

use crate::error::RepositoryError;

/// Repository operations used by the generator.
#[cfg_attr(test, mockall::automock)]
pub trait GitBackend {
    /// Whether the backend points at a non-bare git working tree.
    fn is_inside_repository(&self) -> bool;

    /// Paths staged for the next commit, in index order.
    fn staged_file_names(&self) -> Result<Vec<String>, RepositoryError>;

    /// Unified diff of the index against HEAD.
    fn staged_diff_text(&self) -> Result<String, RepositoryError>;

    /// Whether HEAD is reachable from any remote-tracking branch.
    fn head_is_published(&self) -> Result<bool, RepositoryError>;

    /// Commit the index with `message`, or amend HEAD when `amend` is set.
    /// Returns the new commit id.
    fn commit(&self, message: &str, amend: bool) -> Result<String, RepositoryError>;
}

/// [`GitBackend`] over git2-rs.
pub struct Git2Backend {
    repo: Option<Repository>,
}

impl Git2Backend {
    /// Discover the repository containing `path`.
    ///
    /// A path outside any repository is not an error here; the backend just
    /// reports `is_inside_repository() == false` and every other call fails
    /// with [`RepositoryError::NotAGitRepository`].
    pub fn discover(path: impl AsRef<Path>) -> Self {
        let repo = Repository::discover(path.as_ref()).ok();
        if repo.is_none() {
            debug!("No git repository found at {}", path.as_ref().display());
        }
        Self { repo }
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self { repo: Some(repo) }
    }

    fn repo(&self) -> Result<&Repository, RepositoryError> {
        match &self.repo {
            Some(repo) if !repo.is_bare() => Ok(repo),
            _ => Err(RepositoryError::NotAGitRepository),
        }
    }

    fn staged_diff(&self) -> Result<Diff<'_>, RepositoryError> {
        let repo = self.repo()?;
        let head_tree = resolve_head_tree(repo)?;
        let index = fresh_index(repo).map_err(RepositoryError::DiffFailed)?;
        repo.diff_tree_to_index(head_tree.as_ref(), Some(&index), None)
            .map_err(RepositoryError::DiffFailed)
    }
}

impl GitBackend for Git2Backend {
    fn is_inside_repository(&self) -> bool {
        self.repo().is_ok()
    }

    fn staged_file_names(&self) -> Result<Vec<String>, RepositoryError> {
        let diff = self.staged_diff()?;
        let mut files = Vec::new();

        for delta in diff.deltas() {
            let path = match delta.status() {
                Delta::Deleted => delta.old_file().path(),
                _ => delta.new_file().path().or_else(|| delta.old_file().path()),
            };
            if let Some(path) = path {
                files.push(path.to_string_lossy().to_string());
            }
        }

        Ok(files)
    }

    fn staged_diff_text(&self) -> Result<String, RepositoryError> {
        let diff = self.staged_diff()?;
        let mut text = String::new();

        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let origin = line.origin();
            if origin == '+' || origin == '-' || origin == ' ' {
                text.push(origin);
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })
        .map_err(RepositoryError::DiffFailed)?;

        Ok(text)
    }

    fn head_is_published(&self) -> Result<bool, RepositoryError> {
        let repo = self.repo()?;

        let head = match repo.head() {
            Ok(head) => head
                .peel_to_commit()
                .map_err(RepositoryError::InspectFailed)?
                .id(),
            Err(e) if is_unborn(&e) => return Ok(false),
            Err(e) => return Err(RepositoryError::InspectFailed(e)),
        };

        let references = repo
            .references_glob("refs/remotes/*")
            .map_err(RepositoryError::InspectFailed)?;

        for reference in references {
            let reference = reference.map_err(RepositoryError::InspectFailed)?;
            // Symbolic refs like refs/remotes/origin/HEAD resolve to a branch
            // that is visited on its own.
            let Some(tip) = reference.target() else {
                continue;
            };

            if tip == head
                || repo
                    .graph_descendant_of(tip, head)
                    .map_err(RepositoryError::InspectFailed)?
            {
                debug!(
                    "HEAD {} is reachable from {}",
                    head,
                    reference.name().unwrap_or("<non-utf8 ref>")
                );
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn commit(&self, message: &str, amend: bool) -> Result<String, RepositoryError> {
        let repo = self.repo()?;

        let mut index = fresh_index(repo).map_err(RepositoryError::CommitFailed)?;
        let tree_id = index.write_tree().map_err(RepositoryError::CommitFailed)?;
        let tree = repo
            .find_tree(tree_id)
            .map_err(RepositoryError::CommitFailed)?;

        let oid = if amend {
            let head = head_commit(repo)?.ok_or(RepositoryError::NothingToAmend)?;
            head.amend(Some("HEAD"), None, None, None, Some(message), Some(&tree))
                .map_err(RepositoryError::CommitFailed)?
        } else {
            let sig = repo.signature().map_err(RepositoryError::ConfigError)?;
            let parents: Vec<Commit<'_>> = head_commit(repo)?.into_iter().collect();
            let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();

            repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
                .map_err(RepositoryError::CommitFailed)?
        };

        Ok(oid.to_string())
    }
}

/// The repository index, re-read from disk so `git add` runs made by other
/// processes are visible.
fn fresh_index(repo: &Repository) -> Result<git2::Index, git2::Error> {
    let mut index = repo.index()?;
    index.read(false)?;
    Ok(index)
}

fn is_unborn(e: &git2::Error) -> bool {
    e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound
}

/// Resolve the HEAD tree, treating an unborn branch as an empty tree.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, RepositoryError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if is_unborn(&e) => return Ok(None),
        Err(e) => return Err(RepositoryError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(RepositoryError::DiffFailed)?;
    Ok(Some(tree))
}

/// The HEAD commit, or `None` for a repository without commits.
fn head_commit(repo: &Repository) -> Result<Option<Commit<'_>>, RepositoryError> {
    match repo.head() {
        Ok(head) => head
            .peel_to_commit()
            .map(Some)
            .map_err(RepositoryError::CommitFailed),
        Err(e) if is_unborn(&e) => Ok(None),
        Err(e) => Err(RepositoryError::CommitFailed(e)),
    }
}
