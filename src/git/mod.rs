//! Git operations using git2-rs.

pub mod backend;

pub use backend::{Git2Backend, GitBackend};

#[cfg(test)]
pub use backend::MockGitBackend;
