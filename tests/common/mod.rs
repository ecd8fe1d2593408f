//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use commitsmith::error::ProviderError;
use commitsmith::git::Git2Backend;
use commitsmith::llm::AiProvider;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a committer identity configured.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write `content` to `name` and add it to the index.
    pub fn stage(&self, name: &str, content: &str) {
        let file_path = self.dir.path().join(name);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");

        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is staged with the given message. Returns the commit OID.
    pub fn commit_staged(&self, message: &str) -> Oid {
        let sig = self.signature();

        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Stage a change to `test.txt` and commit it. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let content = format!(
            "{}\n{}",
            message,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        );
        self.stage("test.txt", &content);
        self.commit_staged(message)
    }

    /// Point `refs/remotes/origin/<branch>` at `oid`, as a push would.
    pub fn publish(&self, branch: &str, oid: Oid) {
        self.repo
            .reference(
                &format!("refs/remotes/origin/{}", branch),
                oid,
                true,
                "test push",
            )
            .expect("Failed to create remote-tracking ref");
    }

    /// A backend discovered from the repository directory.
    pub fn backend(&self) -> Git2Backend {
        Git2Backend::discover(self.dir.path())
    }

    pub fn head_message(&self) -> String {
        self.repo
            .head()
            .expect("Failed to read HEAD")
            .peel_to_commit()
            .expect("HEAD is not a commit")
            .message()
            .unwrap_or("")
            .to_string()
    }

    pub fn commit_count(&self) -> usize {
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        if walk.push_head().is_err() {
            return 0;
        }
        walk.count()
    }
}

/// Provider that replays canned responses and records every request.
pub struct ScriptedProvider {
    responses: Vec<Result<String, &'static str>>,
    calls: AtomicU32,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|r| Ok(r.to_string())).collect(),
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails with an HTTP 500 error.
    pub fn failing(body: &'static str) -> Self {
        Self {
            responses: vec![Err(body)],
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    async fn generate_commit_message(
        &self,
        prompt: &str,
        system_prompt: &str,
    ) -> Result<String, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        self.requests
            .lock()
            .unwrap()
            .push((prompt.to_string(), system_prompt.to_string()));

        match &self.responses[n.min(self.responses.len() - 1)] {
            Ok(message) => Ok(message.clone()),
            Err(body) => Err(ProviderError::ProviderResponseError {
                provider: "Scripted",
                status: 500,
                body: body.to_string(),
            }),
        }
    }

    fn name(&self) -> String {
        "Scripted (test)".to_string()
    }
}

/// Handle that lets a test keep inspecting a provider the generator owns.
pub struct Shared(pub std::sync::Arc<ScriptedProvider>);

#[async_trait]
impl AiProvider for Shared {
    async fn generate_commit_message(
        &self,
        prompt: &str,
        system_prompt: &str,
    ) -> Result<String, ProviderError> {
        self.0.generate_commit_message(prompt, system_prompt).await
    }

    fn name(&self) -> String {
        self.0.name()
    }
}
