//! Error types for commitsmith modules using thiserror.

use thiserror::Error;

/// Errors from reading or writing repository state.
///
/// Always terminal: nothing in the generation pipeline retries these.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Not a git repository! Run commitsmith from within a git working tree.")]
    NotAGitRepository,

    #[error("No staged changes found. Stage files with `git add` first.")]
    NoStagedChanges,

    #[error("Failed to read staged changes: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to inspect repository: {0}")]
    InspectFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Git config error (missing user.name or user.email): {0}")]
    ConfigError(#[source] git2::Error),

    #[error("Cannot amend: the repository has no commits yet")]
    NothingToAmend,
}

/// Errors from language-model providers.
///
/// `MissingApiKey` is raised while constructing a provider, before any
/// network traffic. Everything else is a runtime failure of a single
/// generation call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("OpenAI API key is required")]
    MissingApiKey,

    #[error("Invalid {provider} API key")]
    InvalidCredentials { provider: &'static str },

    #[error("Cannot connect to Ollama at {url}. Is it running? Start it with: ollama serve")]
    ConnectionRefused { url: String },

    #[error("Model '{model}' not found in Ollama. Pull it with: ollama pull {model}")]
    ModelNotFound { model: String },

    #[error("{provider} API error ({status}): {body}")]
    ProviderResponseError {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("No commit message generated")]
    EmptyGeneration,

    #[error("{provider} request timed out after {secs} seconds")]
    Timeout { provider: &'static str, secs: u64 },

    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ProviderError {
    /// Whether the error was raised while setting the provider up rather
    /// than while talking to it.
    pub fn is_construction(&self) -> bool {
        matches!(self, ProviderError::MissingApiKey)
    }
}

/// Errors from the remote consent gate.
#[derive(Error, Debug)]
pub enum ConsentError {
    #[error(
        "HEAD has already been pushed to a remote. Amending it rewrites shared history; \
         confirm interactively or pass --skip-remote-consent"
    )]
    RemoteConsentRequired,
}

/// Terminal failures of a generation run.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Consent(#[from] ConsentError),
}
