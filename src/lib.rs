//! commitsmith - A CLI tool that writes commit messages for staged changes.
//!
//! # Overview
//!
//! commitsmith reads the staged diff, asks an OpenAI or Ollama model for a
//! commit message, scores the answer with heuristic quality rules, and asks
//! again until a message passes or the attempt budget runs out.

pub mod commit;
pub mod error;
pub mod git;
pub mod llm;

// Re-export commonly used types
pub use commit::{CommitCandidate, CommitGenerator, GenerateOptions, GenerationOutcome, assess};
pub use error::{ConsentError, GenerateError, ProviderError, RepositoryError};
pub use git::{Git2Backend, GitBackend};
pub use llm::{AiProvider, ProviderConfig, ProviderKind, build_provider};
