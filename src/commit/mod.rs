//! Commit message generation for staged changes.
//!
//! The pipeline is collect ([`diff`]), prompt ([`prompt`]), generate and
//! score ([`quality`]) in a retry loop driven by [`CommitGenerator`].

pub mod diff;
pub mod generator;
pub mod prompt;
pub mod quality;

pub use diff::{DiffContext, collect};
pub use generator::{
    ApplyResult, CommitGenerator, ConsentPrompt, DEFAULT_MAX_ATTEMPTS, GenerateOptions,
    GenerationOutcome, GenerationState, TerminalConsent,
};
pub use prompt::{GenerationRequest, SYSTEM_PROMPT, build_generation_request};
pub use quality::{ACCEPTANCE_THRESHOLD, CommitCandidate, CommitType, assess};
