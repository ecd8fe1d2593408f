//! The generate / assess / retry loop and the optional commit step.

use std::io::IsTerminal;

use tracing::{debug, warn};

use crate::commit::diff;
use crate::commit::prompt::build_generation_request;
use crate::commit::quality::{self, CommitCandidate};
use crate::error::{ConsentError, GenerateError, ProviderError};
use crate::git::GitBackend;
use crate::llm::AiProvider;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Caller-supplied knobs for one generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Provider calls allowed per generation, at least 1.
    pub max_attempts: u32,
    /// Generate only; never touch the repository.
    pub dry_run: bool,
    /// No interactive prompts and no status output.
    pub quiet: bool,
    /// Amend a HEAD that already exists on a remote without asking.
    pub skip_remote_consent: bool,
    /// Amend HEAD instead of creating a new commit.
    pub amend: bool,
    /// Check provider credentials once the staged diff is known, before the
    /// first generation.
    pub validate_credentials: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            dry_run: false,
            quiet: false,
            skip_remote_consent: false,
            amend: false,
            validate_credentials: false,
        }
    }
}

/// Where a generator is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    CollectingDiff,
    Generating { attempt: u32 },
    Assessing { attempt: u32 },
    Retrying { attempt: u32 },
    Accepted,
    ExhaustedRetries,
}

/// Attempt accounting for a single generation call.
#[derive(Debug)]
struct RetryBudget {
    max_attempts: u32,
    attempts_used: u32,
    best_candidate: Option<CommitCandidate>,
}

impl RetryBudget {
    fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempts_used: 0,
            best_candidate: None,
        }
    }

    fn has_remaining(&self) -> bool {
        self.attempts_used < self.max_attempts
    }

    /// Count an attempt. Only a strictly higher score replaces the best.
    fn record(&mut self, candidate: CommitCandidate) {
        self.attempts_used += 1;
        let improves = self
            .best_candidate
            .as_ref()
            .is_none_or(|best| candidate.score > best.score);
        if improves {
            self.best_candidate = Some(candidate);
        }
    }

    fn into_outcome(self, exhausted: bool) -> Option<GenerationOutcome> {
        let attempts_used = self.attempts_used;
        self.best_candidate.map(|candidate| GenerationOutcome {
            candidate,
            attempts_used,
            exhausted,
        })
    }
}

/// Result of a completed generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub candidate: CommitCandidate,
    pub attempts_used: u32,
    /// The budget ran out and `candidate` is the best of what was produced.
    pub exhausted: bool,
}

/// What [`CommitGenerator::apply`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Dry run: the repository was left alone.
    Skipped,
    Committed { id: String },
    Amended { id: String },
}

/// Asks the user to confirm rewriting a published commit.
///
/// A prompt that cannot be answered counts as declined.
#[cfg_attr(test, mockall::automock)]
pub trait ConsentPrompt {
    fn confirm(&self, question: &str) -> bool;
}

/// [`ConsentPrompt`] on the controlling terminal.
pub struct TerminalConsent;

impl ConsentPrompt for TerminalConsent {
    fn confirm(&self, question: &str) -> bool {
        if !std::io::stdin().is_terminal() {
            debug!("stdin is not a terminal, not asking for amend consent");
            return false;
        }

        match dialoguer::Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
        {
            Ok(confirmed) => confirmed,
            Err(e) => {
                debug!("Amend consent prompt failed: {}", e);
                false
            }
        }
    }
}

pub struct CommitGenerator {
    provider: Box<dyn AiProvider>,
    git: Box<dyn GitBackend>,
    consent: Box<dyn ConsentPrompt>,
    options: GenerateOptions,
    state: GenerationState,
}

impl CommitGenerator {
    pub fn new(
        provider: Box<dyn AiProvider>,
        git: Box<dyn GitBackend>,
        options: GenerateOptions,
    ) -> Self {
        Self {
            provider,
            git,
            consent: Box::new(TerminalConsent),
            options,
            state: GenerationState::Idle,
        }
    }

    /// Replace the terminal confirmation prompt.
    pub fn with_consent(mut self, consent: Box<dyn ConsentPrompt>) -> Self {
        self.consent = consent;
        self
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn provider_name(&self) -> String {
        self.provider.name()
    }

    /// Generate a message for the staged changes.
    ///
    /// Returns the first well-formed message, or the best one produced once
    /// the attempt budget is spent. Low quality is never an error.
    pub async fn generate_for_staged(&mut self) -> Result<String, GenerateError> {
        self.run().await.map(|outcome| outcome.candidate.message)
    }

    /// Like [`generate_for_staged`](Self::generate_for_staged) but reports
    /// the score and attempt count too.
    pub async fn run(&mut self) -> Result<GenerationOutcome, GenerateError> {
        let result = self.run_cycle().await;
        if result.is_err() {
            self.transition(GenerationState::Idle);
        }
        result
    }

    async fn run_cycle(&mut self) -> Result<GenerationOutcome, GenerateError> {
        self.transition(GenerationState::CollectingDiff);
        let context = diff::collect(self.git.as_ref())?;

        if self.options.validate_credentials {
            self.provider.validate_api_key().await?;
        }

        let request = build_generation_request(&context);
        debug!(
            "Prompt: {} bytes, system prompt: {} bytes",
            request.prompt.len(),
            request.system_prompt.len()
        );

        let mut budget = RetryBudget::new(self.options.max_attempts);

        loop {
            let attempt = budget.attempts_used + 1;
            self.transition(GenerationState::Generating { attempt });

            // Provider failures end the call; only quality misses are retried.
            let message = self
                .provider
                .generate_commit_message(&request.prompt, &request.system_prompt)
                .await?;

            self.transition(GenerationState::Assessing { attempt });
            let candidate = quality::assess(&message);
            debug!(
                "Attempt {}/{} scored {} (well formed: {})",
                attempt, budget.max_attempts, candidate.score, candidate.is_well_formed
            );

            let accepted = candidate.is_well_formed;
            if let Some(reason) = &candidate.reason {
                debug!("Rejected: {}", reason);
            }
            budget.record(candidate);

            if accepted {
                self.transition(GenerationState::Accepted);
                return finish(budget, false).map_err(GenerateError::from);
            }

            if !budget.has_remaining() {
                self.transition(GenerationState::ExhaustedRetries);
                let outcome = finish(budget, true)?;
                warn!(
                    "No well-formed message after {} attempt(s); using best candidate (score {})",
                    outcome.attempts_used, outcome.candidate.score
                );
                return Ok(outcome);
            }

            self.transition(GenerationState::Retrying { attempt });
        }
    }

    /// Commit (or amend with) `message`, unless this is a dry run.
    ///
    /// Amending a HEAD that is reachable from a remote-tracking branch needs
    /// consent: `skip_remote_consent`, or a confirmation from the prompt.
    /// Quiet mode never prompts.
    pub fn apply(&self, message: &str) -> Result<ApplyResult, GenerateError> {
        if self.options.dry_run {
            debug!("Dry run, not committing");
            return Ok(ApplyResult::Skipped);
        }

        if self.options.amend {
            self.ensure_amend_consent()?;
            let id = self.git.commit(message, true)?;
            return Ok(ApplyResult::Amended { id });
        }

        let id = self.git.commit(message, false)?;
        Ok(ApplyResult::Committed { id })
    }

    fn ensure_amend_consent(&self) -> Result<(), GenerateError> {
        if !self.git.head_is_published()? {
            return Ok(());
        }

        if self.options.skip_remote_consent {
            debug!("HEAD is published; amending without confirmation");
            return Ok(());
        }

        if self.options.quiet {
            return Err(ConsentError::RemoteConsentRequired.into());
        }

        let confirmed = self
            .consent
            .confirm("HEAD has already been pushed to a remote. Amend it anyway?");
        if confirmed {
            Ok(())
        } else {
            Err(ConsentError::RemoteConsentRequired.into())
        }
    }

    fn transition(&mut self, next: GenerationState) {
        debug!("Generation state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn finish(budget: RetryBudget, exhausted: bool) -> Result<GenerationOutcome, ProviderError> {
    // At least one attempt is recorded before this is called.
    budget
        .into_outcome(exhausted)
        .ok_or(ProviderError::EmptyGeneration)
}
