//! commitsmith - CLI entry point.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commitsmith::commit::{ApplyResult, CommitGenerator, DEFAULT_MAX_ATTEMPTS, GenerateOptions};
use commitsmith::error::RepositoryError;
use commitsmith::git::{Git2Backend, GitBackend};
use commitsmith::llm::{ProviderConfig, ProviderKind, build_provider, provider_timeout, resolve_api_key};

/// Write a commit message for the staged changes using an AI provider.
#[derive(Parser, Debug)]
#[command(name = "commitsmith")]
#[command(about = "Write a commit message for the staged changes using OpenAI or Ollama")]
#[command(version)]
struct Cli {
    /// AI provider to use
    #[arg(short, long, value_enum, default_value_t = ProviderKind::OpenAi)]
    provider: ProviderKind,

    /// OpenAI API key (falls back to OPENAI_API_KEY)
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// Model name (defaults: gpt-3.5-turbo for OpenAI, llama3.2 for Ollama)
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long)]
    ollama_url: Option<String>,

    /// OpenAI-compatible API root
    #[arg(long)]
    openai_base_url: Option<String>,

    /// Print the message without committing
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// No status output and no interactive prompts
    #[arg(short, long)]
    quiet: bool,

    /// Amend a HEAD that is already on a remote without asking
    #[arg(long)]
    skip_remote_consent: bool,

    /// Amend the previous commit instead of creating a new one
    #[arg(long)]
    amend: bool,

    /// Generation attempts before settling for the best message
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: u32,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "commitsmith=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let git = Git2Backend::discover(&cwd);
    if !git.is_inside_repository() {
        return Err(RepositoryError::NotAGitRepository.into());
    }

    let config = ProviderConfig {
        kind: cli.provider,
        api_key: match cli.provider {
            ProviderKind::OpenAi => resolve_api_key(cli.api_key.as_deref()),
            ProviderKind::Ollama => None,
        },
        model: cli.model.clone(),
        ollama_url: cli.ollama_url.clone(),
        openai_base_url: cli.openai_base_url.clone(),
        timeout: provider_timeout(),
    };
    debug!("Provider config: {:?} model={:?}", config.kind, config.model);

    let provider = build_provider(&config)?;

    let options = GenerateOptions {
        max_attempts: cli.max_attempts,
        dry_run: cli.dry_run,
        quiet: cli.quiet,
        skip_remote_consent: cli.skip_remote_consent,
        amend: cli.amend,
        validate_credentials: config.kind == ProviderKind::OpenAi,
    };
    let mut generator = CommitGenerator::new(provider, Box::new(git), options);

    if !cli.quiet {
        eprintln!("Generating commit message with {}...", generator.provider_name());
    }

    let outcome = generator.run().await?;

    if outcome.exhausted && !cli.quiet {
        eprintln!(
            "Note: no message met the quality bar after {} attempt(s); using the best one (score {}/10).",
            outcome.attempts_used, outcome.candidate.score
        );
    }

    let message = outcome.candidate.message;

    match generator.apply(&message)? {
        ApplyResult::Skipped => println!("{}", message),
        ApplyResult::Committed { id } => {
            if !cli.quiet {
                eprintln!("Committed {}: {}", short_id(&id), summary_line(&message));
            }
        }
        ApplyResult::Amended { id } => {
            if !cli.quiet {
                eprintln!("Amended {}: {}", short_id(&id), summary_line(&message));
            }
        }
    }

    Ok(())
}

fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}

fn summary_line(message: &str) -> &str {
    message.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["commitsmith"]);
        assert_eq!(cli.provider, ProviderKind::OpenAi);
        assert_eq!(cli.max_attempts, 3);
        assert!(!cli.dry_run && !cli.amend && !cli.quiet);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "commitsmith",
            "--provider",
            "ollama",
            "--model",
            "mistral",
            "--ollama-url",
            "http://box:11434",
            "--dry-run",
            "--amend",
            "--skip-remote-consent",
            "--max-attempts",
            "5",
        ]);
        assert_eq!(cli.provider, ProviderKind::Ollama);
        assert_eq!(cli.model.as_deref(), Some("mistral"));
        assert!(cli.dry_run && cli.amend && cli.skip_remote_consent);
        assert_eq!(cli.max_attempts, 5);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(Cli::try_parse_from(["commitsmith", "--max-attempts", "0"]).is_err());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "0123456");
        assert_eq!(short_id("abc"), "abc");
    }
}
