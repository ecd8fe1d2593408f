//! Prompt construction for AI-generated commit messages.

use crate::commit::diff::DiffContext;

/// Maximum bytes of diff text included in the prompt.
pub const MAX_PROMPT_DIFF_LENGTH: usize = 30_000;

/// Diffs with more changed files than this get a body request in the prompt.
const LARGE_DIFF_FILE_COUNT: usize = 3;

/// Style instructions sent as the system-role message.
pub const SYSTEM_PROMPT: &str = r#"You are an expert software engineer who writes clear, concise git commit messages.

Follow the Conventional Commits format:
  type(scope): summary

Rules:
- type is one of: feat, fix, chore, docs, refactor, test, perf, build, ci, style
- scope is optional and names the affected module, not a file name
- the summary uses the imperative mood ("add", "fix", "remove"), starts lowercase, has no trailing period, and stays under 72 characters
- for larger changes, add a blank line and a short body explaining why the change was made
- never use generic summaries such as "update", "fix", "changes" or "wip"

Respond with ONLY the commit message. No quotes, no markdown, no explanations."#;

/// The prompt pair sent to a provider for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_prompt: String,
}

/// Build the generation request for a staged diff.
///
/// Deterministic: the same context always yields the same request.
pub fn build_generation_request(context: &DiffContext) -> GenerationRequest {
    let files_section = context
        .staged_files
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");

    let (diff, truncated) = truncate_diff(&context.diff_text, MAX_PROMPT_DIFF_LENGTH);

    let truncation_note = if truncated {
        "\n\nNote: The diff was truncated due to size. Focus on the visible changes."
    } else {
        ""
    };

    let body_hint = if context.staged_files.len() > LARGE_DIFF_FILE_COUNT {
        "\n\nThis change touches several files: include a short body after the summary line."
    } else {
        ""
    };

    let prompt = format!(
        "Generate a commit message for the following staged changes.\n\n\
         ## Staged Files ({count})\n{files_section}\n\n\
         ## Diff\n```diff\n{diff}\n```{truncation_note}{body_hint}",
        count = context.staged_files.len(),
    );

    GenerationRequest {
        prompt,
        system_prompt: SYSTEM_PROMPT.to_string(),
    }
}

/// Cut `text` to at most `max_len` bytes on a char boundary.
fn truncate_diff(text: &str, max_len: usize) -> (&str, bool) {
    if text.len() <= max_len {
        return (text, false);
    }

    let mut end = max_len;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}
