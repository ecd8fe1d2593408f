//! Heuristic commit message scoring.
//!
//! [`assess`] is pure: it looks only at the message text and always returns
//! the same [`CommitCandidate`] for the same input.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Minimum score for a message to be accepted.
pub const ACCEPTANCE_THRESHOLD: u8 = 7;

const MAX_SCORE: i32 = 10;
const BASELINE_SCORE: i32 = 5;

/// Descriptions shorter than this carry too little information.
const MIN_DESCRIPTION_LENGTH: usize = 10;

/// Descriptions at least this long earn a bonus.
const DESCRIPTIVE_LENGTH: usize = 20;

/// Conventional limit for the summary line.
const MAX_SUMMARY_LENGTH: usize = 72;

/// Whole messages that say nothing about the change. Compared lowercase with
/// trailing punctuation removed.
const GENERIC_MESSAGES: &[&str] = &[
    "update",
    "updates",
    "updated",
    "update code",
    "update files",
    "fix",
    "fixes",
    "fixed",
    "fix bug",
    "fixed bug",
    "fixed bugs",
    "bug fix",
    "bugfix",
    "wip",
    "change",
    "changes",
    "changed",
    "code changes",
    "minor changes",
    "small changes",
    "some changes",
    "more changes",
    "misc",
    "stuff",
    "cleanup",
    "clean up",
    "tweak",
    "tweaks",
    "refactor",
    "refactoring",
    "improvements",
    "commit",
    "save",
    "temp",
    "test",
    "testing",
    "asdf",
];

/// Verbs that only restate a file when followed by nothing but a file name.
const FILLER_VERBS: &[&str] = &[
    "update", "updated", "updates", "change", "changed", "edit", "edited", "modify", "modified",
    "fix", "fixed", "tweak",
];

/// Imperative verbs accepted as a summary lead.
const IMPERATIVE_VERBS: &[&str] = &[
    "add", "adjust", "allow", "avoid", "bump", "cache", "change", "clarify", "clean", "configure",
    "convert", "correct", "create", "deprecate", "delete", "disable", "document", "drop", "embed",
    "enable", "ensure", "expose", "extract", "fix", "format", "guard", "handle", "hide",
    "implement", "improve", "include", "increase", "initialize", "inline", "introduce", "keep",
    "limit", "load", "log", "make", "merge", "migrate", "move", "optimize", "parse", "pass",
    "prevent", "reduce", "refactor", "reject", "release", "remove", "rename", "reorder",
    "replace", "report", "require", "reset", "restore", "retry", "return", "revert", "rewrite",
    "run", "seed", "set", "show", "simplify", "skip", "sort", "speed", "split", "stop", "store",
    "support", "switch", "test", "track", "trim", "update", "upgrade", "use", "validate",
    "verify", "wire", "wrap",
];

static CONVENTIONAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)(?:\(([^)]+)\))?(!)?: (.+)$").expect("conventional prefix pattern is valid")
});

static FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w\-./]*\.[A-Za-z0-9]+$").expect("file name pattern is valid")
});

/// Conventional commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Revert,
}

impl std::str::FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feat" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "docs" => Ok(Self::Docs),
            "style" => Ok(Self::Style),
            "refactor" => Ok(Self::Refactor),
            "perf" => Ok(Self::Perf),
            "test" => Ok(Self::Test),
            "build" => Ok(Self::Build),
            "ci" => Ok(Self::Ci),
            "chore" => Ok(Self::Chore),
            "revert" => Ok(Self::Revert),
            _ => Err(format!("Unknown commit type: {}", s)),
        }
    }
}

/// A scored commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCandidate {
    pub message: String,
    /// 0..=10.
    pub score: u8,
    pub is_well_formed: bool,
    /// Why the message fell short. Always set for a generic message.
    pub reason: Option<String>,
}

/// Score a commit message against the heuristic rules.
pub fn assess(message: &str) -> CommitCandidate {
    let trimmed = message.trim();

    let first_line = trimmed.lines().next().unwrap_or("");
    let conventional = CONVENTIONAL_PREFIX
        .captures(first_line)
        .filter(|caps| caps[1].parse::<CommitType>().is_ok());

    if conventional.is_none() && is_generic(trimmed) {
        return CommitCandidate {
            message: message.to_string(),
            score: 1,
            is_well_formed: false,
            reason: Some(format!(
                "Commit message \"{trimmed}\" is too generic: describe what changed and why"
            )),
        };
    }

    let mut score = BASELINE_SCORE;
    let mut issues: Vec<&'static str> = Vec::new();

    let summary = trimmed.lines().next().unwrap_or("").trim();
    let description = match &conventional {
        Some(caps) => {
            score += 3;
            caps.get(4).map_or("", |m| m.as_str()).trim()
        }
        None => {
            issues.push("missing a conventional commit prefix such as \"feat: \"");
            summary
        }
    };

    let description_length = description.chars().count();
    if description_length < MIN_DESCRIPTION_LENGTH {
        score -= 2;
        issues.push("summary is too short");
    } else if description_length >= DESCRIPTIVE_LENGTH {
        score += 1;
    }

    if is_file_restatement(description) {
        score -= 3;
        issues.push("summary only restates a file name");
    }

    if summary.chars().count() > MAX_SUMMARY_LENGTH {
        score -= 1;
        issues.push("summary line is longer than 72 characters");
    }

    match lead_word(description) {
        Some(word) if IMPERATIVE_VERBS.contains(&word.as_str()) => score += 1,
        Some(word) if word.len() > 4 && (word.ends_with("ed") || word.ends_with("ing")) => {
            score -= 1;
            issues.push("summary does not start with an imperative verb");
        }
        _ => {}
    }

    if trimmed.lines().skip(1).any(|line| !line.trim().is_empty()) {
        score += 1;
    }

    let mut score = score.clamp(0, MAX_SCORE) as u8;
    if conventional.is_some() {
        // A recognised prefix is enough on its own; the other rules only
        // rank conventional messages against each other.
        score = score.max(ACCEPTANCE_THRESHOLD);
    }

    let is_well_formed = score >= ACCEPTANCE_THRESHOLD;
    let reason = (!is_well_formed).then(|| issues.join("; "));

    CommitCandidate {
        message: message.to_string(),
        score,
        is_well_formed,
        reason,
    }
}

fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(['.', '!', '?', ',', ';', ':'])
        .trim()
        .to_lowercase()
}

fn is_generic(message: &str) -> bool {
    let normalized = normalize(message);
    GENERIC_MESSAGES.contains(&normalized.as_str())
}

fn is_file_name(word: &str) -> bool {
    FILE_NAME.is_match(word)
}

fn is_file_restatement(description: &str) -> bool {
    let words: Vec<&str> = description.split_whitespace().collect();
    match words.as_slice() {
        [file] => is_file_name(file),
        [verb, file] => FILLER_VERBS.contains(&normalize(verb).as_str()) && is_file_name(file),
        _ => false,
    }
}

fn lead_word(description: &str) -> Option<String> {
    description
        .split_whitespace()
        .next()
        .map(normalize)
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_commit_scores_high() {
        let result = assess("feat: add new feature");
        assert!(result.score >= 7);
        assert!(result.is_well_formed);
        assert!(result.reason.is_none());
    }

    #[test]
    fn test_all_listed_types_are_accepted() {
        for ty in ["feat", "fix", "chore", "docs", "refactor", "test", "perf"] {
            let plain = assess(&format!("{ty}: handle empty input in parser"));
            assert!(plain.is_well_formed, "{ty} should be well formed");

            let scoped = assess(&format!("{ty}(core): x"));
            assert!(scoped.is_well_formed, "{ty}(core) should be well formed");
            assert!(scoped.score >= ACCEPTANCE_THRESHOLD);
        }
    }

    #[test]
    fn test_conventional_floor_survives_penalties() {
        // Short, file-name-only description still clears the threshold.
        let result = assess("docs: README.md");
        assert_eq!(result.score, ACCEPTANCE_THRESHOLD);
        assert!(result.is_well_formed);
    }

    #[test]
    fn test_surrounding_whitespace_keeps_prefix() {
        for msg in ["\nfeat: add login flow", " feat: add login flow", "feat: add login flow\n\n"] {
            let result = assess(msg);
            assert!(result.is_well_formed, "{msg:?} scored {}", result.score);
            assert_eq!(result.score, 9);
        }
    }

    #[test]
    fn test_unknown_type_is_not_conventional() {
        let result = assess("feature: add login");
        assert!(!result.is_well_formed);
        assert!(result.reason.unwrap().contains("conventional"));
    }

    #[test]
    fn test_uppercase_type_is_not_conventional() {
        let result = assess("FEAT: add login");
        assert!(result.score < ACCEPTANCE_THRESHOLD);
    }

    #[test]
    fn test_poorly_formed_commit_scores_low() {
        let result = assess("fixed bug");
        assert!(result.score < 7);
        assert!(!result.is_well_formed);
    }

    #[test]
    fn test_generic_messages_are_rejected() {
        for msg in ["update", "UPDATE", "Fix", "wip", "WIP", "changes", "Fixed bug", "update."] {
            let result = assess(msg);
            assert!(!result.is_well_formed, "{msg} should be rejected");
            let reason = result.reason.expect("generic messages carry a reason");
            assert!(reason.contains("too generic"), "reason for {msg}: {reason}");
        }
    }

    #[test]
    fn test_generic_word_inside_longer_message_is_not_generic() {
        let result = assess("update retry budget after each attempt");
        assert!(!result.reason.unwrap_or_default().contains("too generic"));
    }

    #[test]
    fn test_assess_is_idempotent() {
        for msg in ["feat: add x", "update", "Refactor the diff collector\n\nSplit it up."] {
            assert_eq!(assess(msg), assess(msg));
        }
    }

    #[test]
    fn test_plain_descriptive_imperative_is_accepted() {
        // 5 baseline + 1 length + 1 imperative lead
        let result = assess("Add retry budget to generator loop");
        assert_eq!(result.score, 7);
        assert!(result.is_well_formed);
    }

    #[test]
    fn test_file_restatement_is_penalised() {
        let bare = assess("src/main.rs");
        let prose = assess("Handle missing config file");
        assert!(bare.score < prose.score);
        assert!(bare.reason.unwrap().contains("file name"));

        let filler = assess("update README.md");
        assert!(filler.reason.unwrap().contains("file name"));
    }

    #[test]
    fn test_body_is_rewarded() {
        let summary_only = assess("fix(parser): handle empty input");
        let with_body =
            assess("fix(parser): handle empty input\n\nThe parser panicked on empty strings.");
        assert!(with_body.score > summary_only.score);
        assert_eq!(with_body.score, 10);
    }

    #[test]
    fn test_past_tense_lead_is_penalised() {
        let past = assess("Refactored the collector module");
        let imperative = assess("Refactor the collector module");
        assert!(past.score < imperative.score);
        assert!(past.reason.unwrap().contains("imperative"));
    }

    #[test]
    fn test_long_summary_is_penalised() {
        let long = format!("feat: {}", "handle ".repeat(15));
        let short = "feat: handle handle handle handle";
        assert!(assess(&long).score < assess(short).score);
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(assess("").score, 3);
        assert!(assess("feat(api)!: add paginated listing endpoint\n\nBody text.").score <= 10);
    }

    #[test]
    fn test_commit_type_from_str() {
        assert_eq!("feat".parse::<CommitType>().unwrap(), CommitType::Feat);
        assert_eq!("revert".parse::<CommitType>().unwrap(), CommitType::Revert);
        assert!("Feat".parse::<CommitType>().is_err());
        assert!("unknown".parse::<CommitType>().is_err());
    }
}
