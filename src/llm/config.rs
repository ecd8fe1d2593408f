//! Provider configuration resolved from CLI flags and the environment.

use std::time::Duration;

use tracing::warn;

use crate::llm::ProviderKind;

/// Environment fallback for `--api-key`.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Provider request timeout in seconds.
pub const TIMEOUT_ENV: &str = "COMMITSMITH_TIMEOUT";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed to construct one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub ollama_url: Option<String>,
    /// Override for the OpenAI API root, e.g. a compatible gateway.
    pub openai_base_url: Option<String>,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: None,
            model: None,
            ollama_url: None,
            openai_base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Pick the API key from the flag, falling back to `OPENAI_API_KEY`.
///
/// Blank values count as absent.
pub fn resolve_api_key(flag: Option<&str>) -> Option<String> {
    let from_flag = flag
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from);

    from_flag.or_else(|| {
        std::env::var(OPENAI_API_KEY_ENV)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    })
}

/// Read the provider timeout from `COMMITSMITH_TIMEOUT`.
pub fn provider_timeout() -> Duration {
    match std::env::var(TIMEOUT_ENV) {
        Ok(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Ignoring invalid {}={:?}, using {}s",
                    TIMEOUT_ENV,
                    raw,
                    DEFAULT_TIMEOUT.as_secs()
                );
                DEFAULT_TIMEOUT
            }
        },
        Err(_) => DEFAULT_TIMEOUT,
    }
}
