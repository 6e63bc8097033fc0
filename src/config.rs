//! Application configuration loaded from environment variables.
//!
//! Every value is optional:
//! - `TRADEDESK_API_URL`: backend base URL (default `http://localhost:5182/api/`)
//! - `TRADEDESK_API_KEY`: a previously issued API key, skipping login
//! - `TRADEDESK_TIMEOUT_SECS`: per-request timeout in seconds (default 10)
//! - `TRADEDESK_CHAT_HISTORY`: agent chat lines kept in memory (default 100)

use std::time::Duration;

/// Default backend endpoint.
const DEFAULT_API_URL: &str = "http://localhost:5182/api/";

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of chat transcript lines.
const DEFAULT_CHAT_HISTORY: usize = 100;

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// Maximum number of agent chat lines retained per session.
    pub chat_history: usize,
}

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, always ending in `/` so relative paths join beneath it.
    pub api_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`TradeDeskError::Config`](crate::TradeDeskError::Config) if a
/// numeric variable is not a positive integer.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let mut api_url =
        non_empty_var("TRADEDESK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    if !api_url.ends_with('/') {
        api_url.push('/');
    }

    let api_key = non_empty_var("TRADEDESK_API_KEY");
    let timeout_secs = positive_var("TRADEDESK_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
    let chat_history = positive_var("TRADEDESK_CHAT_HISTORY")?
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_CHAT_HISTORY);

    Ok(AppConfig {
        backend: BackendConfig {
            api_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        },
        chat_history,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses an optional strictly positive integer variable.
fn positive_var(name: &str) -> crate::Result<Option<u64>> {
    let Some(raw) = non_empty_var(name) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(crate::TradeDeskError::Config(format!(
            "{name} must be a positive integer, got {raw:?}"
        ))),
    }
}
