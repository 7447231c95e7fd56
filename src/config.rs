use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::ingest::backoff::BackoffPolicy;
use crate::ingest::worker::WorkerSettings;
use crate::ranking::hub::HubSettings;
use crate::source::x_search::{DEFAULT_API_URL, DEFAULT_QUERY};

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// App-only bearer token for the X API (KOTONAMI_BEARER_TOKEN, or BEARER_TOKEN).
    pub bearer_token: String,
    pub api_url: String,
    /// Recent-search query string.
    pub query: String,
    /// Tweets requested per poll (10–100).
    pub max_results: u8,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub backoff_max: Duration,
    pub ledger_capacity: usize,
    pub history_capacity: usize,
    /// Length of the ranking snapshot pushed to viewers.
    pub top_k: usize,
    /// Records tagged with any other language are dropped. Empty disables the filter.
    pub language: String,
    /// Optional JSON rule file replacing the built-in classifier tables.
    pub rules_path: Option<PathBuf>,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the bearer token, which is only
    /// required by commands that talk to the API (see `require_bearer_token`).
    pub fn load() -> Result<Self> {
        let bearer_token = env::var("KOTONAMI_BEARER_TOKEN")
            .or_else(|_| env::var("BEARER_TOKEN"))
            .unwrap_or_default();

        let config = Self {
            bearer_token,
            api_url: env::var("KOTONAMI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            query: env::var("KOTONAMI_QUERY").unwrap_or_else(|_| DEFAULT_QUERY.to_string()),
            max_results: parse_var("KOTONAMI_MAX_RESULTS", 10)?,
            poll_interval: Duration::from_secs(parse_var("KOTONAMI_POLL_INTERVAL_SECS", 120)?),
            fetch_timeout: Duration::from_secs(parse_var("KOTONAMI_FETCH_TIMEOUT_SECS", 30)?),
            backoff_max: Duration::from_secs(parse_var("KOTONAMI_BACKOFF_MAX_SECS", 120)?),
            ledger_capacity: parse_var("KOTONAMI_LEDGER_CAPACITY", 1000)?,
            history_capacity: parse_var("KOTONAMI_HISTORY_CAPACITY", 100)?,
            top_k: parse_var("KOTONAMI_TOP_K", 50)?,
            language: env::var("KOTONAMI_LANGUAGE").unwrap_or_else(|_| "ja".to_string()),
            rules_path: env::var("KOTONAMI_RULES_PATH").ok().map(PathBuf::from),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 5001)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the loop spin.
    pub fn validate(&self) -> Result<()> {
        if self.backoff_max.is_zero() {
            anyhow::bail!("KOTONAMI_BACKOFF_MAX_SECS must be at least 1");
        }
        if self.poll_interval.is_zero() {
            anyhow::bail!("KOTONAMI_POLL_INTERVAL_SECS must be at least 1");
        }
        Ok(())
    }

    /// Check that the API credential is configured.
    /// Call this before starting the ingestion loop.
    pub fn require_bearer_token(&self) -> Result<()> {
        if self.bearer_token.trim().is_empty() {
            anyhow::bail!(
                "KOTONAMI_BEARER_TOKEN not set. Add it to your .env file.\n\
                 The ingestion loop cannot start without an X API bearer token."
            );
        }
        Ok(())
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            poll_interval: self.poll_interval,
            fetch_timeout: self.fetch_timeout,
            backoff: BackoffPolicy::with_max_delay(self.backoff_max),
            target_language: (!self.language.is_empty()).then(|| self.language.clone()),
        }
    }

    pub fn hub_settings(&self) -> HubSettings {
        HubSettings {
            ledger_capacity: self.ledger_capacity,
            history_capacity: self.history_capacity,
            top_k: self.top_k,
        }
    }
}

/// Parse an optional numeric env var, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global; each test uses its own variable names.

    #[test]
    fn test_parse_var_default_when_unset() {
        let v: u64 = parse_var("KOTONAMI_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("KOTONAMI_TEST_GARBAGE_VAR", "soon");
        let err = parse_var::<u64>("KOTONAMI_TEST_GARBAGE_VAR", 1).unwrap_err();
        assert!(err.to_string().contains("KOTONAMI_TEST_GARBAGE_VAR"));
        env::remove_var("KOTONAMI_TEST_GARBAGE_VAR");
    }

    #[test]
    fn test_parse_var_trims() {
        env::set_var("KOTONAMI_TEST_TRIM_VAR", " 15 ");
        let v: usize = parse_var("KOTONAMI_TEST_TRIM_VAR", 1).unwrap();
        assert_eq!(v, 15);
        env::remove_var("KOTONAMI_TEST_TRIM_VAR");
    }

    fn sample() -> Config {
        Config {
            bearer_token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            query: DEFAULT_QUERY.to_string(),
            max_results: 10,
            poll_interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(5),
            backoff_max: Duration::from_secs(30),
            ledger_capacity: 10,
            history_capacity: 5,
            top_k: 3,
            language: String::new(),
            rules_path: None,
            host: "127.0.0.1".to_string(),
            port: 0,
        }
    }

    #[test]
    fn test_require_bearer_token() {
        let mut config = sample();
        assert!(config.require_bearer_token().is_err());
        config.bearer_token = "abc".to_string();
        assert!(config.require_bearer_token().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_backoff_cap() {
        let mut config = sample();
        assert!(config.validate().is_ok());

        config.backoff_max = Duration::ZERO;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("KOTONAMI_BACKOFF_MAX_SECS"));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut config = sample();
        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settings_derivation() {
        let config = sample();
        let worker = config.worker_settings();
        assert_eq!(worker.backoff.max_delay, Duration::from_secs(30));
        assert_eq!(worker.target_language, None);
        assert_eq!(config.hub_settings().top_k, 3);
    }
}
