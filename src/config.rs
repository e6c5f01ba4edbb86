// Runtime configuration.
// Fixed defaults with optional environment overrides, validated as a whole.

use std::time::Duration;

use crate::error::{KIndexError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.meteoagent.com/widgets/v1/kindex";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) kindex/0.1 (+https://api.meteoagent.com)";

const ENV_ENDPOINT: &str = "KINDEX_ENDPOINT";
const ENV_TIMEOUT_SECS: &str = "KINDEX_TIMEOUT_SECS";
const ENV_REFRESH_SECS: &str = "KINDEX_REFRESH_SECS";

const MAX_TIMEOUT: Duration = Duration::from_secs(60);
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Widget page to scrape.
    pub endpoint: String,
    /// Upper bound on a single request, connect through body.
    pub timeout: Duration,
    /// Cadence of refresh attempts.
    pub refresh_interval: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by `KINDEX_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(endpoint) = non_empty(lookup(ENV_ENDPOINT)) {
            config.endpoint = endpoint;
        }
        if let Some(raw) = non_empty(lookup(ENV_TIMEOUT_SECS)) {
            config.timeout = parse_secs(&raw, ENV_TIMEOUT_SECS)?;
        }
        if let Some(raw) = non_empty(lookup(ENV_REFRESH_SECS)) {
            config.refresh_interval = parse_secs(&raw, ENV_REFRESH_SECS)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut issues: Vec<String> = Vec::new();

        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            issues.push(format!("endpoint must be an http(s) URL: {}", self.endpoint));
        }
        if self.timeout.is_zero() || self.timeout > MAX_TIMEOUT {
            issues.push(format!(
                "timeout must be between 1 and {} seconds",
                MAX_TIMEOUT.as_secs()
            ));
        }
        if self.refresh_interval < MIN_REFRESH_INTERVAL {
            issues.push(format!(
                "refresh interval must be at least {} seconds",
                MIN_REFRESH_INTERVAL.as_secs()
            ));
        }
        if self.refresh_interval <= self.timeout {
            issues.push("refresh interval must be longer than the request timeout".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(KIndexError::Config(issues.join("; ")))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(raw: &str, env_name: &str) -> Result<Duration> {
    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| KIndexError::Config(format!("{env_name} must be a whole number of seconds")))
}
