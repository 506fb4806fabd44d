//! Configuration types for the platform client and poll loops.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::ParameterMap;
use crate::dialect::Dialect;
use crate::errors::ConfigError;
use crate::polling::PollPolicy;

/// Configuration for the platform HTTP client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Workspace API base URL, e.g. `https://my-workspace.cloud.example.com`.
    pub host: String,
    /// Station API generation.
    #[serde(default)]
    pub dialect: Dialect,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> f64 {
    60.0
}

fn default_user_agent() -> String {
    format!("cleanroom/{}", env!("CARGO_PKG_VERSION"))
}

impl ClientConfig {
    /// Creates a configuration for the given host with defaults.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            dialect: Dialect::default(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }

    /// Sets the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Gets timeout as Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        seconds(self.timeout_seconds)
    }

    /// Host without a trailing slash.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the host is empty or not an http(s) URL.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        let host = self.host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(ConfigError::new("host", "workspace URL is required"));
        }
        if !(host.starts_with("https://") || host.starts_with("http://")) {
            return Err(ConfigError::new(
                "host",
                format!("'{host}' must start with https:// or http://"),
            ));
        }
        Ok(host.to_string())
    }
}

/// Converts configured seconds, clamping negatives to zero and saturating
/// values too large for a `Duration`.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

/// Poll settings for the two wait loops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between status fetches.
    #[serde(default = "default_interval")]
    pub interval_seconds: f64,
    /// Give up on workspace provisioning after this many seconds.
    #[serde(default = "default_workspace_timeout")]
    pub workspace_timeout_seconds: f64,
    /// Give up on the notebook run after this many seconds.
    #[serde(default = "default_run_timeout")]
    pub run_timeout_seconds: f64,
    /// Optional cap on status fetches per loop.
    #[serde(default)]
    pub max_attempts: Option<usize>,
}

fn default_interval() -> f64 {
    10.0
}

fn default_workspace_timeout() -> f64 {
    60.0 * 60.0
}

fn default_run_timeout() -> f64 {
    12.0 * 60.0 * 60.0
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            workspace_timeout_seconds: default_workspace_timeout(),
            run_timeout_seconds: default_run_timeout(),
            max_attempts: None,
        }
    }
}

impl PollingConfig {
    /// Creates the default polling configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_seconds = interval.as_secs_f64();
        self
    }

    /// Sets the workspace provisioning timeout.
    #[must_use]
    pub fn with_workspace_timeout(mut self, timeout: Duration) -> Self {
        self.workspace_timeout_seconds = timeout.as_secs_f64();
        self
    }

    /// Sets the notebook run timeout.
    #[must_use]
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout_seconds = timeout.as_secs_f64();
        self
    }

    /// Sets the attempt cap.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    fn policy(&self, timeout_seconds: f64) -> PollPolicy {
        let mut policy = PollPolicy::new()
            .with_interval(seconds(self.interval_seconds))
            .with_timeout(seconds(timeout_seconds));
        if let Some(attempts) = self.max_attempts {
            policy = policy.with_max_attempts(attempts);
        }
        policy
    }

    /// Policy for the workspace provisioning loop.
    #[must_use]
    pub fn workspace_policy(&self) -> PollPolicy {
        self.policy(self.workspace_timeout_seconds)
    }

    /// Policy for the notebook run loop.
    #[must_use]
    pub fn run_policy(&self) -> PollPolicy {
        self.policy(self.run_timeout_seconds)
    }
}

/// Parses a JSON object of string values, as passed in job parameters.
///
/// Empty input yields an empty map.
///
/// # Errors
///
/// Returns `ConfigError` naming `field` when the text is not a JSON object or
/// any value is not a string.
pub fn parse_parameters(field: &str, text: &str) -> Result<ParameterMap, ConfigError> {
    if text.trim().is_empty() {
        return Ok(ParameterMap::new());
    }

    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ConfigError::new(field, format!("not valid JSON: {e}")))?;

    let serde_json::Value::Object(object) = value else {
        return Err(ConfigError::new(field, "must be a JSON object"));
    };

    object
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Ok((key, s)),
            other => Err(ConfigError::new(
                field,
                format!("all values must be strings, '{key}' is {other}"),
            )),
        })
        .collect()
}
