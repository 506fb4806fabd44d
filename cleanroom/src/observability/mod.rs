//! Tracing subscriber setup.
//!
//! Filtering follows `RUST_LOG`, e.g. `RUST_LOG=cleanroom=debug` shows every
//! poll attempt. When `RUST_LOG` is unset the caller's default filter applies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as layer_fmt, EnvFilter};

use crate::errors::ConfigError;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human readable output.
    #[default]
    Pretty,
    /// Single-line output.
    Compact,
    /// One JSON object per line.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::new(
                "log format",
                format!("'{other}' is not one of pretty, compact, json"),
            )),
        }
    }
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns `ConfigError` if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str, format: LogFormat) -> Result<(), ConfigError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Json => registry
            .with(layer_fmt::layer().with_ansi(false).json())
            .try_init(),
        LogFormat::Compact => registry.with(layer_fmt::layer().compact()).try_init(),
        LogFormat::Pretty => registry.with(layer_fmt::layer().pretty()).try_init(),
    };

    result.map_err(|e| ConfigError::new("tracing", format!("failed to initialize: {e}")))
}
