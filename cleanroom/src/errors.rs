//! Error types for clean room station orchestration.
//!
//! Every failure a phase can hit maps onto one variant of [`CleanRoomError`].
//! Remote failures keep the HTTP status and raw body so the invoking pipeline
//! can show the platform's own diagnostics.

use std::time::Duration;
use thiserror::Error;

/// Convenience result alias used throughout the crate.
pub type Result<T, E = CleanRoomError> = std::result::Result<T, E>;

/// The main error type for clean room operations.
#[derive(Debug, Error)]
pub enum CleanRoomError {
    /// Missing or rejected credentials.
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// The platform answered with a non-2xx status.
    #[error("{0}")]
    RemoteCall(#[from] RemoteCallError),

    /// The station workspace left `PROVISIONING` for something other than `RUNNING`.
    #[error("Workspace could not be provisioned: status {status}")]
    ProvisioningFailed {
        /// The offending workspace status.
        status: String,
    },

    /// The notebook run was skipped, hit an internal error, or did not succeed.
    #[error("{0}")]
    NotebookRunFailed(#[from] NotebookRunFailedError),

    /// A poll loop exhausted its attempt budget or deadline.
    #[error("{0}")]
    Timeout(#[from] TimeoutError),

    /// Malformed input parameters or settings.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// One or more teardown steps failed.
    #[error("Teardown incomplete, failed steps: {}", .failed.join(", "))]
    TeardownIncomplete {
        /// Names of the steps that failed.
        failed: Vec<String>,
    },

    /// The cross-phase handoff store could not be read or written.
    #[error("Handoff store error: {0}")]
    Handoff(String),

    /// The HTTP request could not be sent or its body not read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CleanRoomError {
    /// Short, stable name of the error kind, used in logs and reports.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "AuthError",
            Self::RemoteCall(_) => "RemoteCallError",
            Self::ProvisioningFailed { .. } => "ProvisioningFailedError",
            Self::NotebookRunFailed(_) => "NotebookRunFailedError",
            Self::Timeout(_) => "TimeoutError",
            Self::Config(_) => "ConfigError",
            Self::TeardownIncomplete { .. } => "TeardownIncompleteError",
            Self::Handoff(_) => "HandoffError",
            Self::Transport(_) => "TransportError",
            Self::Serialization(_) => "SerializationError",
            Self::Io(_) => "IoError",
        }
    }

    /// Creates a provisioning failure for the given workspace status.
    #[must_use]
    pub fn provisioning_failed(status: impl Into<String>) -> Self {
        Self::ProvisioningFailed {
            status: status.into(),
        }
    }

    /// Returns the HTTP status if this error came from a remote response.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::RemoteCall(err) => Some(err.status),
            Self::Auth(err) => err.status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CleanRoomError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised for a non-2xx platform response.
#[derive(Debug, Clone, Error)]
#[error("{status} error for {method} {url}: {message}{}", body_suffix(.body.as_deref()))]
pub struct RemoteCallError {
    /// HTTP method of the failed call.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// The platform's error message, or the canonical reason phrase.
    pub message: String,
    /// Raw response body, when non-empty.
    pub body: Option<String>,
}

fn body_suffix(body: Option<&str>) -> String {
    body.map(|b| format!(" Body: {b}")).unwrap_or_default()
}

impl RemoteCallError {
    /// Creates a new remote call error.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Attaches the raw body; empty bodies are ignored.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        if !body.is_empty() {
            self.body = Some(body);
        }
        self
    }
}

/// Error raised when credentials are missing or rejected.
#[derive(Debug, Clone, Error)]
#[error("Authentication failed: {message}{}", body_suffix(.body.as_deref()))]
pub struct AuthError {
    /// Description of the failure.
    pub message: String,
    /// HTTP status when the platform rejected the token.
    pub status: Option<u16>,
    /// Raw response body of the rejection, when non-empty.
    pub body: Option<String>,
}

impl AuthError {
    /// Creates a new auth error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Sets the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches the raw body; empty bodies are ignored.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        if !body.is_empty() {
            self.body = Some(body);
        }
        self
    }
}

/// Error raised for malformed parameters or settings.
#[derive(Debug, Clone, Error)]
#[error("Invalid {field}: {message}")]
pub struct ConfigError {
    /// The parameter or setting at fault.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    /// Creates a new config error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error raised when a notebook run cannot complete successfully.
#[derive(Debug, Clone, Error)]
#[error("Notebook run failed ({life_cycle_state}{}): {message}", result_suffix(.result_state.as_deref()))]
pub struct NotebookRunFailedError {
    /// Life cycle state reported by the platform.
    pub life_cycle_state: String,
    /// Result state, when the run terminated.
    pub result_state: Option<String>,
    /// Human readable explanation.
    pub message: String,
}

fn result_suffix(result_state: Option<&str>) -> String {
    result_state.map(|s| format!("/{s}")).unwrap_or_default()
}

impl NotebookRunFailedError {
    /// Creates a new notebook run failure.
    #[must_use]
    pub fn new(life_cycle_state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            life_cycle_state: life_cycle_state.into(),
            result_state: None,
            message: message.into(),
        }
    }

    /// Sets the result state.
    #[must_use]
    pub fn with_result_state(mut self, result_state: impl Into<String>) -> Self {
        self.result_state = Some(result_state.into());
        self
    }
}

/// Error raised when a poll loop gives up waiting.
#[derive(Debug, Clone, Error)]
#[error("Timed out waiting for {operation} after {attempts} attempts ({:.1}s)", .elapsed.as_secs_f64())]
pub struct TimeoutError {
    /// What was being waited on.
    pub operation: String,
    /// Number of status fetches made.
    pub attempts: usize,
    /// Wall time spent polling.
    pub elapsed: Duration,
}

impl TimeoutError {
    /// Creates a new timeout error.
    #[must_use]
    pub fn new(operation: impl Into<String>, attempts: usize, elapsed: Duration) -> Self {
        Self {
            operation: operation.into(),
            attempts,
            elapsed,
        }
    }
}
