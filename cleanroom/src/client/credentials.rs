//! Bearer token providers.

use std::fmt;

use crate::errors::AuthError;

/// Supplies the bearer token sent with every platform call.
///
/// Tokens are fetched per request so rotating providers stay current.
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Returns the current token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` when no usable token is available.
    fn bearer_token(&self) -> Result<String, AuthError>;
}

/// A fixed token.
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Creates a provider for the given token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Result<String, AuthError> {
        if self.token.is_empty() {
            return Err(AuthError::new("token is empty"));
        }
        Ok(self.token.clone())
    }
}

/// Reads the token from an environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    /// Default variable name.
    pub const DEFAULT_VAR: &'static str = "CLEAN_ROOM_TOKEN";

    /// Creates a provider reading `var`.
    #[must_use]
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// The variable this provider reads.
    #[must_use]
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

impl CredentialProvider for EnvToken {
    fn bearer_token(&self) -> Result<String, AuthError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            Ok(_) => Err(AuthError::new(format!("{} is empty", self.var))),
            Err(_) => Err(AuthError::new(format!("{} is not set", self.var))),
        }
    }
}
