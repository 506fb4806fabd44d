//! Controller settings and run requests.

use crate::config::PollingConfig;
use crate::core::ParameterMap;
use crate::errors::ConfigError;
use crate::polling::PollPolicy;

/// How the controller waits and where it puts results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Policy for the workspace provisioning wait.
    pub workspace_poll: PollPolicy,
    /// Policy for the notebook run wait.
    pub run_poll: PollPolicy,
    /// Workspace user that receives the imported output.
    pub output_owner: String,
    /// Browser-facing workspace host used in results links.
    pub browser_host: Option<String>,
}

impl ControllerSettings {
    /// Creates settings with default polling for the given output owner.
    #[must_use]
    pub fn new(output_owner: impl Into<String>) -> Self {
        let polling = PollingConfig::default();
        Self {
            workspace_poll: polling.workspace_policy(),
            run_poll: polling.run_policy(),
            output_owner: output_owner.into(),
            browser_host: None,
        }
    }

    /// Applies both poll policies from a polling configuration.
    #[must_use]
    pub fn with_polling(mut self, polling: &PollingConfig) -> Self {
        self.workspace_poll = polling.workspace_policy();
        self.run_poll = polling.run_policy();
        self
    }

    /// Sets the workspace provisioning policy.
    #[must_use]
    pub fn with_workspace_poll(mut self, policy: PollPolicy) -> Self {
        self.workspace_poll = policy;
        self
    }

    /// Sets the notebook run policy.
    #[must_use]
    pub fn with_run_poll(mut self, policy: PollPolicy) -> Self {
        self.run_poll = policy;
        self
    }

    /// Sets the browser host for results links.
    #[must_use]
    pub fn with_browser_host(mut self, host: impl Into<String>) -> Self {
        let host = host.into();
        self.browser_host = (!host.trim().is_empty()).then_some(host);
        self
    }

    /// The output owner, trimmed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the owner is blank.
    pub fn require_output_owner(&self) -> Result<&str, ConfigError> {
        let owner = self.output_owner.trim();
        if owner.is_empty() {
            return Err(ConfigError::new("output owner", "user name must be non-empty"));
        }
        Ok(owner)
    }

    /// Results link for a workspace object.
    ///
    /// Absolute when a browser host is known, otherwise relative to the
    /// workspace UI.
    #[must_use]
    pub fn notebook_url(&self, object_id: i64) -> String {
        match self.browser_host.as_deref().map(str::trim) {
            Some(host) => {
                let host = host
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/');
                format!("https://{host}/#notebook/{object_id}")
            }
            None => format!("/#notebook/{object_id}"),
        }
    }
}

/// What to run on the station.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookRunRequest {
    /// Collaborator that owns the notebook.
    pub collaborator: String,
    /// Notebook name within the clean room.
    pub notebook_name: String,
    /// Base parameters passed to the run.
    pub notebook_parameters: ParameterMap,
    /// Output-table mapping for the collaborator shares.
    pub output_tables: ParameterMap,
}

impl NotebookRunRequest {
    /// Creates a request with no parameters.
    #[must_use]
    pub fn new(collaborator: impl Into<String>, notebook_name: impl Into<String>) -> Self {
        Self {
            collaborator: collaborator.into(),
            notebook_name: notebook_name.into(),
            ..Self::default()
        }
    }

    /// Sets the notebook parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParameterMap) -> Self {
        self.notebook_parameters = parameters;
        self
    }

    /// Sets the output-table mapping.
    #[must_use]
    pub fn with_output_tables(mut self, output_tables: ParameterMap) -> Self {
        self.output_tables = output_tables;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_require_output_owner() {
        assert_eq!(
            ControllerSettings::new("  alice ").require_output_owner().unwrap(),
            "alice"
        );
        let err = ControllerSettings::new("   ").require_output_owner().unwrap_err();
        assert_eq!(err.field, "output owner");
    }

    #[test]
    fn test_default_polling() {
        let settings = ControllerSettings::new("me");
        assert_eq!(settings.workspace_poll.interval, Duration::from_secs(10));
        assert_eq!(settings.workspace_poll.timeout, Some(Duration::from_secs(3600)));
        assert_eq!(settings.run_poll.timeout, Some(Duration::from_secs(43_200)));
    }

    #[test]
    fn test_notebook_url() {
        let settings = ControllerSettings::new("me");
        assert_eq!(settings.notebook_url(42), "/#notebook/42");

        let settings = settings.with_browser_host("adb-1.example.net");
        assert_eq!(settings.notebook_url(42), "https://adb-1.example.net/#notebook/42");

        let settings = settings.with_browser_host("https://adb-1.example.net/");
        assert_eq!(settings.notebook_url(7), "https://adb-1.example.net/#notebook/7");

        assert!(ControllerSettings::new("me").with_browser_host(" ").browser_host.is_none());
    }
}
