//! The two job phases: run, then teardown.
//!
//! A scheduled job runs [`run_phase`] and [`teardown_phase`] as separate
//! tasks. The teardown task always runs, even after a failed run, and relies
//! on the values the run phase left in the [`HandoffScope`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::controller::{NotebookRunRequest, StationController};
use crate::core::{results_link_html, NotebookRunState, RunOutcome, TeardownReport};
use crate::errors::{CleanRoomError, NotebookRunFailedError, Result};
use crate::handoff::{keys, HandoffScope};

/// Prepares the station and runs the notebook.
///
/// Validates the settings, then marks the station as created before any
/// platform call, so teardown runs even if creation fails partway. On
/// completion the results link and run state are stored for the teardown
/// phase.
///
/// # Errors
///
/// `ConfigError` for a blank output owner, with the station flag left unset;
/// any controller error; `NotebookRunFailed` when the run terminated without
/// `SUCCESS`.
pub async fn run_phase(
    controller: &StationController,
    scope: &HandoffScope,
    request: &NotebookRunRequest,
) -> Result<RunOutcome> {
    controller.settings().require_output_owner()?;
    scope.set(keys::STATION_CREATED, &true).await?;

    let outcome = controller.prepare_and_run_notebook(request).await?;

    scope.set(keys::NOTEBOOK_URL, &outcome.notebook_url).await?;
    scope.set(keys::NOTEBOOK_RUN_STATE, &outcome.state).await?;
    info!(link = %outcome.results_link_html(), "Notebook results imported");

    if !outcome.succeeded() {
        warn!(
            result_state = ?outcome.state.result_state,
            "Notebook did not succeed, review the results notebook"
        );
        return Err(unsuccessful_run(&outcome.state));
    }
    Ok(outcome)
}

fn unsuccessful_run(state: &NotebookRunState) -> CleanRoomError {
    let message = state
        .state_message
        .clone()
        .unwrap_or_else(|| "notebook did not succeed".to_string());
    let mut err = NotebookRunFailedError::new(state.life_cycle_state.as_str(), message);
    if let Some(result_state) = &state.result_state {
        err = err.with_result_state(result_state.as_str());
    }
    err.into()
}

/// What the teardown phase found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownPhaseSummary {
    /// Whether the run phase got as far as creating the station.
    pub station_created: bool,
    /// Teardown calls made, if any.
    pub report: Option<TeardownReport>,
    /// Results link stored by the run phase.
    pub notebook_url: Option<String>,
    /// Run state stored by the run phase.
    pub run_state: Option<NotebookRunState>,
}

impl TeardownPhaseSummary {
    /// Anchor for the stored results link, if any.
    #[must_use]
    pub fn results_link_html(&self) -> Option<String> {
        self.notebook_url.as_deref().map(results_link_html)
    }

    /// True when the stored run state is a success.
    #[must_use]
    pub fn run_succeeded(&self) -> bool {
        self.run_state.as_ref().is_some_and(NotebookRunState::succeeded)
    }
}

/// Tears the station down if the run phase created it.
///
/// The stored results link and run state are informational. A missing or
/// malformed value is logged and treated as absent.
///
/// # Errors
///
/// `TeardownIncomplete` listing the failed steps when any teardown call
/// failed; handoff store errors while reading the station flag.
pub async fn teardown_phase(
    controller: &StationController,
    scope: &HandoffScope,
) -> Result<TeardownPhaseSummary> {
    if !scope.flag(keys::STATION_CREATED).await? {
        info!("No station was created, nothing to tear down");
        return Ok(TeardownPhaseSummary::default());
    }

    let notebook_url = stored_or_none(scope, keys::NOTEBOOK_URL).await;
    let run_state = stored_or_none(scope, keys::NOTEBOOK_RUN_STATE).await;
    let report = controller.teardown_station().await;

    let summary = TeardownPhaseSummary {
        station_created: true,
        notebook_url,
        run_state,
        report: Some(report),
    };

    if let Some(link) = summary.results_link_html() {
        info!(link = %link, "Notebook results");
    }
    if summary.run_state.is_some() && !summary.run_succeeded() {
        warn!(
            run_state = ?summary.run_state,
            "Notebook did not succeed, review the results notebook"
        );
    }

    let failed: Vec<String> = summary
        .report
        .iter()
        .flat_map(TeardownReport::failures)
        .map(|step| step.target.to_string())
        .collect();
    if !failed.is_empty() {
        return Err(CleanRoomError::TeardownIncomplete { failed });
    }
    Ok(summary)
}

async fn stored_or_none<T: DeserializeOwned>(scope: &HandoffScope, key: &str) -> Option<T> {
    match scope.get(key).await {
        Ok(value) => value,
        Err(err) => {
            warn!(key, error = %err, "Ignoring unreadable handoff value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResourceClient;
    use crate::controller::ControllerSettings;
    use crate::core::{NotebookRunState, ResourceKind, StationRef};
    use crate::handoff::{InMemoryHandoffStore, PhaseHandoffStore, DEFAULT_TASK_KEY};
    use crate::polling::PollPolicy;
    use crate::testing::{ClientCall, ScriptedResourceClient};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn setup(
        client: ScriptedResourceClient,
    ) -> (Arc<ScriptedResourceClient>, StationController, HandoffScope) {
        let client = Arc::new(client);
        let policy = PollPolicy::new()
            .with_interval(Duration::from_millis(1))
            .with_max_attempts(5);
        let settings = ControllerSettings::new("alice")
            .with_workspace_poll(policy)
            .with_run_poll(policy);
        let dyn_client: Arc<dyn ResourceClient> = client.clone();
        let controller =
            StationController::new(dyn_client, StationRef::new("room", "s1").unwrap(), settings)
                .unwrap();
        let store: Arc<dyn PhaseHandoffStore> = Arc::new(InMemoryHandoffStore::new());
        (client, controller, HandoffScope::new(store, DEFAULT_TASK_KEY))
    }

    fn request() -> NotebookRunRequest {
        NotebookRunRequest::new("acme", "analysis")
    }

    #[tokio::test]
    async fn test_run_then_teardown() {
        let (client, controller, scope) =
            setup(ScriptedResourceClient::new().with_object_id(1234));

        let outcome = run_phase(&controller, &scope, &request()).await.unwrap();
        assert_eq!(outcome.notebook_url, "/#notebook/1234");
        assert!(scope.flag(keys::STATION_CREATED).await.unwrap());

        let summary = teardown_phase(&controller, &scope).await.unwrap();
        assert!(summary.station_created);
        assert!(summary.run_succeeded());
        assert_eq!(
            summary.results_link_html().as_deref(),
            Some("<a href='/#notebook/1234'>Notebook Results</a>")
        );
        assert!(summary.report.unwrap().is_complete());
        assert_eq!(client.call_count(ClientCall::DeleteStation), 1);
    }

    #[tokio::test]
    async fn test_unsuccessful_run_fails_but_keeps_results() {
        let (_, controller, scope) = setup(
            ScriptedResourceClient::new()
                .with_run_states([NotebookRunState::terminated("FAILED")]),
        );

        let err = run_phase(&controller, &scope, &request()).await.unwrap_err();
        assert_eq!(err.kind(), "NotebookRunFailedError");
        assert!(err.to_string().contains("FAILED"));

        let url: Option<String> = scope.get(keys::NOTEBOOK_URL).await.unwrap();
        assert!(url.is_some());

        let summary = teardown_phase(&controller, &scope).await.unwrap();
        assert!(!summary.run_succeeded());
    }

    #[tokio::test]
    async fn test_station_flag_set_even_when_creation_fails() {
        let (client, controller, scope) = setup(ScriptedResourceClient::new().failing(
            ClientCall::CreateStation,
            409,
            "station exists",
        ));

        assert!(run_phase(&controller, &scope, &request()).await.is_err());
        assert!(scope.flag(keys::STATION_CREATED).await.unwrap());

        let summary = teardown_phase(&controller, &scope).await.unwrap();
        assert!(summary.notebook_url.is_none());
        assert_eq!(client.call_count(ClientCall::DeleteStation), 1);
    }

    #[tokio::test]
    async fn test_blank_owner_leaves_station_flag_unset() {
        let client = Arc::new(ScriptedResourceClient::new());
        let dyn_client: Arc<dyn ResourceClient> = client.clone();
        let controller = StationController::new(
            dyn_client,
            StationRef::new("room", "s1").unwrap(),
            ControllerSettings::new(""),
        )
        .unwrap();
        let store: Arc<dyn PhaseHandoffStore> = Arc::new(InMemoryHandoffStore::new());
        let scope = HandoffScope::new(store, DEFAULT_TASK_KEY);

        let err = run_phase(&controller, &scope, &request()).await.unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(!scope.flag(keys::STATION_CREATED).await.unwrap());

        let summary = teardown_phase(&controller, &scope).await.unwrap();
        assert!(!summary.station_created);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_stored_results_keep_teardown_report() {
        let (client, controller, scope) = setup(ScriptedResourceClient::new());
        scope.set(keys::STATION_CREATED, &true).await.unwrap();
        scope.set(keys::NOTEBOOK_URL, &42).await.unwrap();
        scope.set(keys::NOTEBOOK_RUN_STATE, &"garbage").await.unwrap();

        let summary = teardown_phase(&controller, &scope).await.unwrap();
        assert!(summary.station_created);
        assert!(summary.notebook_url.is_none());
        assert!(summary.run_state.is_none());
        assert!(summary.report.unwrap().is_complete());
        assert_eq!(client.call_count(ClientCall::DeleteStation), 1);
    }

    #[tokio::test]
    async fn test_teardown_without_station_is_noop() {
        let (client, controller, scope) = setup(ScriptedResourceClient::new());

        let summary = teardown_phase(&controller, &scope).await.unwrap();
        assert_eq!(summary, TeardownPhaseSummary::default());
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_partial_teardown_is_reported() {
        let (client, controller, scope) = setup(ScriptedResourceClient::new().failing(
            ClientCall::TeardownResource(ResourceKind::Metastore),
            500,
            "busy",
        ));
        scope.set(keys::STATION_CREATED, &true).await.unwrap();

        let err = teardown_phase(&controller, &scope).await.unwrap_err();
        assert_eq!(err.kind(), "TeardownIncompleteError");
        assert!(err.to_string().contains("METASTORE"));
        assert_eq!(client.call_count(ClientCall::DeleteStation), 1);
    }
}
