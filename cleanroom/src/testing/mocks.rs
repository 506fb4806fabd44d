//! Scripted resource client.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;

use crate::client::ResourceClient;
use crate::core::{
    NotebookContent, NotebookMetadata, NotebookRunState, ParameterMap, ResourceInfo,
    ResourceKind, RunHandle, SetupRequest, StationInfo, StationRef, WorkspaceStatus,
};
use crate::errors::{RemoteCallError, Result};

/// One call made against a [`ScriptedResourceClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCall {
    /// `create_station`
    CreateStation,
    /// `setup_resource`
    SetupResource(ResourceKind),
    /// `get_workspace_status`
    GetWorkspaceStatus,
    /// `run_notebook`
    RunNotebook,
    /// `get_run_state`
    GetRunState,
    /// `export_notebook_output`
    ExportNotebookOutput,
    /// `teardown_resource`
    TeardownResource(ResourceKind),
    /// `delete_station`
    DeleteStation,
    /// `list_stations`
    ListStations,
    /// `import_notebook`
    ImportNotebook,
    /// `get_notebook_status`
    GetNotebookStatus,
}

impl fmt::Display for ClientCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateStation => write!(f, "create_station"),
            Self::SetupResource(kind) => write!(f, "setup_resource({kind})"),
            Self::GetWorkspaceStatus => write!(f, "get_workspace_status"),
            Self::RunNotebook => write!(f, "run_notebook"),
            Self::GetRunState => write!(f, "get_run_state"),
            Self::ExportNotebookOutput => write!(f, "export_notebook_output"),
            Self::TeardownResource(kind) => write!(f, "teardown_resource({kind})"),
            Self::DeleteStation => write!(f, "delete_station"),
            Self::ListStations => write!(f, "list_stations"),
            Self::ImportNotebook => write!(f, "import_notebook"),
            Self::GetNotebookStatus => write!(f, "get_notebook_status"),
        }
    }
}

#[derive(Debug, Clone)]
struct ScriptedFailure {
    call: ClientCall,
    status: u16,
    message: String,
}

/// Pops scripted values in order, repeating the last one once a single value is left.
fn next_scripted<T: Clone>(queue: &mut VecDeque<T>, fallback: T) -> T {
    if queue.len() > 1 {
        queue.pop_front().unwrap_or(fallback)
    } else {
        queue.front().cloned().unwrap_or(fallback)
    }
}

/// A [`ResourceClient`] that returns scripted responses and records calls.
///
/// Unscripted polls report `RUNNING` and `TERMINATED/SUCCESS`.
#[derive(Debug)]
pub struct ScriptedResourceClient {
    calls: Mutex<Vec<ClientCall>>,
    workspace_statuses: Mutex<VecDeque<WorkspaceStatus>>,
    run_states: Mutex<VecDeque<NotebookRunState>>,
    failures: Mutex<Vec<ScriptedFailure>>,
    setup_requests: Mutex<Vec<SetupRequest>>,
    run_parameters: Mutex<Vec<ParameterMap>>,
    imports: Mutex<Vec<(String, NotebookContent)>>,
    export: NotebookContent,
    object_id: i64,
    stations: Vec<StationInfo>,
}

impl Default for ScriptedResourceClient {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            workspace_statuses: Mutex::new(VecDeque::new()),
            run_states: Mutex::new(VecDeque::new()),
            failures: Mutex::new(Vec::new()),
            setup_requests: Mutex::new(Vec::new()),
            run_parameters: Mutex::new(Vec::new()),
            imports: Mutex::new(Vec::new()),
            export: NotebookContent::html("PGh0bWw+PC9odG1sPg=="),
            object_id: 1234,
            stations: Vec::new(),
        }
    }
}

impl ScriptedResourceClient {
    /// Creates a client where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the workspace statuses returned by successive polls.
    #[must_use]
    pub fn with_workspace_statuses<I, S>(self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<WorkspaceStatus>,
    {
        *self.workspace_statuses.lock() = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Scripts the run states returned by successive polls.
    #[must_use]
    pub fn with_run_states(self, states: impl IntoIterator<Item = NotebookRunState>) -> Self {
        *self.run_states.lock() = states.into_iter().collect();
        self
    }

    /// Sets the exported notebook content.
    #[must_use]
    pub fn with_export(mut self, content: NotebookContent) -> Self {
        self.export = content;
        self
    }

    /// Sets the object id reported for imported notebooks.
    #[must_use]
    pub fn with_object_id(mut self, object_id: i64) -> Self {
        self.object_id = object_id;
        self
    }

    /// Sets the stations returned by `list_stations`.
    #[must_use]
    pub fn with_stations(mut self, stations: Vec<StationInfo>) -> Self {
        self.stations = stations;
        self
    }

    /// Makes every occurrence of `call` fail with the given HTTP status.
    #[must_use]
    pub fn failing(self, call: ClientCall, status: u16, message: impl Into<String>) -> Self {
        self.failures.lock().push(ScriptedFailure {
            call,
            status,
            message: message.into(),
        });
        self
    }

    /// All calls made, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().clone()
    }

    /// Number of times `call` was made.
    #[must_use]
    pub fn call_count(&self, call: ClientCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Setup requests received, in order.
    #[must_use]
    pub fn setup_requests(&self) -> Vec<SetupRequest> {
        self.setup_requests.lock().clone()
    }

    /// Parameters passed to each `run_notebook` call.
    #[must_use]
    pub fn run_parameters(&self) -> Vec<ParameterMap> {
        self.run_parameters.lock().clone()
    }

    /// Imports received as `(path, content)`.
    #[must_use]
    pub fn imports(&self) -> Vec<(String, NotebookContent)> {
        self.imports.lock().clone()
    }

    fn record(&self, call: ClientCall) -> Result<()> {
        self.calls.lock().push(call);
        let failures = self.failures.lock();
        match failures.iter().find(|f| f.call == call) {
            Some(failure) => Err(RemoteCallError::new(
                "POST",
                format!("scripted://{call}"),
                failure.status,
                failure.message.clone(),
            )
            .into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceClient for ScriptedResourceClient {
    async fn create_station(&self, station: &StationRef) -> Result<StationInfo> {
        self.record(ClientCall::CreateStation)?;
        Ok(StationInfo {
            station_name: Some(station.station_name.clone()),
            clean_room: Some(station.clean_room.clone()),
            ..StationInfo::default()
        })
    }

    async fn setup_resource(
        &self,
        _station: &StationRef,
        request: &SetupRequest,
    ) -> Result<ResourceInfo> {
        self.record(ClientCall::SetupResource(request.kind))?;
        self.setup_requests.lock().push(request.clone());
        Ok(serde_json::json!({}))
    }

    async fn get_workspace_status(&self, _station: &StationRef) -> Result<WorkspaceStatus> {
        self.record(ClientCall::GetWorkspaceStatus)?;
        let mut statuses = self.workspace_statuses.lock();
        Ok(next_scripted(&mut *statuses, WorkspaceStatus::Running))
    }

    async fn run_notebook(
        &self,
        _station: &StationRef,
        parameters: &ParameterMap,
    ) -> Result<RunHandle> {
        self.record(ClientCall::RunNotebook)?;
        self.run_parameters.lock().push(parameters.clone());
        Ok(RunHandle {
            run_id: Some(1),
            ..RunHandle::default()
        })
    }

    async fn get_run_state(&self, _station: &StationRef) -> Result<NotebookRunState> {
        self.record(ClientCall::GetRunState)?;
        let mut states = self.run_states.lock();
        Ok(next_scripted(
            &mut *states,
            NotebookRunState::terminated("SUCCESS"),
        ))
    }

    async fn export_notebook_output(&self, _station: &StationRef) -> Result<NotebookContent> {
        self.record(ClientCall::ExportNotebookOutput)?;
        Ok(self.export.clone())
    }

    async fn teardown_resource(
        &self,
        _station: &StationRef,
        kind: ResourceKind,
    ) -> Result<ResourceInfo> {
        self.record(ClientCall::TeardownResource(kind))?;
        Ok(serde_json::json!({}))
    }

    async fn delete_station(&self, _station: &StationRef) -> Result<()> {
        self.record(ClientCall::DeleteStation)
    }

    async fn list_stations(&self, _clean_room: &str) -> Result<Vec<StationInfo>> {
        self.record(ClientCall::ListStations)?;
        Ok(self.stations.clone())
    }

    async fn import_notebook(&self, path: &str, content: &NotebookContent) -> Result<()> {
        self.record(ClientCall::ImportNotebook)?;
        self.imports.lock().push((path.to_string(), content.clone()));
        Ok(())
    }

    async fn get_notebook_status(&self, path: &str) -> Result<NotebookMetadata> {
        self.record(ClientCall::GetNotebookStatus)?;
        Ok(NotebookMetadata {
            object_id: self.object_id,
            path: Some(path.to_string()),
            object_type: Some("NOTEBOOK".to_string()),
            language: None,
        })
    }
}
