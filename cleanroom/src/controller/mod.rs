//! Station lifecycle controller.
//!
//! Drives one station through creation, resource setup, the notebook run and
//! output collection, and later tears it down. The controller only talks to
//! [`ResourceClient`], so it is unaware of which platform dialect is in use.

mod controller_tests;
mod settings;

pub use settings::{ControllerSettings, NotebookRunRequest};

use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::client::ResourceClient;
use crate::core::{
    setup_kinds, validate_setup_order, validate_teardown_order, LifecycleStep, NotebookRef,
    NotebookRunState, ResourceKind, RunOutcome, SetupRequest, StationInfo, StationRef,
    TeardownReport, TeardownStep, TeardownTarget, WorkspaceStatus, PREPARE_PLAN,
    TEARDOWN_SEQUENCE,
};
use crate::errors::{CleanRoomError, ConfigError, NotebookRunFailedError, Result};
use crate::events::{names, EventSink, NoOpEventSink};
use crate::polling::poll_until;
use crate::utils::{local_iso_timestamp, output_notebook_path};

/// Runs the station lifecycle against a [`ResourceClient`].
pub struct StationController {
    client: Arc<dyn ResourceClient>,
    station: StationRef,
    settings: ControllerSettings,
    events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for StationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationController")
            .field("station", &self.station)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl StationController {
    /// Creates a controller for one station.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the built-in setup and teardown orders
    /// violate resource prerequisites.
    pub fn new(
        client: Arc<dyn ResourceClient>,
        station: StationRef,
        settings: ControllerSettings,
    ) -> Result<Self> {
        validate_setup_order(&setup_kinds(&PREPARE_PLAN))?;
        validate_teardown_order(&TEARDOWN_SEQUENCE)?;

        Ok(Self {
            client,
            station,
            settings,
            events: Arc::new(NoOpEventSink),
        })
    }

    /// Sends lifecycle events to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// The managed station.
    #[must_use]
    pub fn station(&self) -> &StationRef {
        &self.station
    }

    /// Controller settings.
    #[must_use]
    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Creates the station, sets up its resources, runs the notebook and
    /// imports the output into the owner's workspace.
    ///
    /// Stops at the first failure. Resources already created are left in
    /// place for [`teardown_station`](Self::teardown_station).
    ///
    /// # Errors
    ///
    /// - `ConfigError` when no output owner is configured, before any call
    /// - `ProvisioningFailed` when the workspace reports a fatal status
    /// - `NotebookRunFailed` when the run is skipped or hits an internal error
    /// - `Timeout` when either wait runs out
    /// - any client error, unchanged
    #[instrument(
        skip(self, request),
        fields(clean_room = %self.station.clean_room, station = %self.station.station_name)
    )]
    pub async fn prepare_and_run_notebook(
        &self,
        request: &NotebookRunRequest,
    ) -> Result<RunOutcome> {
        self.settings.require_output_owner()?;

        let mut final_state: Option<NotebookRunState> = None;

        for step in PREPARE_PLAN {
            match step {
                LifecycleStep::CreateStation => self.create_station().await?,
                LifecycleStep::Setup(kind) => self.setup(kind, request).await?,
                LifecycleStep::AwaitWorkspace => self.await_workspace().await?,
                LifecycleStep::RunNotebook => self.run_notebook(request).await?,
                LifecycleStep::AwaitRun => final_state = Some(self.await_run().await?),
                LifecycleStep::CollectOutput => {
                    let state = final_state.take().ok_or_else(|| {
                        ConfigError::new(
                            "lifecycle plan",
                            "output collected before the run finished",
                        )
                    })?;
                    return self.collect_output(state).await;
                }
            }
        }

        Err(ConfigError::new("lifecycle plan", "plan does not collect output").into())
    }

    async fn create_station(&self) -> Result<()> {
        let info = self.client.create_station(&self.station).await?;
        info!("Station created");
        self.events
            .emit(
                names::STATION_CREATED,
                Some(json!({
                    "clean_room": self.station.clean_room,
                    "station_name": self.station.station_name,
                    "info": info,
                })),
            )
            .await;
        Ok(())
    }

    async fn setup(&self, kind: ResourceKind, request: &NotebookRunRequest) -> Result<()> {
        let setup = match kind {
            ResourceKind::CollaboratorShares => {
                SetupRequest::new(kind).with_output_tables(request.output_tables.clone())
            }
            ResourceKind::Notebook => SetupRequest::new(kind).with_notebook(NotebookRef::new(
                request.collaborator.clone(),
                request.notebook_name.clone(),
            )),
            _ => SetupRequest::new(kind),
        };

        self.client.setup_resource(&self.station, &setup).await?;
        info!(resource = %kind, "{} setup complete", kind.label());
        self.events
            .emit(names::RESOURCE_SETUP, Some(json!({ "resource": kind })))
            .await;
        Ok(())
    }

    async fn await_workspace(&self) -> Result<()> {
        info!("Waiting for workspace provisioning");
        let polled = poll_until(
            &self.settings.workspace_poll,
            "workspace provisioning",
            || self.client.get_workspace_status(&self.station),
            WorkspaceStatus::is_ready,
            WorkspaceStatus::is_failed,
        )
        .await
        .map_err(|e| {
            e.into_error("workspace provisioning", |status| {
                CleanRoomError::provisioning_failed(status.as_str())
            })
        })?;

        info!(attempts = polled.attempts, "Workspace is running");
        self.events
            .emit(names::WORKSPACE_READY, Some(json!({ "attempts": polled.attempts })))
            .await;
        Ok(())
    }

    async fn run_notebook(&self, request: &NotebookRunRequest) -> Result<()> {
        let handle = self
            .client
            .run_notebook(&self.station, &request.notebook_parameters)
            .await?;
        info!(run_id = ?handle.run_id, "Notebook run started");
        self.events
            .emit(names::NOTEBOOK_STARTED, Some(json!({ "run_id": handle.run_id })))
            .await;
        Ok(())
    }

    async fn await_run(&self) -> Result<NotebookRunState> {
        let polled = poll_until(
            &self.settings.run_poll,
            "notebook run",
            || self.client.get_run_state(&self.station),
            |state: &NotebookRunState| state.life_cycle_state.is_terminated(),
            |state: &NotebookRunState| state.life_cycle_state.is_fatal(),
        )
        .await
        .map_err(|e| e.into_error("notebook run", run_failed))?;

        let state = polled.value;
        info!(
            attempts = polled.attempts,
            result_state = ?state.result_state,
            "Notebook run terminated"
        );
        self.events
            .emit(names::NOTEBOOK_COMPLETED, Some(json!({ "state": state })))
            .await;
        Ok(state)
    }

    async fn collect_output(&self, state: NotebookRunState) -> Result<RunOutcome> {
        let content = self.client.export_notebook_output(&self.station).await?;
        let owner = self.settings.require_output_owner()?;
        let path = output_notebook_path(owner, &local_iso_timestamp());

        self.client.import_notebook(&path, &content).await?;
        let metadata = self.client.get_notebook_status(&path).await?;
        let notebook_url = self.settings.notebook_url(metadata.object_id);

        info!(path = %path, url = %notebook_url, "Notebook output imported");
        self.events
            .emit(
                names::OUTPUT_IMPORTED,
                Some(json!({ "path": path, "url": notebook_url })),
            )
            .await;

        Ok(RunOutcome {
            state,
            notebook_url,
            notebook_path: path,
        })
    }

    /// Tears down every station resource and deletes the station.
    ///
    /// Each step is attempted even if an earlier one failed; failures are
    /// logged and recorded in the report.
    #[instrument(
        skip(self),
        fields(clean_room = %self.station.clean_room, station = %self.station.station_name)
    )]
    pub async fn teardown_station(&self) -> TeardownReport {
        let mut report = TeardownReport::new();

        for kind in TEARDOWN_SEQUENCE {
            let target = TeardownTarget::Resource(kind);
            let result = self.client.teardown_resource(&self.station, kind).await.map(|_| ());
            report.record(self.teardown_step(target, result).await);
        }

        let result = self.client.delete_station(&self.station).await;
        report.record(self.teardown_step(TeardownTarget::Station, result).await);

        if report.is_complete() {
            info!("Station torn down");
        } else {
            warn!(failed = report.failures().len(), "Station teardown incomplete");
        }
        report
    }

    async fn teardown_step(&self, target: TeardownTarget, result: Result<()>) -> TeardownStep {
        match result {
            Ok(()) => {
                info!(target = %target, "Teardown step complete");
                let event = match target {
                    TeardownTarget::Station => names::STATION_DELETED,
                    TeardownTarget::Resource(_) => names::RESOURCE_TEARDOWN,
                };
                self.events.emit(event, Some(json!({ "target": target }))).await;
                TeardownStep::ok(target)
            }
            Err(err) => {
                warn!(target = %target, error = %err, "Teardown step failed");
                self.events
                    .emit(
                        names::TEARDOWN_FAILED,
                        Some(json!({ "target": target, "error": err.to_string() })),
                    )
                    .await;
                TeardownStep::failed(target, err.to_string())
            }
        }
    }

    /// Lists the stations of this controller's clean room.
    pub async fn list_stations(&self) -> Result<Vec<StationInfo>> {
        self.client.list_stations(&self.station.clean_room).await
    }
}

fn run_failed(state: NotebookRunState) -> CleanRoomError {
    let message = state
        .state_message
        .clone()
        .unwrap_or_else(|| "run did not complete".to_string());
    let mut err = NotebookRunFailedError::new(state.life_cycle_state.as_str(), message);
    if let Some(result_state) = &state.result_state {
        err = err.with_result_state(result_state.as_str());
    }
    err.into()
}
