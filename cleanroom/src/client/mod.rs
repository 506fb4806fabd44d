//! Resource client for the platform's station API.
//!
//! [`ResourceClient`] is the seam between the lifecycle controller and the
//! platform. [`HttpResourceClient`] implements it over HTTP; tests substitute
//! scripted or mocked clients.

mod credentials;
mod http;

use async_trait::async_trait;

use crate::core::{
    NotebookContent, NotebookMetadata, NotebookRunState, ParameterMap, ResourceInfo,
    ResourceKind, RunHandle, SetupRequest, StationInfo, StationRef, WorkspaceStatus,
};
use crate::errors::Result;

pub use credentials::{CredentialProvider, EnvToken, StaticToken};
pub use http::HttpResourceClient;

/// Station-scoped resource operations.
///
/// Calls are not retried and carry no local state; the platform decides
/// whether a repeated setup or teardown is harmless.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Creates the station. Fails if it already exists.
    async fn create_station(&self, station: &StationRef) -> Result<StationInfo>;

    /// Sets up one resource on the station.
    async fn setup_resource(
        &self,
        station: &StationRef,
        request: &SetupRequest,
    ) -> Result<ResourceInfo>;

    /// Fetches the provisioning status of the station workspace.
    async fn get_workspace_status(&self, station: &StationRef) -> Result<WorkspaceStatus>;

    /// Starts the station notebook with the given base parameters.
    async fn run_notebook(
        &self,
        station: &StationRef,
        parameters: &ParameterMap,
    ) -> Result<RunHandle>;

    /// Fetches the state of the station notebook run.
    async fn get_run_state(&self, station: &StationRef) -> Result<NotebookRunState>;

    /// Exports the notebook output in importable form.
    async fn export_notebook_output(&self, station: &StationRef) -> Result<NotebookContent>;

    /// Tears down one resource on the station.
    async fn teardown_resource(
        &self,
        station: &StationRef,
        kind: ResourceKind,
    ) -> Result<ResourceInfo>;

    /// Deletes the station.
    async fn delete_station(&self, station: &StationRef) -> Result<()>;

    /// Lists the stations of a clean room.
    async fn list_stations(&self, clean_room: &str) -> Result<Vec<StationInfo>>;

    /// Imports a notebook into the caller's workspace.
    async fn import_notebook(&self, path: &str, content: &NotebookContent) -> Result<()>;

    /// Fetches metadata of a notebook in the caller's workspace.
    async fn get_notebook_status(&self, path: &str) -> Result<NotebookMetadata>;
}
