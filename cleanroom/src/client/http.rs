//! HTTP implementation of [`ResourceClient`].

use async_trait::async_trait;
use reqwest::{header, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{CredentialProvider, ResourceClient};
use crate::config::ClientConfig;
use crate::core::{
    NotebookContent, NotebookMetadata, NotebookRunState, ParameterMap, ResourceInfo,
    ResourceKind, RunHandle, SetupRequest, StationInfo, StationRef, WorkspaceStatus,
};
use crate::dialect::PlatformDialect;
use crate::errors::{AuthError, CleanRoomError, RemoteCallError, Result};

const WORKSPACE_IMPORT_PATH: &str = "/api/2.0/workspace/import";
const WORKSPACE_STATUS_PATH: &str = "/api/2.0/workspace/get-status";

#[derive(Debug, Deserialize)]
struct WorkspaceStatusResponse {
    workspace_status: WorkspaceStatus,
}

#[derive(Debug, Deserialize)]
struct RunStateResponse {
    state: NotebookRunState,
}

#[derive(Debug, Deserialize)]
struct ListStationsResponse {
    #[serde(default)]
    stations: Vec<StationInfo>,
}

#[derive(Debug, Deserialize)]
struct PlatformErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
}

/// Talks to the station API over HTTP with bearer authentication.
pub struct HttpResourceClient {
    http: reqwest::Client,
    base_url: String,
    dialect: Arc<dyn PlatformDialect>,
    credentials: Arc<dyn CredentialProvider>,
}

impl fmt::Debug for HttpResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResourceClient")
            .field("base_url", &self.base_url)
            .field("dialect", &self.dialect.name())
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl HttpResourceClient {
    /// Creates a client from configuration, using the configured dialect.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an invalid host, or `Transport` if the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url()?,
            dialect: config.dialect.build(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn station_action(&self, station: &StationRef, action: &str) -> String {
        format!("{}/{}", self.dialect.station_path(station), action)
    }

    /// Sends a request and converts non-2xx responses into errors.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let url = self.url(path);
        let token = self.credentials.bearer_token()?;

        let mut request = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, url = %url, "Sending platform request");
        let response = request.send().await?;
        check_response(&method, &url, response).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<T> {
        let response = self.send(method, path, query, body).await?;
        let text = response.text().await?;
        let payload = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(payload).map_err(|e| {
            CleanRoomError::Serialization(format!("unexpected response from {path}: {e}"))
        })
    }
}

/// Passes 2xx responses through; anything else becomes an error carrying the
/// platform's message and raw body.
async fn check_response(method: &Method, url: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = platform_message(status, &body);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AuthError::new(message)
            .with_status(status.as_u16())
            .with_body(body)
            .into());
    }

    Err(RemoteCallError::new(method.as_str(), url, status.as_u16(), message)
        .with_body(body)
        .into())
}

fn platform_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<PlatformErrorBody>(body)
        .ok()
        .and_then(|err| err.message.or(err.error_code))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string()
        })
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    #[instrument(skip(self), fields(dialect = self.dialect.name()))]
    async fn create_station(&self, station: &StationRef) -> Result<StationInfo> {
        let body = self.dialect.create_station_body(station);
        let path = self.dialect.stations_path(&station.clean_room);
        self.send_json(Method::POST, &path, &[], Some(&body)).await
    }

    #[instrument(skip(self, request), fields(resource = %request.kind))]
    async fn setup_resource(
        &self,
        station: &StationRef,
        request: &SetupRequest,
    ) -> Result<ResourceInfo> {
        let body = self.dialect.setup_body(request)?;
        let path = self.station_action(station, "setup-resource");
        self.send_json(Method::POST, &path, &[], Some(&body)).await
    }

    async fn get_workspace_status(&self, station: &StationRef) -> Result<WorkspaceStatus> {
        let path = self.station_action(station, "get-workspace-status");
        let response: WorkspaceStatusResponse =
            self.send_json(Method::GET, &path, &[], None).await?;
        Ok(response.workspace_status)
    }

    #[instrument(skip(self, parameters), fields(parameter_count = parameters.len()))]
    async fn run_notebook(
        &self,
        station: &StationRef,
        parameters: &ParameterMap,
    ) -> Result<RunHandle> {
        let body = json!({ "base_parameters": parameters });
        let path = self.station_action(station, "run-notebook");
        self.send_json(Method::POST, &path, &[], Some(&body)).await
    }

    async fn get_run_state(&self, station: &StationRef) -> Result<NotebookRunState> {
        let path = self.station_action(station, "get-notebook-run-state");
        let response: RunStateResponse = self.send_json(Method::GET, &path, &[], None).await?;
        Ok(response.state)
    }

    #[instrument(skip(self))]
    async fn export_notebook_output(&self, station: &StationRef) -> Result<NotebookContent> {
        let path = self.station_action(station, "export-notebook-output");
        let body: serde_json::Value = self.send_json(Method::GET, &path, &[], None).await?;
        self.dialect.decode_export(body)
    }

    #[instrument(skip(self))]
    async fn teardown_resource(
        &self,
        station: &StationRef,
        kind: ResourceKind,
    ) -> Result<ResourceInfo> {
        let body = self.dialect.teardown_body(kind)?;
        let path = self.station_action(station, "teardown-resource");
        self.send_json(Method::POST, &path, &[], Some(&body)).await
    }

    #[instrument(skip(self))]
    async fn delete_station(&self, station: &StationRef) -> Result<()> {
        let path = self.dialect.station_path(station);
        self.send(Method::DELETE, &path, &[], None).await?;
        Ok(())
    }

    async fn list_stations(&self, clean_room: &str) -> Result<Vec<StationInfo>> {
        let path = self.dialect.stations_path(clean_room);
        let query = self.dialect.list_stations_query(clean_room);
        let response: ListStationsResponse =
            self.send_json(Method::GET, &path, &query, None).await?;
        Ok(response.stations)
    }

    #[instrument(skip(self, content), fields(format = %content.format))]
    async fn import_notebook(&self, path: &str, content: &NotebookContent) -> Result<()> {
        let body = json!({
            "path": path,
            "content": content.content,
            "format": content.format,
        });
        self.send(Method::POST, WORKSPACE_IMPORT_PATH, &[], Some(&body))
            .await?;
        Ok(())
    }

    async fn get_notebook_status(&self, path: &str) -> Result<NotebookMetadata> {
        let query = [("path".to_string(), path.to_string())];
        self.send_json(Method::GET, WORKSPACE_STATUS_PATH, &query, None)
            .await
    }
}
