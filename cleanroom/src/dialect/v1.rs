//! First-generation station API.

use serde_json::json;

use super::{encode_segment, PlatformDialect, UNITY_CATALOG_API};
use crate::core::{NotebookContent, ResourceKind, SetupRequest, StationRef};
use crate::errors::{CleanRoomError, ConfigError, Result};

/// Stations nested under their clean room, set up with per-kind payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StationsV1;

impl StationsV1 {
    /// Numeric teardown code of a resource kind.
    fn teardown_code(kind: ResourceKind) -> Option<u8> {
        match kind {
            ResourceKind::NotebookServicePrincipal => Some(1),
            ResourceKind::CollaboratorShares => Some(2),
            ResourceKind::Workspace => Some(3),
            ResourceKind::Metastore => Some(4),
            ResourceKind::Notebook => None,
        }
    }
}

impl PlatformDialect for StationsV1 {
    fn name(&self) -> &'static str {
        "v1"
    }

    fn stations_path(&self, clean_room: &str) -> String {
        format!(
            "{UNITY_CATALOG_API}/clean-rooms/{}/stations",
            encode_segment(clean_room)
        )
    }

    fn station_path(&self, station: &StationRef) -> String {
        format!(
            "{}/{}",
            self.stations_path(&station.clean_room),
            encode_segment(&station.station_name)
        )
    }

    fn create_station_body(&self, station: &StationRef) -> serde_json::Value {
        json!({ "station_name": station.station_name })
    }

    fn list_stations_query(&self, _clean_room: &str) -> Vec<(String, String)> {
        Vec::new()
    }

    fn setup_body(&self, request: &SetupRequest) -> Result<serde_json::Value> {
        let fields = match request.kind {
            ResourceKind::CollaboratorShares => json!({
                "output_tables": request.output_tables.clone().unwrap_or_default()
            }),
            ResourceKind::Notebook => {
                let notebook = request.notebook.as_ref().ok_or_else(|| {
                    ConfigError::new("notebook", "v1 notebook setup needs a collaborator and name")
                })?;
                json!({
                    "notebook_collaborator": notebook.collaborator,
                    "notebook_name": notebook.name,
                })
            }
            ResourceKind::Metastore
            | ResourceKind::Workspace
            | ResourceKind::NotebookServicePrincipal => json!({}),
        };
        Ok(json!({ request.kind.field_name(): fields }))
    }

    fn teardown_body(&self, kind: ResourceKind) -> Result<serde_json::Value> {
        let code = Self::teardown_code(kind).ok_or_else(|| {
            ConfigError::new("resource kind", format!("{kind} cannot be torn down in v1"))
        })?;
        Ok(json!({ "resource": code }))
    }

    fn decode_export(&self, body: serde_json::Value) -> Result<NotebookContent> {
        body.get("views")
            .and_then(|views| views.get(0))
            .and_then(|view| view.get("content"))
            .and_then(serde_json::Value::as_str)
            .map(NotebookContent::html)
            .ok_or_else(|| {
                CleanRoomError::Serialization(
                    "export response has no views[0].content".to_string(),
                )
            })
    }
}
