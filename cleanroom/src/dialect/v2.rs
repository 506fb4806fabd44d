//! Second-generation station API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::json;

use super::{encode_segment, PlatformDialect, UNITY_CATALOG_API};
use crate::core::{NotebookContent, ResourceKind, SetupRequest, StationRef};
use crate::errors::{CleanRoomError, Result};

/// Flat station collection addressed as `{room}.{name}`, with uniform
/// `resource_type` payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StationsV2;

fn resource_body(kind: ResourceKind) -> serde_json::Value {
    json!({ "resource": { "resource_type": kind.wire_name() } })
}

impl PlatformDialect for StationsV2 {
    fn name(&self) -> &'static str {
        "v2"
    }

    fn stations_path(&self, _clean_room: &str) -> String {
        format!("{UNITY_CATALOG_API}/clean-room-stations")
    }

    fn station_path(&self, station: &StationRef) -> String {
        format!(
            "{UNITY_CATALOG_API}/clean-room-stations/{}.{}",
            encode_segment(&station.clean_room),
            encode_segment(&station.station_name)
        )
    }

    fn create_station_body(&self, station: &StationRef) -> serde_json::Value {
        json!({
            "clean_room": station.clean_room,
            "station_name": station.station_name,
        })
    }

    fn list_stations_query(&self, clean_room: &str) -> Vec<(String, String)> {
        vec![("clean_room_name".to_string(), clean_room.to_string())]
    }

    fn setup_body(&self, request: &SetupRequest) -> Result<serde_json::Value> {
        if request.output_tables.as_ref().is_some_and(|t| !t.is_empty()) {
            tracing::debug!(
                resource = %request.kind,
                "v2 setup ignores output table mapping"
            );
        }
        Ok(resource_body(request.kind))
    }

    fn teardown_body(&self, kind: ResourceKind) -> Result<serde_json::Value> {
        Ok(resource_body(kind))
    }

    fn decode_export(&self, body: serde_json::Value) -> Result<NotebookContent> {
        let contents = body
            .get("notebook_contents")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                CleanRoomError::Serialization(
                    "export response has no notebook_contents".to_string(),
                )
            })?;
        Ok(NotebookContent::html(STANDARD.encode(contents.as_bytes())))
    }
}
