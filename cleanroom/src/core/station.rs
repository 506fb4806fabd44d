//! Station identity and the records exchanged with the platform.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::resource::ResourceKind;
use crate::errors::ConfigError;

/// String-to-string parameter mapping passed to the platform.
pub type ParameterMap = BTreeMap<String, String>;

/// Response of a setup or teardown call; the platform does not document its shape.
pub type ResourceInfo = serde_json::Value;

/// Identifies a station: one `(clean_room, station_name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationRef {
    /// Clean room the station belongs to.
    pub clean_room: String,
    /// Station name, unique within the clean room.
    pub station_name: String,
}

impl StationRef {
    /// Creates a station reference, rejecting empty identifiers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when either identifier is empty or blank.
    pub fn new(
        clean_room: impl Into<String>,
        station_name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let clean_room = clean_room.into();
        let station_name = station_name.into();
        if clean_room.trim().is_empty() || station_name.trim().is_empty() {
            return Err(ConfigError::new(
                "station",
                "Clean Room and Station Name must be non-empty",
            ));
        }
        Ok(Self {
            clean_room,
            station_name,
        })
    }
}

impl fmt::Display for StationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.clean_room, self.station_name)
    }
}

/// A station as reported by the platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    /// Station name, when reported.
    #[serde(default, alias = "name", skip_serializing_if = "Option::is_none")]
    pub station_name: Option<String>,
    /// Owning clean room, when reported.
    #[serde(default, alias = "clean_room_name", skip_serializing_if = "Option::is_none")]
    pub clean_room: Option<String>,
    /// Any other fields the platform returned.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Handle returned when a notebook run is triggered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunHandle {
    /// Platform run id, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<i64>,
    /// Any other fields the platform returned.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Exported notebook output, already in the form the import call expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookContent {
    /// Content to send to the import endpoint.
    pub content: String,
    /// Import format, e.g. `HTML`.
    pub format: String,
}

impl NotebookContent {
    /// Creates HTML notebook content.
    #[must_use]
    pub fn html(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            format: "HTML".to_string(),
        }
    }
}

/// Metadata of a notebook in the caller's workspace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookMetadata {
    /// Workspace object id, used to build the results link.
    pub object_id: i64,
    /// Workspace path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Object type, e.g. `NOTEBOOK`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    /// Notebook language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A collaborator notebook to attach to a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookRef {
    /// Collaborator that owns the notebook.
    pub collaborator: String,
    /// Notebook name within the clean room.
    pub name: String,
}

impl NotebookRef {
    /// Creates a notebook reference.
    #[must_use]
    pub fn new(collaborator: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            collaborator: collaborator.into(),
            name: name.into(),
        }
    }
}

/// Everything a dialect may need to set up one resource.
///
/// Dialects that use a uniform payload ignore the optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRequest {
    /// Kind of resource to set up.
    pub kind: ResourceKind,
    /// Output-table mapping for collaborator shares.
    pub output_tables: Option<ParameterMap>,
    /// Notebook to attach.
    pub notebook: Option<NotebookRef>,
}

impl SetupRequest {
    /// Creates a request carrying only the kind.
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            output_tables: None,
            notebook: None,
        }
    }

    /// Sets the output-table mapping.
    #[must_use]
    pub fn with_output_tables(mut self, output_tables: ParameterMap) -> Self {
        self.output_tables = Some(output_tables);
        self
    }

    /// Sets the notebook reference.
    #[must_use]
    pub fn with_notebook(mut self, notebook: NotebookRef) -> Self {
        self.notebook = Some(notebook);
        self
    }
}
