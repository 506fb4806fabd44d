//! Lifecycle events.
//!
//! The controller reports each completed step to an [`EventSink`]. Event
//! types are dotted names; the ones emitted are listed in [`names`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event types emitted by the station controller.
pub mod names {
    /// Station created.
    pub const STATION_CREATED: &str = "station.created";
    /// One resource set up.
    pub const RESOURCE_SETUP: &str = "resource.setup";
    /// Workspace reached RUNNING.
    pub const WORKSPACE_READY: &str = "workspace.ready";
    /// Notebook run triggered.
    pub const NOTEBOOK_STARTED: &str = "notebook.started";
    /// Notebook run reached TERMINATED.
    pub const NOTEBOOK_COMPLETED: &str = "notebook.completed";
    /// Notebook output imported into the caller's workspace.
    pub const OUTPUT_IMPORTED: &str = "output.imported";
    /// One resource torn down.
    pub const RESOURCE_TEARDOWN: &str = "resource.teardown";
    /// A teardown step failed.
    pub const TEARDOWN_FAILED: &str = "teardown.failed";
    /// Station deleted.
    pub const STATION_DELETED: &str = "station.deleted";
}
