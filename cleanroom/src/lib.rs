//! # Cleanroom
//!
//! Orchestrates clean room stations on a managed data platform.
//!
//! A station is an isolated compute environment scoped to one clean room.
//! This crate drives a station through its whole life:
//!
//! - **Provisioning**: create the station and set up its metastore, shares,
//!   workspace, service principal and notebook in prerequisite order
//! - **Execution**: run a collaborator notebook and wait for it to finish
//! - **Collection**: import the notebook output into the caller's workspace
//! - **Teardown**: remove every resource and the station, attempting each step
//!
//! Two incompatible generations of the station API are supported through
//! [`dialect::Dialect`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cleanroom::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ClientConfig::new("https://my-workspace.example.com");
//! let client = HttpResourceClient::new(&config, Arc::new(EnvToken::default()))?;
//! let station = StationRef::new("my_clean_room", "station-1")?;
//! let controller =
//!     StationController::new(Arc::new(client), station, ControllerSettings::new("me@example.com"))?;
//!
//! let outcome = controller
//!     .prepare_and_run_notebook(&NotebookRunRequest::new("partner", "analysis"))
//!     .await?;
//! println!("{}", outcome.results_link_html());
//!
//! let report = controller.teardown_station().await;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod client;
pub mod config;
pub mod controller;
pub mod core;
pub mod dialect;
pub mod errors;
pub mod events;
pub mod handoff;
pub mod observability;
pub mod orchestrator;
pub mod polling;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::client::{
        CredentialProvider, EnvToken, HttpResourceClient, ResourceClient, StaticToken,
    };
    pub use crate::config::{parse_parameters, ClientConfig, PollingConfig};
    pub use crate::controller::{ControllerSettings, NotebookRunRequest, StationController};
    pub use crate::core::{
        NotebookRunState, ParameterMap, ResourceKind, RunOutcome, StationInfo, StationRef,
        TeardownReport, WorkspaceStatus,
    };
    pub use crate::dialect::Dialect;
    pub use crate::errors::{CleanRoomError, Result};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::handoff::{
        FileHandoffStore, HandoffScope, InMemoryHandoffStore, PhaseHandoffStore,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::orchestrator::{run_phase, teardown_phase, TeardownPhaseSummary};
    pub use crate::polling::PollPolicy;
}
