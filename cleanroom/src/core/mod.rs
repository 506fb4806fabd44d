//! Core data types for clean room stations.
//!
//! This module provides:
//! - Resource kinds and their setup/teardown ordering
//! - Workspace and notebook run status values
//! - Station identity and platform records
//! - The lifecycle plan and phase outcomes

mod outcome;
mod resource;
mod station;
mod status;

pub use outcome::{
    results_link_html, setup_kinds, LifecycleStep, RunOutcome, TeardownReport, TeardownStep,
    TeardownTarget, PREPARE_PLAN,
};
pub use resource::{
    validate_setup_order, validate_teardown_order, ResourceKind, SETUP_SEQUENCE,
    TEARDOWN_SEQUENCE,
};
pub use station::{
    NotebookContent, NotebookMetadata, NotebookRef, ParameterMap, ResourceInfo, RunHandle,
    SetupRequest, StationInfo, StationRef,
};
pub use status::{LifeCycleState, NotebookRunState, ResultState, WorkspaceStatus};
