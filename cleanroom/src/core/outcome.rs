//! Lifecycle plan and the outcome records produced by each phase.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::resource::ResourceKind;
use super::status::NotebookRunState;

/// One step of the prepare-and-run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStep {
    /// Create the station.
    CreateStation,
    /// Set up one resource.
    Setup(ResourceKind),
    /// Block until the workspace is `RUNNING`.
    AwaitWorkspace,
    /// Trigger the notebook run.
    RunNotebook,
    /// Block until the run is `TERMINATED`.
    AwaitRun,
    /// Export the output and import it into the caller's workspace.
    CollectOutput,
}

/// The prepare-and-run lifecycle, in execution order.
pub const PREPARE_PLAN: [LifecycleStep; 10] = [
    LifecycleStep::CreateStation,
    LifecycleStep::Setup(ResourceKind::Metastore),
    LifecycleStep::Setup(ResourceKind::CollaboratorShares),
    LifecycleStep::Setup(ResourceKind::Workspace),
    LifecycleStep::AwaitWorkspace,
    LifecycleStep::Setup(ResourceKind::NotebookServicePrincipal),
    LifecycleStep::Setup(ResourceKind::Notebook),
    LifecycleStep::RunNotebook,
    LifecycleStep::AwaitRun,
    LifecycleStep::CollectOutput,
];

/// Resource kinds set up by a plan, in order.
#[must_use]
pub fn setup_kinds(plan: &[LifecycleStep]) -> Vec<ResourceKind> {
    plan.iter()
        .filter_map(|step| match step {
            LifecycleStep::Setup(kind) => Some(*kind),
            _ => None,
        })
        .collect()
}

impl fmt::Display for LifecycleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateStation => write!(f, "create_station"),
            Self::Setup(kind) => write!(f, "setup_{}", kind.field_name()),
            Self::AwaitWorkspace => write!(f, "await_workspace"),
            Self::RunNotebook => write!(f, "run_notebook"),
            Self::AwaitRun => write!(f, "await_run"),
            Self::CollectOutput => write!(f, "collect_output"),
        }
    }
}

/// Result of a successful prepare-and-run phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Terminal run state.
    pub state: NotebookRunState,
    /// User-facing link to the imported results notebook.
    pub notebook_url: String,
    /// Workspace path the results were imported to.
    pub notebook_path: String,
}

impl RunOutcome {
    /// True when the notebook terminated with `SUCCESS`.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state.succeeded()
    }

    /// HTML anchor pointing at the results notebook.
    #[must_use]
    pub fn results_link_html(&self) -> String {
        results_link_html(&self.notebook_url)
    }
}

/// Renders the results anchor for a notebook URL.
#[must_use]
pub fn results_link_html(url: &str) -> String {
    format!("<a href='{url}'>Notebook Results</a>")
}

/// Something torn down at the end of a station's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "resource", rename_all = "snake_case")]
pub enum TeardownTarget {
    /// A station resource.
    Resource(ResourceKind),
    /// The station itself.
    Station,
}

impl fmt::Display for TeardownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(kind) => write!(f, "{kind}"),
            Self::Station => write!(f, "station"),
        }
    }
}

/// Outcome of one teardown call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownStep {
    /// What was torn down.
    pub target: TeardownTarget,
    /// Error message if the call failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TeardownStep {
    /// Creates a successful step.
    #[must_use]
    pub fn ok(target: TeardownTarget) -> Self {
        Self {
            target,
            error: None,
        }
    }

    /// Creates a failed step.
    #[must_use]
    pub fn failed(target: TeardownTarget, error: impl Into<String>) -> Self {
        Self {
            target,
            error: Some(error.into()),
        }
    }

    /// True if the call succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Every teardown call attempted, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownReport {
    /// Attempted steps.
    pub steps: Vec<TeardownStep>,
}

impl TeardownReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a step.
    pub fn record(&mut self, step: TeardownStep) {
        self.steps.push(step);
    }

    /// Steps that failed.
    #[must_use]
    pub fn failures(&self) -> Vec<&TeardownStep> {
        self.steps.iter().filter(|s| !s.succeeded()).collect()
    }

    /// True if every attempted step succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(TeardownStep::succeeded)
    }
}
