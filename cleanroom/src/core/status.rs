//! Workspace and notebook run status values reported by the platform.
//!
//! The platform may add states at any time, so each enum keeps unknown values
//! verbatim in an `Other` variant instead of failing to decode.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_backed_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this client does not know about.
            Other(String),
        }

        impl $name {
            /// Returns the wire representation.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(value) => value,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_backed_enum! {
    /// Provisioning status of a station workspace.
    WorkspaceStatus {
        /// Still being provisioned; keep polling.
        Provisioning => "PROVISIONING",
        /// Ready for use.
        Running => "RUNNING",
    }
}

string_backed_enum! {
    /// Life cycle state of a notebook run.
    LifeCycleState {
        /// Queued.
        Pending => "PENDING",
        /// Executing.
        Running => "RUNNING",
        /// Shutting down.
        Terminating => "TERMINATING",
        /// Finished; see the result state.
        Terminated => "TERMINATED",
        /// The run was skipped by the platform.
        Skipped => "SKIPPED",
        /// The platform failed to run the notebook.
        InternalError => "INTERNAL_ERROR",
    }
}

string_backed_enum! {
    /// Result of a terminated notebook run.
    ResultState {
        /// The notebook completed successfully.
        Success => "SUCCESS",
        /// The notebook raised an error.
        Failed => "FAILED",
        /// The run exceeded its time limit.
        TimedOut => "TIMEDOUT",
        /// The run was cancelled.
        Canceled => "CANCELED",
    }
}

impl WorkspaceStatus {
    /// True once the workspace can be used.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self == Self::Running
    }

    /// True for any status other than `PROVISIONING` or `RUNNING`.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        !matches!(self, Self::Provisioning | Self::Running)
    }
}

impl LifeCycleState {
    /// True once the run reached its terminal state.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        *self == Self::Terminated
    }

    /// True when the run can no longer produce a result.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Skipped | Self::InternalError)
    }
}

impl ResultState {
    /// True for `SUCCESS`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        *self == Self::Success
    }
}

/// State record of a station notebook run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookRunState {
    /// Where the run is in its life cycle.
    pub life_cycle_state: LifeCycleState,
    /// Outcome once terminated. Reported, never used for control flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_state: Option<ResultState>,
    /// Free-form message from the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_message: Option<String>,
}

impl NotebookRunState {
    /// Creates a state with no result.
    #[must_use]
    pub fn new(life_cycle_state: impl Into<LifeCycleState>) -> Self {
        Self {
            life_cycle_state: life_cycle_state.into(),
            result_state: None,
            state_message: None,
        }
    }

    /// Creates a terminated state with the given result.
    #[must_use]
    pub fn terminated(result_state: impl Into<ResultState>) -> Self {
        Self::new(LifeCycleState::Terminated).with_result_state(result_state)
    }

    /// Sets the result state.
    #[must_use]
    pub fn with_result_state(mut self, result_state: impl Into<ResultState>) -> Self {
        self.result_state = Some(result_state.into());
        self
    }

    /// Sets the state message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.state_message = Some(message.into());
        self
    }

    /// True when the run terminated with `SUCCESS`.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.life_cycle_state.is_terminated()
            && self.result_state.as_ref().is_some_and(ResultState::is_success)
    }
}
