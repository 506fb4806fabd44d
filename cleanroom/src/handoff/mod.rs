//! Values passed from the run phase to the teardown phase.
//!
//! The two phases usually run as separate tasks of one scheduled job, so
//! they share state through a [`PhaseHandoffStore`] keyed by task name.
//! [`HandoffScope`] binds a store to one task and converts values with serde.

mod file;
mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::errors::{CleanRoomError, Result};

pub use file::FileHandoffStore;
pub use memory::InMemoryHandoffStore;

/// Task key used when none is configured.
pub const DEFAULT_TASK_KEY: &str = "Step1";

/// Keys written by the run phase.
pub mod keys {
    /// Set to `true` before the station is created.
    pub const STATION_CREATED: &str = "station_created";
    /// Results link of the imported notebook.
    pub const NOTEBOOK_URL: &str = "notebook_url";
    /// Final notebook run state.
    pub const NOTEBOOK_RUN_STATE: &str = "notebook_run_state";
}

/// Per-task key/value storage shared between phases.
#[async_trait]
pub trait PhaseHandoffStore: Send + Sync {
    /// Reads a value written by `task`, if any.
    async fn get_value(&self, task: &str, key: &str) -> Result<Option<serde_json::Value>>;

    /// Writes a value on behalf of `task`, replacing any previous value.
    async fn set_value(&self, task: &str, key: &str, value: serde_json::Value) -> Result<()>;
}

/// A store bound to one task key.
#[derive(Clone)]
pub struct HandoffScope {
    store: Arc<dyn PhaseHandoffStore>,
    task: String,
}

impl std::fmt::Debug for HandoffScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffScope")
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

impl HandoffScope {
    /// Binds `store` to `task`.
    #[must_use]
    pub fn new(store: Arc<dyn PhaseHandoffStore>, task: impl Into<String>) -> Self {
        Self {
            store,
            task: task.into(),
        }
    }

    /// The bound task key.
    #[must_use]
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Reads and decodes a value.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(value) = self.store.get_value(&self.task, key).await? else {
            return Ok(None);
        };
        serde_json::from_value(value).map(Some).map_err(|e| {
            CleanRoomError::Handoff(format!("'{key}' of task '{}' is malformed: {e}", self.task))
        })
    }

    /// Encodes and writes a value.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.store.set_value(&self.task, key, value).await
    }

    /// Reads a boolean flag, treating a missing value as `false`.
    pub async fn flag(&self, key: &str) -> Result<bool> {
        Ok(self.get::<bool>(key).await?.unwrap_or(false))
    }
}
