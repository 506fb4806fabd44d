//! In-process handoff store.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::PhaseHandoffStore;
use crate::errors::Result;

type TaskValues = HashMap<String, serde_json::Value>;

/// Keeps values in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHandoffStore {
    tasks: Arc<Mutex<HashMap<String, TaskValues>>>,
}

impl InMemoryHandoffStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PhaseHandoffStore for InMemoryHandoffStore {
    async fn get_value(&self, task: &str, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self
            .tasks
            .lock()
            .get(task)
            .and_then(|values| values.get(key))
            .cloned())
    }

    async fn set_value(&self, task: &str, key: &str, value: serde_json::Value) -> Result<()> {
        self.tasks
            .lock()
            .entry(task.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}
