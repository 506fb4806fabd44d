//! File-backed handoff store.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::PhaseHandoffStore;
use crate::errors::{CleanRoomError, ConfigError, Result};

/// Stores each task's values as a JSON object in `<dir>/<task>.json`.
///
/// Values survive process restarts, so separate invocations of the run and
/// teardown phases can share them.
#[derive(Debug, Clone)]
pub struct FileHandoffStore {
    dir: PathBuf,
}

impl FileHandoffStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the values of `task`.
    pub fn task_file(&self, task: &str) -> Result<PathBuf> {
        let invalid = task.trim().is_empty()
            || task.contains(['/', '\\'])
            || task == "."
            || task == "..";
        if invalid {
            return Err(
                ConfigError::new("task key", format!("'{task}' is not a valid file name")).into(),
            );
        }
        Ok(self.dir.join(format!("{task}.json")))
    }

    async fn load(&self, path: &Path) -> Result<Map<String, Value>> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&text) {
            Ok(Value::Object(values)) => Ok(values),
            Ok(_) => Err(CleanRoomError::Handoff(format!(
                "{} does not hold a JSON object",
                path.display()
            ))),
            Err(e) => Err(CleanRoomError::Handoff(format!(
                "{} is not valid JSON: {e}",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl PhaseHandoffStore for FileHandoffStore {
    async fn get_value(&self, task: &str, key: &str) -> Result<Option<Value>> {
        let path = self.task_file(task)?;
        Ok(self.load(&path).await?.remove(key))
    }

    async fn set_value(&self, task: &str, key: &str, value: Value) -> Result<()> {
        let path = self.task_file(task)?;
        let mut values = self.load(&path).await?;
        values.insert(key.to_string(), value);

        tokio::fs::create_dir_all(&self.dir).await?;
        let staging = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(&Value::Object(values))?;
        tokio::fs::write(&staging, text).await?;
        tokio::fs::rename(&staging, &path).await?;

        tracing::debug!(task, key, path = %path.display(), "Stored handoff value");
        Ok(())
    }
}
