// Persistence gateway: the only path between the stores and durable storage

use crate::models::Task;
use crate::storage::Storage;
use crate::theme::DEFAULT_THEME;
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, error, warn};

/// Storage key holding the JSON task list
pub const TASKS_KEY: &str = "task-storage";

/// Storage key holding the bare theme name
pub const THEME_KEY: &str = "chat-theme";

/// Loads and saves store state through a [`Storage`] backend.
///
/// Never fails outward: read problems degrade to empty/default values and
/// write problems are logged and dropped, leaving in-memory state untouched.
#[derive(Clone)]
pub struct PersistenceGateway {
    storage: Rc<dyn Storage>,
}

impl PersistenceGateway {
    pub fn new(storage: Rc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn load_tasks(&self) -> Vec<Task> {
        let raw = match self.storage.get_item(TASKS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = TASKS_KEY, error = ?e, "Failed to read tasks, starting empty");
                return Vec::new();
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(v) => v,
            Err(e) => {
                warn!(key = TASKS_KEY, error = ?e, "Stored tasks are not valid JSON, starting empty");
                return Vec::new();
            }
        };

        let Value::Array(items) = value else {
            warn!(key = TASKS_KEY, "Stored tasks are not an array, starting empty");
            return Vec::new();
        };

        let mut tasks = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<Task>(item) {
                Ok(mut task) => {
                    task.normalize();
                    tasks.push(task);
                }
                Err(e) => {
                    warn!(key = TASKS_KEY, index, error = ?e, "Failed to parse task, skipping");
                }
            }
        }

        debug!(count = tasks.len(), "Loaded tasks");
        tasks
    }

    /// Returns whether the write reached storage
    pub fn save_tasks(&self, tasks: &[Task]) -> bool {
        let json = match serde_json::to_string(tasks) {
            Ok(json) => json,
            Err(e) => {
                error!(key = TASKS_KEY, error = ?e, "Failed to serialize tasks");
                return false;
            }
        };

        match self.storage.set_item(TASKS_KEY, &json) {
            Ok(()) => {
                debug!(count = tasks.len(), "Saved tasks");
                true
            }
            Err(e) => {
                error!(key = TASKS_KEY, error = ?e, "Failed to save tasks");
                false
            }
        }
    }

    pub fn load_theme(&self) -> String {
        match self.storage.get_item(THEME_KEY) {
            Ok(Some(theme)) if !theme.is_empty() => theme,
            Ok(_) => DEFAULT_THEME.to_string(),
            Err(e) => {
                warn!(key = THEME_KEY, error = ?e, "Failed to read theme, using default");
                DEFAULT_THEME.to_string()
            }
        }
    }

    /// Returns whether the write reached storage
    pub fn save_theme(&self, theme: &str) -> bool {
        match self.storage.set_item(THEME_KEY, theme) {
            Ok(()) => true,
            Err(e) => {
                error!(key = THEME_KEY, theme, error = ?e, "Failed to save theme");
                false
            }
        }
    }
}
