// Application state holder wiring both stores to one gateway

use crate::clock::{Clock, SystemClock};
use crate::config::StorageConfig;
use crate::gateway::PersistenceGateway;
use crate::storage::{self, MemoryStorage, Storage};
use crate::store::TaskStore;
use crate::theme::ThemeStore;
use std::rc::Rc;
use tracing::warn;

/// Task and theme state for one session
pub struct TaskTracker {
    pub tasks: TaskStore,
    pub theme: ThemeStore,
}

impl TaskTracker {
    /// Open the configured backend and load both stores from it
    ///
    /// A backend that cannot be opened is logged and replaced by volatile
    /// in-memory storage, so the session still runs with empty state.
    pub fn open(config: &StorageConfig) -> Self {
        let storage: Rc<dyn Storage> = match storage::open(config) {
            Ok(storage) => storage,
            Err(e) => {
                warn!(error = ?e, backend = ?config.backend, path = ?config.path, "Failed to open storage, falling back to memory");
                Rc::new(MemoryStorage::new())
            }
        };
        Self::with_storage(storage, Rc::new(SystemClock))
    }

    pub fn with_storage(storage: Rc<dyn Storage>, clock: Rc<dyn Clock>) -> Self {
        let gateway = PersistenceGateway::new(storage);
        Self {
            tasks: TaskStore::load(gateway.clone(), clock),
            theme: ThemeStore::load(gateway),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use crate::models::NewTask;
    use tempfile::TempDir;

    #[test]
    fn test_open_file_backend_roundtrip() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: temp.path().to_path_buf(),
        };

        {
            let mut tracker = TaskTracker::open(&config);
            tracker.tasks.add_task(NewTask::new("Persist me")).unwrap();
            tracker.theme.set_theme("forest");
        }

        let tracker = TaskTracker::open(&config);
        assert_eq!(tracker.tasks.len(), 1);
        assert_eq!(tracker.tasks.tasks()[0].name, "Persist me");
        assert_eq!(tracker.theme.theme(), "forest");
    }

    #[test]
    fn test_open_sqlite_backend_roundtrip() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            path: temp.path().to_path_buf(),
        };

        {
            let mut tracker = TaskTracker::open(&config);
            tracker.tasks.add_task(NewTask::new("In sqlite")).unwrap();
        }

        let tracker = TaskTracker::open(&config);
        assert_eq!(tracker.tasks.tasks()[0].name, "In sqlite");
        assert_eq!(tracker.theme.theme(), "nord");
    }

    #[test]
    fn test_open_falls_back_to_memory() {
        let temp = TempDir::new().unwrap();
        // A plain file where the store directory should go
        std::fs::write(temp.path().join(".tasktracker"), "not a directory").unwrap();
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: temp.path().to_path_buf(),
        };

        let mut tracker = TaskTracker::open(&config);
        assert!(tracker.tasks.is_empty());
        assert_eq!(tracker.theme.theme(), "nord");

        tracker.tasks.add_task(NewTask::new("Still works")).unwrap();
        tracker.theme.set_theme("forest");
        assert_eq!(tracker.tasks.tasks()[0].name, "Still works");
        assert_eq!(tracker.theme.theme(), "forest");

        // Nothing reached disk
        assert!(temp.path().join(".tasktracker").is_file());
        assert!(TaskTracker::open(&config).tasks.is_empty());
    }

    #[test]
    fn test_stores_share_storage() {
        let storage: Rc<dyn Storage> = Rc::new(MemoryStorage::new());
        let mut tracker = TaskTracker::with_storage(storage.clone(), Rc::new(SystemClock));
        tracker.tasks.add_task(NewTask::new("Shared")).unwrap();
        tracker.theme.set_theme("dim");

        assert!(storage.get_item(crate::gateway::TASKS_KEY).unwrap().is_some());
        assert_eq!(storage.get_item(crate::gateway::THEME_KEY).unwrap().as_deref(), Some("dim"));
    }
}
