// tasktracker - local task tracker with write-through key-value persistence

pub mod clock;
pub mod config;
pub mod filter;
pub mod gateway;
pub mod id;
pub mod models;
pub mod storage;
pub mod store;
pub mod theme;
pub mod tracker;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock, format_timestamp};
pub use config::{Config, StorageBackend, StorageConfig};
pub use filter::{StatusFilter, TaskQuery};
pub use gateway::PersistenceGateway;
pub use models::{NewTask, Priority, Task, TaskUpdate};
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage};
pub use store::{SubscriptionId, TaskEvent, TaskStore, ValidationError};
pub use theme::{DEFAULT_THEME, THEMES, ThemeStore};
pub use tracker::TaskTracker;
