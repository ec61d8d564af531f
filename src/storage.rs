// Key-value storage backends (local-storage semantics)

use crate::config::{StorageBackend, StorageConfig};
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, info};

const STORE_DIR: &str = ".tasktracker";
const CURRENT_VERSION: u32 = 1;

/// String-keyed, string-valued durable storage
///
/// Values are opaque to the backend; serialization is the caller's concern.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Open the backend named in the config
pub fn open(config: &StorageConfig) -> Result<Rc<dyn Storage>> {
    let storage: Rc<dyn Storage> = match config.backend {
        StorageBackend::File => Rc::new(FileStorage::open(&config.path)?),
        StorageBackend::Sqlite => Rc::new(SqliteStorage::open(&config.path)?),
        StorageBackend::Memory => Rc::new(MemoryStorage::new()),
    };
    info!(backend = ?config.backend, path = ?config.path, "Opened storage");
    Ok(storage)
}

/// Create `.tasktracker` under `path` and stamp its layout version
fn prepare_store_dir(path: &Path) -> Result<PathBuf> {
    let base_path = path.join(STORE_DIR);
    fs::create_dir_all(&base_path).context("Failed to create store directory")?;

    let version_path = base_path.join(".version");
    if !version_path.exists() {
        fs::write(version_path, CURRENT_VERSION.to_string())?;
    }
    Ok(base_path)
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// File backend
// ============================================================================

/// One file per key inside `.tasktracker/`
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = prepare_store_dir(path.as_ref())?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn lock(&self) -> Result<fs::File> {
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(".lock"))
            .context("Failed to open lock file")?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;
        Ok(lock)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", path)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        let tmp_path = self.base_path.join(format!("{}.tmp", key));

        // Lock is released when dropped
        let _lock = self.lock()?;

        let written = write_then_rename(&tmp_path, &path, value);
        if written.is_err() {
            // Leave no partial temp file behind
            let _ = fs::remove_file(&tmp_path);
        }
        written?;

        debug!(key, bytes = value.len(), "set_item: written");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.item_path(key)?;
        let _lock = self.lock()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", path)),
        }
    }
}

fn write_then_rename(tmp_path: &Path, path: &Path, value: &str) -> Result<()> {
    let mut file = fs::File::create(tmp_path).context("Failed to create temp file")?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    fs::rename(tmp_path, path).context("Failed to replace stored value")?;
    Ok(())
}

// ============================================================================
// SQLite backend
// ============================================================================

/// Key-value table in `.tasktracker/tasktracker.db`
pub struct SqliteStorage {
    db: Connection,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = prepare_store_dir(path.as_ref())?;

        let gitignore_path = base_path.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(gitignore_path, "tasktracker.db\ntasktracker.db-shm\ntasktracker.db-wal\n")?;
        }

        let db = Connection::open(base_path.join("tasktracker.db")).context("Failed to open SQLite database")?;
        Self::with_connection(db)
    }

    /// Backend over an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        Self::with_connection(db)
    }

    fn with_connection(db: Connection) -> Result<Self> {
        debug!("Creating database schema");
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(Self { db })
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .db
            .query_row("SELECT value FROM local_storage WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute(
            "INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, chrono::Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Volatile storage; nothing outlives the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
