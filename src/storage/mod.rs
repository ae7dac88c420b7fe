use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::{ConfigPaths, StorageOptions};

mod schema;

/// Durable scalar key/value store backing the journal mirror.
///
/// Every key is independent; there are no transactions across keys.
pub trait PersistenceAdapter {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<P: PersistenceAdapter + ?Sized> PersistenceAdapter for Arc<P> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// SQLite-backed adapter over a single `entries` table.
///
/// Cheap to clone. Each operation opens its own connection, so a failed
/// write never poisons later ones.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    inner: Arc<Location>,
}

#[derive(Debug)]
struct Location {
    path: PathBuf,
    wal_autocheckpoint: u32,
}

impl StorageHandle {
    fn open(&self) -> Result<Connection> {
        open_prepared(&self.inner.path, self.inner.wal_autocheckpoint)
    }

    pub fn database_path(&self) -> &Path {
        &self.inner.path
    }
}

impl PersistenceAdapter for StorageHandle {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        conn.query_row(
            "SELECT value FROM entries WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("reading entry {key}"))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .with_context(|| format!("writing entry {key}"))
        .map(drop)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM entries WHERE key = ?1", params![key])
            .with_context(|| format!("removing entry {key}"))
            .map(drop)
    }
}

/// In-process adapter. Clones share one map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl PersistenceAdapter for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Opens (creating if needed) the journal database and applies the schema.
pub fn init(paths: &ConfigPaths, storage: &StorageOptions) -> Result<StorageHandle> {
    let path = match storage.database_path.as_os_str().is_empty() {
        true => paths.database_path.clone(),
        false => storage.database_path.clone(),
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
    }
    let conn = open_prepared(&path, storage.wal_autocheckpoint)?;
    schema::apply(&conn)?;
    tracing::debug!(path = %path.display(), "journal storage ready");
    Ok(StorageHandle {
        inner: Arc::new(Location {
            path,
            wal_autocheckpoint: storage.wal_autocheckpoint,
        }),
    })
}

fn open_prepared(path: &Path, wal_autocheckpoint: u32) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("opening database {}", path.display()))?;
    for (name, value) in [
        ("journal_mode", "WAL".to_string()),
        ("synchronous", "NORMAL".to_string()),
        ("wal_autocheckpoint", wal_autocheckpoint.to_string()),
    ] {
        conn.pragma_update(None, name, &value)
            .with_context(|| format!("setting {name}={value}"))?;
    }
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_paths(root: &TempDir) -> ConfigPaths {
        let base = root.path();
        let config_dir = base.join("config");
        let data_dir = base.join("data");
        let state_dir = base.join("state");
        ConfigPaths {
            config_dir: config_dir.clone(),
            config_file: config_dir.join("config.toml"),
            data_dir: data_dir.clone(),
            database_path: data_dir.join("journal.db"),
            export_dir: data_dir.join("exports"),
            log_dir: state_dir.join("logs"),
            state_dir,
        }
    }

    fn init_storage() -> anyhow::Result<(TempDir, StorageHandle)> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        let storage = init(&paths, &StorageOptions::default())?;
        Ok((temp, storage))
    }

    #[test]
    fn set_overwrites_and_remove_clears() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        assert_eq!(storage.get("solace_entry")?, None);

        storage.set("solace_entry", "first")?;
        storage.set("solace_entry", "second")?;
        assert_eq!(storage.get("solace_entry")?.as_deref(), Some("second"));

        storage.remove("solace_entry")?;
        assert_eq!(storage.get("solace_entry")?, None);
        // removing a missing key is not an error
        storage.remove("solace_entry")?;
        Ok(())
    }

    #[test]
    fn entries_survive_a_new_handle() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        paths.ensure_directories()?;
        {
            let storage = init(&paths, &StorageOptions::default())?;
            storage.set("solace_lyrics", "here comes the sun")?;
        }
        let reopened = init(&paths, &StorageOptions::default())?;
        assert_eq!(
            reopened.get("solace_lyrics")?.as_deref(),
            Some("here comes the sun")
        );
        Ok(())
    }

    #[test]
    fn memory_store_clones_share_entries() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("solace_bgColor", "#ffe5b4")?;
        assert!(other.contains("solace_bgColor"));
        other.remove("solace_bgColor")?;
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn database_uses_wal_journal() -> anyhow::Result<()> {
        let (_temp, storage) = init_storage()?;
        storage.set("solace_entry", "x")?;
        let conn = Connection::open(storage.database_path())?;
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        assert_eq!(mode.to_lowercase(), "wal");
        Ok(())
    }
}
