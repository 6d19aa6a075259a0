//! Durable key-value storage backing the processed-file table.
//!
//! The tracker only needs `get`, `put`, `delete` and a full `scan` over byte
//! keys and values, so any table-like store can back it. Batched writes go
//! through `put_all` and `delete_all`, which fall back to one call per key.
//! Two implementations ship with the crate:
//!
//! - [`InMemoryKeyValueStore`]: process-local, used by tests and dry runs
//! - [`JsonFileKeyValueStore`]: one JSON file per table, rewritten atomically
//!   once per mutation or batch
//!
//! Tables are looked up by name through a [`TableProvider`], which creates
//! them on first use.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use log::debug;

use crate::BatchError;

/// A key and its value, as returned by [`KeyValueStore::scan`].
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Byte-oriented key-value table.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BatchError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BatchError>;

    fn delete(&self, key: &[u8]) -> Result<(), BatchError>;

    /// Writes every entry. Stores that can should apply the batch atomically.
    fn put_all(&self, entries: &[KeyValue]) -> Result<(), BatchError> {
        for (key, value) in entries {
            self.put(key, value)?;
        }
        Ok(())
    }

    /// Deletes every key. Missing keys are ignored.
    fn delete_all(&self, keys: &[Vec<u8>]) -> Result<(), BatchError> {
        for key in keys {
            self.delete(key)?;
        }
        Ok(())
    }

    /// Returns every entry of the table, ordered by key.
    fn scan(&self) -> Result<Vec<KeyValue>, BatchError>;
}

/// Opens key-value tables by name.
pub trait TableProvider: Send + Sync {
    /// Opens the table, creating it when it does not exist yet.
    fn open_or_create(&self, table_name: &str) -> Result<Arc<dyn KeyValueStore>, BatchError>;
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, BatchError> {
    mutex
        .lock()
        .map_err(|e| BatchError::Store(format!("table lock poisoned: {}", e)))
}

/// Key-value table held in memory.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BatchError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BatchError> {
        lock(&self.entries)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), BatchError> {
        lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn scan(&self) -> Result<Vec<KeyValue>, BatchError> {
        Ok(lock(&self.entries)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Key-value table persisted as a JSON file.
///
/// The whole table is kept in memory and the file is rewritten through a
/// temporary sibling and a rename after every mutation, so a crash never
/// leaves a half-written table behind. A batch is written with a single
/// rewrite and is rolled back in memory when that rewrite fails.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl JsonFileKeyValueStore {
    /// Opens the table stored at `path`. A missing file is an empty table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BatchError> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let content = fs::read(&path)?;
            let pairs: Vec<KeyValue> = serde_json::from_slice(&content).map_err(|e| {
                BatchError::Store(format!("corrupted table file {}: {}", path.display(), e))
            })?;
            pairs.into_iter().collect()
        } else {
            BTreeMap::new()
        };

        debug!("Opened table {} with {} entries", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), BatchError> {
        let pairs: Vec<(&Vec<u8>, &Vec<u8>)> = entries.iter().collect();
        let content = serde_json::to_vec(&pairs)
            .map_err(|e| BatchError::Store(format!("unable to serialize table: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, BatchError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), BatchError> {
        let mut entries = lock(&self.entries)?;
        let previous = entries.insert(key.to_vec(), value.to_vec());

        if let Err(error) = self.persist(&entries) {
            match previous {
                Some(previous) => entries.insert(key.to_vec(), previous),
                None => entries.remove(key),
            };
            return Err(error);
        }
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), BatchError> {
        let mut entries = lock(&self.entries)?;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        if let Err(error) = self.persist(&entries) {
            entries.insert(key.to_vec(), previous);
            return Err(error);
        }
        Ok(())
    }

    fn put_all(&self, batch: &[KeyValue]) -> Result<(), BatchError> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut entries = lock(&self.entries)?;
        let previous: Vec<(&[u8], Option<Vec<u8>>)> = batch
            .iter()
            .map(|(key, value)| (key.as_slice(), entries.insert(key.clone(), value.clone())))
            .collect();

        if let Err(error) = self.persist(&entries) {
            for (key, previous) in previous.into_iter().rev() {
                match previous {
                    Some(previous) => entries.insert(key.to_vec(), previous),
                    None => entries.remove(key),
                };
            }
            return Err(error);
        }
        debug!("Wrote {} entries to {}", batch.len(), self.path.display());
        Ok(())
    }

    fn delete_all(&self, keys: &[Vec<u8>]) -> Result<(), BatchError> {
        let mut entries = lock(&self.entries)?;
        let removed: Vec<(&[u8], Vec<u8>)> = keys
            .iter()
            .filter_map(|key| Some((key.as_slice(), entries.remove(key)?)))
            .collect();
        if removed.is_empty() {
            return Ok(());
        }

        if let Err(error) = self.persist(&entries) {
            for (key, previous) in removed {
                entries.insert(key.to_vec(), previous);
            }
            return Err(error);
        }
        Ok(())
    }

    fn scan(&self) -> Result<Vec<KeyValue>, BatchError> {
        Ok(lock(&self.entries)?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Tables held in memory, shared across every `open_or_create` call.
#[derive(Default)]
pub struct InMemoryTables {
    tables: Mutex<HashMap<String, Arc<InMemoryKeyValueStore>>>,
}

impl InMemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the table if it was already created.
    pub fn get(&self, table_name: &str) -> Option<Arc<InMemoryKeyValueStore>> {
        lock(&self.tables).ok()?.get(table_name).cloned()
    }
}

impl TableProvider for InMemoryTables {
    fn open_or_create(&self, table_name: &str) -> Result<Arc<dyn KeyValueStore>, BatchError> {
        let mut tables = lock(&self.tables)?;
        let table = tables
            .entry(table_name.to_string())
            .or_insert_with(|| {
                debug!("Creating in-memory table {}", table_name);
                Arc::new(InMemoryKeyValueStore::new())
            })
            .clone();
        Ok(table)
    }
}

/// Tables stored as `<root>/<table name>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileTables {
    root: PathBuf,
}

impl JsonFileTables {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl TableProvider for JsonFileTables {
    fn open_or_create(&self, table_name: &str) -> Result<Arc<dyn KeyValueStore>, BatchError> {
        if table_name.is_empty() || table_name.contains(['/', '\\']) || table_name == ".." {
            return Err(BatchError::Configuration(format!(
                "Invalid table name: '{}'",
                table_name
            )));
        }
        fs::create_dir_all(&self.root)?;
        let store = JsonFileKeyValueStore::open(self.root.join(format!("{}.json", table_name)))?;
        Ok(Arc::new(store))
    }
}
