//! Local key-value persistence.
//!
//! Credentials, keyword rules and import sessions are stored as JSON strings
//! under fixed keys. The store is injected wherever persistence is needed, so
//! tests use [`MemoryStore`] and the CLI uses [`JsonFileStore`].

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::warn;

use crate::{EngineError, ResultEngine};

/// String key-value storage shared by every component of a process.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> ResultEngine<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ResultEngine<()>;

    /// Removes every key in a single write.
    fn remove_all(&self, keys: &[&str]) -> ResultEngine<()>;

    fn remove(&self, key: &str) -> ResultEngine<()> {
        self.remove_all(&[key])
    }
}

/// Reads and decodes a JSON value. A missing key yields `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> ResultEngine<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> ResultEngine<()> {
    let payload = serde_json::to_string(value)?;
    store.set(key, &payload)
}

/// A stored JSON array split into the entries that decode as `T` and the
/// raw entries that do not.
#[derive(Debug)]
pub struct StoredList<T> {
    pub items: Vec<T>,
    pub unreadable: Vec<Value>,
}

impl<T> Default for StoredList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            unreadable: Vec::new(),
        }
    }
}

/// Reads a JSON array entry by entry. A missing key is an empty list; a
/// value that is not an array is an error.
pub fn read_list<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> ResultEngine<StoredList<T>> {
    let Some(entries) = read_json::<Vec<Value>>(store, key)? else {
        return Ok(StoredList::default());
    };
    let mut list = StoredList::default();
    for entry in entries {
        match serde_json::from_value::<T>(entry.clone()) {
            Ok(item) => list.items.push(item),
            Err(err) => {
                warn!(key, %err, "skipping unreadable stored entry");
                list.unreadable.push(entry);
            }
        }
    }
    Ok(list)
}

/// Writes `items`, followed by the untouched unreadable entries.
pub fn write_list<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
    unreadable: &[Value],
) -> ResultEngine<()> {
    let mut entries = Vec::with_capacity(items.len() + unreadable.len());
    for item in items {
        entries.push(serde_json::to_value(item)?);
    }
    entries.extend_from_slice(unreadable);
    write_json(store, key, &entries)
}

fn lock<T>(mutex: &Mutex<T>) -> ResultEngine<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| EngineError::Storage("store lock poisoned".to_string()))
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ResultEngine<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ResultEngine<()> {
        lock(&self.entries)?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> ResultEngine<()> {
        let mut entries = lock(&self.entries)?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Store backed by one pretty-printed JSON object on disk.
///
/// The whole file is rewritten on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the file at `path`; a missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> ResultEngine<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> ResultEngine<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> ResultEngine<Option<String>> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ResultEngine<()> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove_all(&self, keys: &[&str]) -> ResultEngine<()> {
        let mut entries = lock(&self.entries)?;
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if changed {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_remove_all_clears_every_key() {
        let store = MemoryStore::new();
        store.set("token", "a").unwrap();
        store.set("refreshToken", "b").unwrap();
        store.set("keep", "c").unwrap();
        store.remove_all(&["token", "refreshToken"]).unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        assert_eq!(store.get("refreshToken").unwrap(), None);
        assert_eq!(store.get("keep").unwrap().as_deref(), Some("c"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/local.json");

        let store = JsonFileStore::open(&path).unwrap();
        write_json(&store, "numbers", &vec![1, 2, 3]).unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).unwrap();
        let numbers: Option<Vec<i32>> = read_json(&reopened, "numbers").unwrap();
        assert_eq!(numbers, Some(vec![1, 2, 3]));
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }
}
