use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use super::KeyValueStore;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct Faults {
    offline: bool,
    failing_keys: BTreeSet<String>,
}

/// In-memory [`KeyValueStore`]. Clones share the same entries, like two browser
/// tabs sharing one storage area.
///
/// Faults can be injected to exercise the storage-unavailable paths: the whole
/// store can be taken offline, or writes to single keys can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
    faults: Arc<RwLock<Faults>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut faults) = self.faults.write() {
            faults.offline = offline;
        }
    }

    pub fn fail_writes_to(&self, key: impl Into<String>) {
        if let Ok(mut faults) = self.faults.write() {
            faults.failing_keys.insert(key.into());
        }
    }

    pub fn clear_faults(&self) {
        if let Ok(mut faults) = self.faults.write() {
            *faults = Faults::default();
        }
    }

    fn check_online(&self) -> Result<(), StorageError> {
        let faults = self
            .faults
            .read()
            .map_err(|_| StorageError::Unavailable("fault table poisoned".to_string()))?;
        if faults.offline {
            return Err(StorageError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self, key: &str) -> Result<(), StorageError> {
        self.check_online()?;
        let faults = self
            .faults
            .read()
            .map_err(|_| StorageError::Unavailable("fault table poisoned".to_string()))?;
        if faults.failing_keys.contains(key) {
            return Err(StorageError::Unavailable(format!("write to {key} rejected")));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_online()?;
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("entries poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.check_writable(key)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("entries poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable(key)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StorageError::Unavailable("entries poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.check_online()?;
        let entries = self
            .entries
            .read()
            .map_err(|_| StorageError::Unavailable("entries poisoned".to_string()))?;
        Ok(entries.keys().cloned().collect())
    }
}
