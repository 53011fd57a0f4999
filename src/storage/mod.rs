//! Key/value backing storage.
//!
//! Every persisted document is a JSON string under a well-known key (see [`keys`]).
//! The store behind the trait is external to this crate; [`MemoryStore`] stands in
//! for it in the binary and in tests.

pub mod keys;
pub mod memory;

pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Durable string-keyed document store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Reads and parses the JSON document under `key`. A missing key is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.set(key, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_as_none() {
        let store = MemoryStore::new();
        let value: Option<Vec<u64>> = read_json(&store, "nothing").unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn unparsable_value_is_corrupt() {
        let store = MemoryStore::new();
        store.set("orders", "{not json".to_string()).unwrap();
        let result: Result<Option<Vec<u64>>, _> = read_json(&store, "orders");
        assert!(matches!(result, Err(StorageError::Corrupt { ref key, .. }) if key == "orders"));
    }

    #[test]
    fn write_then_read() {
        let store = MemoryStore::new();
        write_json(&store, "lastOrderCheck", &42_i64).unwrap();
        assert_eq!(read_json::<i64>(&store, "lastOrderCheck").unwrap(), Some(42));
    }
}
