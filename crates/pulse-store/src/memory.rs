use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Process-local store. Used by tests and by embedders with no durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sets: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a key directly, bypassing any validation a reader might apply.
    pub fn with_set<I, S>(self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets
            .write()
            .insert(key.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.sets.read().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string_set(&self, key: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
        Ok(self.sets.read().get(key).cloned())
    }

    fn put_string_set(&self, key: &str, values: &BTreeSet<String>) -> Result<(), StoreError> {
        let mut sets = self.sets.write();
        if values.is_empty() {
            sets.remove(key);
        } else {
            sets.insert(key.to_string(), values.clone());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.sets.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_string_set("sessions").unwrap().is_none());
    }

    #[test]
    fn put_replaces_whole_set() {
        let store = MemoryStore::new();
        store.put_string_set("k", &set(&["a", "b"])).unwrap();
        store.put_string_set("k", &set(&["c"])).unwrap();
        assert_eq!(store.get_string_set("k").unwrap(), Some(set(&["c"])));
    }

    #[test]
    fn remove_is_idempotent() {
        let store = MemoryStore::new().with_set("k", ["a"]);
        assert!(store.contains_key("k"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(!store.contains_key("k"));
    }

    #[test]
    fn empty_set_reads_back_absent() {
        let store = MemoryStore::new().with_set("k", ["a"]);
        store.put_string_set("k", &BTreeSet::new()).unwrap();
        assert!(store.get_string_set("k").unwrap().is_none());
    }

    #[test]
    fn keys_are_independent() {
        let store = MemoryStore::new();
        store.put_string_set("a", &set(&["1"])).unwrap();
        store.put_string_set("b", &set(&["2"])).unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get_string_set("b").unwrap(), Some(set(&["2"])));
    }
}
