use std::collections::BTreeSet;

use crate::error::StoreError;

/// Durable key-value substrate holding sets of strings.
///
/// Sets are unordered on the wire; `BTreeSet` only makes iteration
/// deterministic. `put_string_set` replaces the whole set atomically; an
/// empty set reads back as absent.
pub trait KeyValueStore: Send + Sync {
    fn get_string_set(&self, key: &str) -> Result<Option<BTreeSet<String>>, StoreError>;

    fn put_string_set(&self, key: &str, values: &BTreeSet<String>) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}
