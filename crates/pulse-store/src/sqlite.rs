use std::collections::BTreeSet;

use tracing::instrument;

use crate::database::Database;
use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// [`KeyValueStore`] backed by the `string_sets` table.
///
/// An empty set is stored as no rows, so it reads back as absent.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl KeyValueStore for SqliteStore {
    #[instrument(skip(self))]
    fn get_string_set(&self, key: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT value FROM string_sets WHERE key = ?1")?;
            let values = stmt
                .query_map([key], |row| row.get::<_, String>(0))?
                .collect::<Result<BTreeSet<_>, _>>()?;
            Ok((!values.is_empty()).then_some(values))
        })
    }

    #[instrument(skip(self, values), fields(count = values.len()))]
    fn put_string_set(&self, key: &str, values: &BTreeSet<String>) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM string_sets WHERE key = ?1", [key])?;
            {
                let mut insert =
                    tx.prepare("INSERT INTO string_sets (key, value) VALUES (?1, ?2)")?;
                for value in values {
                    insert.execute(rusqlite::params![key, value])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM string_sets WHERE key = ?1", [key])?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn store() -> SqliteStore {
        SqliteStore::new(Database::in_memory().unwrap())
    }

    #[test]
    fn missing_key_is_none() {
        assert!(store().get_string_set("sessions").unwrap().is_none());
    }

    #[test]
    fn put_then_get() {
        let store = store();
        store.put_string_set("sessions", &set(&["1/a", "2/b"])).unwrap();
        assert_eq!(
            store.get_string_set("sessions").unwrap(),
            Some(set(&["1/a", "2/b"]))
        );
    }

    #[test]
    fn put_replaces_previous_members() {
        let store = store();
        store.put_string_set("sessions", &set(&["1/a", "2/b"])).unwrap();
        store.put_string_set("sessions", &set(&["2/b", "3/c"])).unwrap();
        assert_eq!(
            store.get_string_set("sessions").unwrap(),
            Some(set(&["2/b", "3/c"]))
        );
    }

    #[test]
    fn remove_deletes_key_only() {
        let store = store();
        store.put_string_set("sessions", &set(&["1/a"])).unwrap();
        store.put_string_set("other", &set(&["x"])).unwrap();
        store.remove("sessions").unwrap();
        store.remove("sessions").unwrap();
        assert!(store.get_string_set("sessions").unwrap().is_none());
        assert_eq!(store.get_string_set("other").unwrap(), Some(set(&["x"])));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pulse.db");
        {
            let store = SqliteStore::new(Database::open(&path).unwrap());
            store.put_string_set("sessions", &set(&["1/a"])).unwrap();
        }
        let store = SqliteStore::new(Database::open(&path).unwrap());
        assert_eq!(store.get_string_set("sessions").unwrap(), Some(set(&["1/a"])));
    }
}
