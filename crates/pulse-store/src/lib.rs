pub mod database;
pub mod error;
pub mod kv;
pub mod memory;
pub mod schema;
pub mod sessions;
pub mod sqlite;

pub use database::Database;
pub use error::StoreError;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;
pub use sessions::{SessionLedger, DEFAULT_CAPACITY, DEFAULT_STORAGE_KEY};
pub use sqlite::SqliteStore;
