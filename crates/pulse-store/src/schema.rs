/// SQL DDL for the pulse-store database.
/// WAL mode enabled at connection time.
pub const SCHEMA_VERSION: u32 = 1;

/// One row per member of a named string set. A set that has never been
/// written and a removed set look the same: no rows for the key.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS string_sets (
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (key, value)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

pub const PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;
PRAGMA synchronous = NORMAL;
"#;
