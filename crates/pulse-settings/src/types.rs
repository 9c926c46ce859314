//! Settings type definitions.
//!
//! All types use camelCase JSON keys and `#[serde(default)]`, so a partial
//! settings file only needs the fields it changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "session": { "timeoutMs": 30000 },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PulseSettings {
    /// Settings schema version.
    pub version: String,
    /// Session windowing behavior.
    pub session: SessionSettings,
    /// Where the session ledger is persisted.
    pub storage: StorageSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            session: SessionSettings::default(),
            storage: StorageSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl PulseSettings {
    /// Reject values the session engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.session.timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "session.timeoutMs must be greater than zero".into(),
            ));
        }
        if self.session.max_stored_sessions == 0 {
            return Err(SettingsError::InvalidValue(
                "session.maxStoredSessions must be at least 1".into(),
            ));
        }
        if self.session.storage_key.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "session.storageKey must not be empty".into(),
            ));
        }
        if self.storage.db_path.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "storage.dbPath must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Session windowing settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Background inactivity after which the next log starts a new session.
    pub timeout_ms: u64,
    /// How many past session boundaries are kept for correlation.
    pub max_stored_sessions: usize,
    /// Key the session ledger is stored under.
    pub storage_key: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 20_000,
            max_stored_sessions: 5,
            storage_key: "sessions".to_string(),
        }
    }
}

/// Persistence settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// SQLite database path. Relative paths resolve under `~/.pulse`.
    pub db_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: "pulse.db".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Emit JSON lines.
    pub json: bool,
    /// Per-module level overrides, e.g. `{"pulse_engine": "debug"}`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            modules: BTreeMap::new(),
        }
    }
}
