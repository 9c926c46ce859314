use std::time::Duration;

use pulse_settings::{PulseSettings, SessionSettings};
use pulse_store::{DEFAULT_CAPACITY, DEFAULT_STORAGE_KEY};

use crate::error::EngineError;

/// Session tracker configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Background inactivity after which the next log starts a new session.
    pub session_timeout: Duration,
    /// Capacity of the session ledger.
    pub max_stored_sessions: usize,
    /// Key the ledger is persisted under.
    pub storage_key: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(20),
            max_stored_sessions: DEFAULT_CAPACITY,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl TrackerConfig {
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn with_max_stored_sessions(mut self, max: usize) -> Self {
        self.max_stored_sessions = max;
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Build from loaded settings, re-validating them first.
    pub fn from_settings(settings: &PulseSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(Self::from(&settings.session))
    }

    pub(crate) fn timeout_ms(&self) -> u64 {
        u64::try_from(self.session_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl From<&SessionSettings> for TrackerConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            session_timeout: Duration::from_millis(settings.timeout_ms),
            max_stored_sessions: settings.max_stored_sessions,
            storage_key: settings.storage_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_settings_defaults() {
        let from_settings = TrackerConfig::from(&SessionSettings::default());
        assert_eq!(from_settings, TrackerConfig::default());
        assert_eq!(from_settings.timeout_ms(), 20_000);
    }

    #[test]
    fn builders() {
        let config = TrackerConfig::default()
            .with_session_timeout(Duration::from_millis(20))
            .with_max_stored_sessions(2)
            .with_storage_key("other");
        assert_eq!(config.timeout_ms(), 20);
        assert_eq!(config.max_stored_sessions, 2);
        assert_eq!(config.storage_key, "other");
    }

    #[test]
    fn from_settings_rejects_invalid() {
        let mut settings = PulseSettings::default();
        settings.session.storage_key = String::new();
        assert!(matches!(
            TrackerConfig::from_settings(&settings),
            Err(EngineError::Settings(_))
        ));
    }

    #[test]
    fn huge_timeout_saturates() {
        let config = TrackerConfig::default().with_session_timeout(Duration::MAX);
        assert_eq!(config.timeout_ms(), u64::MAX);
    }
}
