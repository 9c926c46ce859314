//! # pulse-settings
//!
//! Layered configuration for the session engine.
//!
//! Settings are resolved from three layers (in priority order):
//! 1. **Compiled defaults** via [`PulseSettings::default()`]
//! 2. **User file** at `~/.pulse/settings.json`, deep-merged over defaults
//! 3. **Environment variables** prefixed `PULSE_` (highest priority)
//!
//! ```no_run
//! let settings = pulse_settings::load_settings().unwrap_or_default();
//! println!("session timeout: {}ms", settings.session.timeout_ms);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_settings, load_settings_from_path, pulse_home, resolve_db_path, settings_path,
};
pub use types::{LoggingSettings, PulseSettings, SessionSettings, StorageSettings};
