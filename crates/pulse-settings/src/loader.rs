//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`PulseSettings::default()`]
//! 2. If `~/.pulse/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `PULSE_*` environment variable overrides (highest priority)
//! 4. Validate
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::PulseSettings;

/// `~/.pulse`, or `/tmp/.pulse` when `HOME` is unset.
pub fn pulse_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".pulse")
}

/// Resolve the path to the settings file (`~/.pulse/settings.json`).
pub fn settings_path() -> PathBuf {
    pulse_home().join("settings.json")
}

/// Resolve a configured database path; relative paths live under [`pulse_home`].
pub fn resolve_db_path(settings: &PulseSettings) -> PathBuf {
    let configured = PathBuf::from(&settings.storage.db_path);
    if configured.is_absolute() {
        configured
    } else {
        pulse_home().join(configured)
    }
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<PulseSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or the result fails validation, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<PulseSettings> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

/// Like [`load_settings_from_path`] with an explicit variable lookup.
pub fn load_settings_with<F>(path: &Path, lookup: F) -> Result<PulseSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(PulseSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: PulseSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, lookup);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = match target_map.remove(&key) {
                    Some(target_val) => deep_merge(target_val, source_val),
                    None => source_val,
                };
                target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `PULSE_*` overrides using `lookup` to read variables.
///
/// Out-of-range or unparsable values are ignored with a warning.
pub fn apply_overrides<F>(settings: &mut PulseSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = checked(&lookup, "PULSE_SESSION_TIMEOUT_MS", |v| {
        parse_u64_range(v, 1, 86_400_000)
    }) {
        settings.session.timeout_ms = v;
    }
    if let Some(v) = checked(&lookup, "PULSE_MAX_STORED_SESSIONS", |v| {
        parse_usize_range(v, 1, 1_000)
    }) {
        settings.session.max_stored_sessions = v;
    }
    if let Some(v) = string("PULSE_STORAGE_KEY") {
        settings.session.storage_key = v;
    }
    if let Some(v) = string("PULSE_DB_PATH") {
        settings.storage.db_path = v;
    }
    if let Some(v) = checked(&lookup, "PULSE_LOG_LEVEL", parse_level) {
        settings.logging.level = v;
    }
    if let Some(v) = checked(&lookup, "PULSE_LOG_JSON", parse_bool) {
        settings.logging.json = v;
    }
}

fn checked<F, T>(lookup: &F, name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(name)?;
    let result = parse(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid env var, ignoring");
    }
    result
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Normalized tracing level name.
pub fn parse_level(val: &str) -> Option<String> {
    let lower = val.trim().to_lowercase();
    matches!(lower.as_str(), "error" | "warn" | "info" | "debug" | "trace").then_some(lower)
}
