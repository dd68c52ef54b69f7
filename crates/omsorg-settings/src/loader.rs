//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`OmsorgSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::OmsorgSettings;

/// Resolve the path to the settings file (`omsorg.json` in the working
/// directory unless `OMSORG_SETTINGS` points elsewhere).
pub fn settings_path() -> PathBuf {
    std::env::var("OMSORG_SETTINGS")
        .ok()
        .filter(|v| !v.is_empty())
        .map_or_else(|| PathBuf::from("omsorg.json"), PathBuf::from)
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<OmsorgSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<OmsorgSettings> {
    let defaults = serde_json::to_value(OmsorgSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: OmsorgSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Integers must be valid and within the specified range; invalid values
/// are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut OmsorgSettings) {
    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read_env_string("OMSORG_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("OMSORG_SERVER_PORT", 1, 65535) {
        settings.server.port = v;
    }

    // ── Database ────────────────────────────────────────────────────
    if let Some(v) = read_env_string("OMSORG_DB_PATH") {
        settings.database.path = v;
    }
    if let Some(v) = read_env_u32("OMSORG_DB_POOL_SIZE", 1, 64) {
        settings.database.pool_size = v;
    }

    // ── Gateway ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("OMSORG_GATEWAY_BASE_URL") {
        settings.gateway.base_url = v;
    }
    if let Some(v) = read_env_string("OMSORG_GATEWAY_MODEL") {
        settings.gateway.model = v;
    }
    if let Some(v) = read_env_string("OMSORG_GATEWAY_API_KEY_ENV") {
        settings.gateway.api_key_env = v;
    }
    if let Some(v) = read_env_u64("OMSORG_GATEWAY_TIMEOUT_MS", 1000, 600_000) {
        settings.gateway.timeout_ms = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("OMSORG_LOG") {
        settings.logging.filter = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
