//! # omsorg-settings
//!
//! Configuration for the omsorg chat service, loaded from three layers in
//! priority order:
//!
//! 1. **Compiled defaults** — [`OmsorgSettings::default()`]
//! 2. **Settings file** — JSON, deep-merged over defaults
//! 3. **Environment variables** — `OMSORG_*` overrides (highest priority)
//!
//! The LLM API key is never part of the file or this type; it is read from
//! the env var named by `gateway.api_key_env` at startup. There is no
//! global: the binary loads once and hands the value down.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path};
pub use types::*;
