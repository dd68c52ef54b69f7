//! The settings tree.

use serde::{Deserialize, Serialize};

/// Root settings for the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OmsorgSettings {
    /// HTTP listener.
    pub server: ServerSettings,
    /// SQLite database.
    pub database: DatabaseSettings,
    /// LLM gateway endpoint.
    pub gateway: GatewaySettings,
    /// Tracing filter.
    pub logging: LoggingSettings,
}

/// HTTP listener settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8287,
        }
    }
}

/// SQLite settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatabaseSettings {
    /// Path to the database file (created on first start).
    pub path: String,
    /// Pool size.
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "omsorg.db".to_string(),
            pool_size: 4,
        }
    }
}

/// LLM gateway settings. The API key itself is read from the env var named
/// by `api_key_env`, never from the settings file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewaySettings {
    /// Endpoint base URL (no trailing slash).
    pub base_url: String,
    /// Model ID.
    pub model: String,
    /// Name of the env var holding the API key.
    pub api_key_env: String,
    /// Max completion tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Whole-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: None,
            temperature: None,
            timeout_ms: 30_000,
        }
    }
}

/// Tracing settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `tracing-subscriber` env-filter directive, used when `RUST_LOG` is
    /// unset.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
