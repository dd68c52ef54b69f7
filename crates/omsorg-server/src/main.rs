//! `omsorgd` — the omsorg chat service daemon.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use omsorg_chat::{AuditRecorder, ChatOrchestrator, ConsentService, EscalationService};
use omsorg_core::logging::init_tracing;
use omsorg_llm::{OpenAiConfig, OpenAiGateway};
use omsorg_server::http::{AppState, build_router};
use omsorg_server::metrics::install_recorder;
use omsorg_server::rpc::{MethodRegistry, RpcContext, handlers};
use omsorg_settings::{OmsorgSettings, load_settings, load_settings_from_path};
use omsorg_store::{ChatStore, open_pool};
use tracing::info;

/// Command line flags. Everything here overrides the settings file.
#[derive(Debug, Parser)]
#[command(name = "omsorgd", about = "Cancer-support chat service daemon")]
struct Cli {
    /// Path to the settings file (default: omsorg.json in the working
    /// directory, or $OMSORG_SETTINGS).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database file path override.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Listen port override.
    #[arg(long)]
    port: Option<u16>,
}

impl Cli {
    fn load_settings(&self) -> anyhow::Result<OmsorgSettings> {
        let mut settings = match &self.config {
            Some(path) => load_settings_from_path(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => load_settings().context("loading settings")?,
        };
        if let Some(db) = &self.db {
            settings.database.path = db.display().to_string();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;
    init_tracing(&settings.logging.filter);

    let api_key = std::env::var(&settings.gateway.api_key_env).with_context(|| {
        format!(
            "gateway API key env var {} is not set",
            settings.gateway.api_key_env
        )
    })?;

    let pool = open_pool(&settings.database.path, settings.database.pool_size)
        .with_context(|| format!("opening database at {}", settings.database.path))?;
    let store = Arc::new(ChatStore::new(pool));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(settings.gateway.timeout_ms))
        .build()
        .context("building HTTP client")?;
    let mut gateway_config = OpenAiConfig::new(api_key);
    gateway_config.model = settings.gateway.model.clone();
    gateway_config.base_url = Some(settings.gateway.base_url.clone());
    gateway_config.max_tokens = settings.gateway.max_tokens;
    gateway_config.temperature = settings.gateway.temperature;
    let gateway = Arc::new(OpenAiGateway::with_client(gateway_config, client));

    let audit = AuditRecorder::new(Arc::clone(&store));
    let orchestrator = ChatOrchestrator::new(Arc::clone(&store), gateway, audit.clone());
    let consent = ConsentService::new(Arc::clone(&store), audit.clone());
    let escalation = EscalationService::new(Arc::clone(&store), audit);
    let ctx = Arc::new(RpcContext::new(store, orchestrator, consent, escalation));

    let mut registry = MethodRegistry::new();
    handlers::register_all(&mut registry);
    let registry = Arc::new(registry);

    let state = AppState {
        registry: Arc::clone(&registry),
        ctx,
        metrics: install_recorder(),
    };
    let app = build_router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        addr = %listener.local_addr()?,
        model = %settings.gateway.model,
        methods = registry.methods().len(),
        "omsorgd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("omsorgd stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["omsorgd"]);
        assert!(cli.config.is_none());
        assert!(cli.db.is_none());
        assert!(cli.port.is_none());
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::parse_from([
            "omsorgd",
            "--config",
            "/etc/omsorg/omsorg.json",
            "--db",
            "/var/lib/omsorg/omsorg.db",
            "--port",
            "9090",
        ]);
        assert_eq!(
            cli.config.as_deref(),
            Some(std::path::Path::new("/etc/omsorg/omsorg.json"))
        );
        assert_eq!(cli.port, Some(9090));
    }

    #[test]
    fn cli_overrides_apply_to_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("omsorg.json");
        std::fs::write(&config, r#"{"server": {"port": 8000}}"#).unwrap();

        let cli = Cli::parse_from([
            "omsorgd",
            "--config",
            config.to_str().unwrap(),
            "--db",
            "/tmp/other.db",
            "--port",
            "9999",
        ]);
        let settings = cli.load_settings().unwrap();
        assert_eq!(settings.server.port, 9999);
        assert_eq!(settings.database.path, "/tmp/other.db");
    }
}
