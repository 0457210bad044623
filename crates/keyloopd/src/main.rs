//! keyloopd - Keyloop Gateway Daemon
//!
//! Authenticates against the Keyloop dealer-management API and serves the
//! local customer, parts, brand and order endpoints.
//!
//! Usage:
//!   keyloopd [OPTIONS]
//!
//! Credentials come from `--config <file>`, flags, or `KEYLOOP_*`
//! environment variables; flags and environment win over the file.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use keyloop_api::{create_router, AppState};
use keyloop_client::KeyloopClient;
use keyloop_gateway::Gateway;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{FileConfig, Overrides};

const DEFAULT_LOG_FILTER: &str =
    "keyloopd=info,keyloop_api=info,keyloop_client=info,keyloop_gateway=info,tower_http=info";

#[derive(Parser)]
#[command(name = "keyloopd")]
#[command(author, version, about = "Keyloop gateway daemon")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "KEYLOOP_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "KEYLOOP_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "KEYLOOP_PORT")]
    port: Option<u16>,

    /// Keyloop API base URL
    #[arg(long, env = "KEYLOOP_BASE_URL")]
    base_url: Option<String>,

    /// OAuth client id
    #[arg(long, env = "KEYLOOP_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "KEYLOOP_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Enterprise identifier
    #[arg(long, env = "KEYLOOP_ENTERPRISE_ID")]
    enterprise_id: Option<String>,

    /// Store identifier
    #[arg(long, env = "KEYLOOP_STORE_ID")]
    store_id: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            base_url: self.base_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            enterprise_id: self.enterprise_id.clone(),
            store_id: self.store_id.clone(),
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    tracing::info!("Starting keyloopd (Keyloop Gateway Daemon)");

    let file = match &args.config {
        Some(path) => {
            tracing::info!("Loading config from: {}", path.display());
            FileConfig::load_from(path)?
        }
        None => FileConfig::default(),
    };
    let settings = config::resolve(file, args.overrides())?;

    let client = KeyloopClient::connect_with(settings.credentials.clone(), settings.client)
        .await
        .context("Failed to obtain a Keyloop access token")?;

    let gateway = Gateway::new(Arc::new(client))
        .with_enrichment_concurrency(settings.enrichment_concurrency);
    let app = create_router(AppState::new(gateway));

    let listener = tokio::net::TcpListener::bind((settings.host.as_str(), settings.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", settings.host, settings.port))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
