//! Configuration file handling for keyloopd
//!
//! An optional TOML file supplies defaults; command-line flags and
//! environment variables override it field by field.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use keyloop_client::ClientOptions;
use keyloop_core::Credentials;
use keyloop_gateway::DEFAULT_ENRICHMENT_CONCURRENCY;
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Contents of the TOML configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerSection,
    pub keyloop: KeyloopSection,
    pub upstream: UpstreamSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyloopSection {
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub enterprise_id: Option<String>,
    pub store_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpstreamSection {
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub enrichment_concurrency: Option<usize>,
}

impl FileConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Values taken from the command line or environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub enterprise_id: Option<String>,
    pub store_id: Option<String>,
}

/// Fully resolved daemon settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub client: ClientOptions,
    pub enrichment_concurrency: usize,
}

/// Merge overrides over the file; later wins
pub fn resolve(file: FileConfig, overrides: Overrides) -> Result<Settings> {
    let FileConfig {
        server,
        keyloop,
        upstream,
    } = file;

    let credentials = Credentials::new(
        overrides.base_url.or(keyloop.base_url).unwrap_or_default(),
        overrides.client_id.or(keyloop.client_id).unwrap_or_default(),
        overrides
            .client_secret
            .or(keyloop.client_secret)
            .unwrap_or_default(),
        overrides
            .enterprise_id
            .or(keyloop.enterprise_id)
            .unwrap_or_default(),
        overrides.store_id.or(keyloop.store_id).unwrap_or_default(),
    )
    .context("Invalid Keyloop configuration")?;

    let client = ClientOptions {
        timeout: Duration::from_secs(upstream.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        connect_timeout: Duration::from_secs(
            upstream
                .connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        ),
    };

    Ok(Settings {
        host: overrides
            .host
            .or(server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: overrides.port.or(server.port).unwrap_or(DEFAULT_PORT),
        credentials,
        client,
        enrichment_concurrency: upstream
            .enrichment_concurrency
            .unwrap_or(DEFAULT_ENRICHMENT_CONCURRENCY)
            .max(1),
    })
}
