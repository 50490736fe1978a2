//! Application configuration loaded from `config.yaml`.

use crate::application::response_cache::DEFAULT_TTL_SECS;
use crate::domain::MetalSymbol;
use crate::infrastructure::fx_client::{DEFAULT_CURRENCY, DEFAULT_FX_URL};
use crate::infrastructure::http::DEFAULT_USER_AGENT;
use crate::infrastructure::resilience::{RetryPolicy, DEFAULT_RETRY_DELAY_MS, DEFAULT_TIMEOUT_MS};
use crate::infrastructure::stooq_client::DEFAULT_SERIES_BASE_URL;
use anyhow::{ensure, Context};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration.
///
/// Every section is optional; a missing key falls back to the production
/// default.
#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    /// Server configuration (host, port, CORS origins)
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream provider endpoints and resilience settings
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Metals included in the aggregate payload, in output order
    #[serde(default = "default_symbols")]
    pub symbols: Vec<MetalSymbol>,
}

/// Server configuration settings.
///
/// Defines how the HTTP server should bind and what CORS origins to allow.
#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on (default: 3010)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma-separated list of allowed CORS origins (default: "*")
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_fx_url")]
    pub fx_url: String,
    #[serde(default = "default_series_base_url")]
    pub series_base_url: String,
    /// ISO currency code the metals are converted into
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Per-attempt timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Pause before the single retry
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct CacheConfig {
    /// Freshness window for the in-process cache and the CDN max-age
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3010
}
fn default_allowed_origins() -> String {
    "*".to_string()
}
fn default_fx_url() -> String {
    DEFAULT_FX_URL.to_string()
}
fn default_series_base_url() -> String {
    DEFAULT_SERIES_BASE_URL.to_string()
}
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}
fn default_symbols() -> Vec<MetalSymbol> {
    MetalSymbol::ALL.to_vec()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            symbols: default_symbols(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            fx_url: default_fx_url(),
            series_base_url: default_series_base_url(),
            currency: default_currency(),
            timeout_ms: default_timeout_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl AppConfig {
    /// Read and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "Failed to read {} - ensure file exists in working directory",
                path.display()
            )
        })?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)
            .context("Failed to parse config - check YAML syntax and structure")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.symbols.is_empty(), "at least one symbol must be configured");
        let unique: BTreeSet<_> = self.symbols.iter().collect();
        ensure!(
            unique.len() == self.symbols.len(),
            "symbols must not contain duplicates"
        );
        ensure!(
            !self.upstream.currency.trim().is_empty(),
            "upstream.currency must not be empty"
        );
        ensure!(self.upstream.timeout_ms > 0, "upstream.timeout_ms must be positive");
        ensure!(self.cache.ttl_secs > 0, "cache.ttl_secs must be positive");
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.upstream.timeout_ms),
            Duration::from_millis(self.upstream.retry_delay_ms),
        )
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}
