//! Metals Quote Gateway
//!
//! A small REST gateway that aggregates the USD exchange rate and daily
//! gold, silver and platinum series into one JSON payload, with a short-lived
//! in-process cache and matching CDN cache headers.
//!
//! # Architecture
//!
//! The API follows clean/onion architecture with clear separation of concerns:
//! - **Domain**: Quote entities, source traits and the error taxonomy
//! - **Application**: CSV extraction, quote math, response cache, aggregation
//! - **Infrastructure**: FX and price-history HTTP clients with timeout/retry
//! - **API**: HTTP handlers, routing, and middleware
//!
//! # Configuration
//!
//! The API is configured via `config.yaml` and environment variables:
//! - `CONFIG_PATH`: Path to the YAML configuration (default: config.yaml)
//! - `PORT`: Overrides `server.port`
//! - `RUST_LOG`: Logging level (default: info)
//! - `LOG_FORMAT`: `json` for structured logs, anything else for text
//!
//! # Quick Start
//!
//! ```bash
//! cargo run --release
//!
//! curl -i http://localhost:3010/v1/metals
//! curl "http://localhost:3010/v1/metal?symbol=xauusd"
//! curl http://localhost:3010/health
//! ```

use anyhow::Context;
use metals_quote_gateway::api::{create_router, AppState};
use metals_quote_gateway::application::{MetalsService, ResponseCache};
use metals_quote_gateway::config::AppConfig;
use metals_quote_gateway::domain::{Clock, SystemClock};
use metals_quote_gateway::infrastructure::{build_http_client, FxRateClient, StooqClient};
use std::env;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = EnvFilter::new(env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load Config
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = AppConfig::load(&config_path)?;
    tracing::info!("Loaded configuration from {}", config_path);

    let metrics = match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Prometheus recorder not installed, /metrics disabled: {}", e);
            None
        }
    };

    // Infrastructure
    let http_client =
        build_http_client(&config.upstream.user_agent).context("Failed to create HTTP client")?;
    let policy = config.retry_policy();
    let fx_client = Arc::new(FxRateClient::new(
        http_client.clone(),
        &config.upstream.fx_url,
        &config.upstream.currency,
        policy,
    ));
    let series_client = Arc::new(StooqClient::new(
        http_client,
        &config.upstream.series_base_url,
        policy,
    ));

    // Application
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(ResponseCache::new(config.cache_ttl(), clock.clone()));
    let currency = fx_client.currency().to_string();
    let metals_service = Arc::new(MetalsService::new(
        fx_client,
        series_client,
        cache,
        clock,
        config.symbols.clone(),
        currency,
    ));

    let state = AppState {
        metals_service,
        metrics,
    };

    let app = create_router(state, &config.server.allowed_origins);

    // Allow PORT env var override
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;
    tracing::info!("Metals quote gateway running at http://{}", addr);
    tracing::info!(
        "Symbols: {:?}, cache TTL: {}s",
        config.symbols,
        config.cache.ttl_secs
    );

    // Graceful shutdown handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error during operation")?;

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) to initiate graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
