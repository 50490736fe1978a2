//! HTTP handlers for the metals quote endpoints.
//!
//! This is the single place where `QuoteError` becomes a user-visible
//! envelope: invalid input maps to 400, everything else to 500.

use crate::api::state::AppState;
use crate::application::{CacheState, CacheStats, CacheStatus};
use crate::domain::{AggregatePayload, ErrorPayload, MetalSymbol, QuoteError, SymbolQuotePayload};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, instrument, warn};
use utoipa::{IntoParams, ToSchema};

#[allow(unused_imports)]
use serde_json::json; // Used in utoipa::path examples

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Content type of every JSON response
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Diagnostic header carrying `HIT` or `MISS`
pub const CACHE_STATUS_HEADER: &str = "x-cache";

#[derive(Deserialize, IntoParams, Debug)]
pub struct SymbolQuery {
    /// Metal symbol, one of xauusd, xagusd, xptusd
    #[param(example = "xauusd")]
    pub symbol: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub cache: CacheState,
    pub cache_ttl_secs: u64,
    pub cache_stats: CacheStats,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.metals_service.cache();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
        cache: cache.state().await,
        cache_ttl_secs: cache.ttl().as_secs(),
        cache_stats: cache.stats(),
    })
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "system",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain"),
        (status = 404, description = "Metrics recorder not installed")
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Aggregated FX rate and converted metal quotes.
#[utoipa::path(
    get,
    path = "/v1/metals",
    tag = "metals",
    responses(
        (status = 200, description = "Aggregated quotes; x-cache reports HIT or MISS", body = AggregatePayload),
        (status = 500, description = "Upstream or parsing failure", body = ErrorPayload,
            example = json!({"success": false, "error": "network failure: series responded with status 503 Service Unavailable"})
        )
    )
)]
#[instrument(skip(state))]
pub async fn metals_handler(State(state): State<AppState>) -> Response {
    metrics::counter!("api_requests_total", "endpoint" => "metals").increment(1);

    match state.metals_service.get_metals().await {
        Ok((payload, status)) => cacheable(
            json_response(StatusCode::OK, payload.as_ref()),
            state.metals_service.cache().ttl(),
            Some(status),
        ),
        Err(e) => {
            error!("Aggregation failed: {}", e);
            error_response(&e)
        }
    }
}

/// Single-symbol USD quote.
#[utoipa::path(
    get,
    path = "/v1/metal",
    tag = "metals",
    params(SymbolQuery),
    responses(
        (status = 200, description = "Quote for one metal", body = SymbolQuotePayload),
        (status = 400, description = "Symbol missing or not allowed", body = ErrorPayload,
            example = json!({"success": false, "error": "invalid symbol"})
        ),
        (status = 500, description = "Upstream or parsing failure", body = ErrorPayload)
    )
)]
#[instrument(skip(state))]
pub async fn metal_handler(
    query: Result<Query<SymbolQuery>, QueryRejection>,
    State(state): State<AppState>,
) -> Response {
    metrics::counter!("api_requests_total", "endpoint" => "metal").increment(1);

    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!("Rejected query string: {}", rejection.body_text());
            return error_response(&QuoteError::InvalidSymbol);
        }
    };

    let symbol = match query.symbol.as_deref().map(str::parse::<MetalSymbol>) {
        Some(Ok(symbol)) => symbol,
        _ => return error_response(&QuoteError::InvalidSymbol),
    };

    match state.metals_service.get_quote(symbol).await {
        Ok(payload) => cacheable(
            json_response(StatusCode::OK, &payload),
            state.metals_service.cache().ttl(),
            None,
        ),
        Err(e) => {
            error!("Quote for {} failed: {}", symbol, e);
            error_response(&e)
        }
    }
}

fn error_response(e: &QuoteError) -> Response {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    json_response(status, &ErrorPayload::new(e.to_string()))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let content_type = [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))];

    match serde_json::to_vec(body) {
        Ok(bytes) => (status, content_type, bytes).into_response(),
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                content_type,
                r#"{"success":false,"error":"serialization failure"}"#,
            )
                .into_response()
        }
    }
}

/// Attach CDN cache headers to a successful response.
fn cacheable(mut response: Response, ttl: Duration, status: Option<CacheStatus>) -> Response {
    if !response.status().is_success() {
        return response;
    }

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs())) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    if let Some(status) = status {
        headers.insert(
            HeaderName::from_static(CACHE_STATUS_HEADER),
            HeaderValue::from_static(status.as_str()),
        );
    }
    response
}
