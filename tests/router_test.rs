//! End-to-end tests for the HTTP router with in-memory upstream sources.
//!
//! The router is driven directly as a `tower::Service`, so no socket is bound.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use metals_quote_gateway::api::{create_router, AppState};
use metals_quote_gateway::application::{MetalsService, ResponseCache};
use metals_quote_gateway::domain::{
    Clock, ExchangeRate, MetalSymbol, QuoteError, RateSource, SeriesSource,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

const CSV: &str = "Date,Open,High,Low,Close,Volume\n2024-01-01,10,11,9,10,100\n2024-01-02,11,12,10,12,120\n";

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn new() -> Arc<Self> {
        Arc::new(Self(Mutex::new(Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap())))
    }

    fn advance(&self, secs: i64) {
        *self.0.lock().unwrap() += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct FakeRates {
    calls: AtomicUsize,
}

#[async_trait]
impl RateSource for FakeRates {
    async fn fetch_rate(&self) -> Result<ExchangeRate, QuoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ExchangeRate::new(1300.0)
    }
}

#[derive(Default)]
struct FakeSeries {
    calls: AtomicUsize,
    failing: Option<MetalSymbol>,
}

#[async_trait]
impl SeriesSource for FakeSeries {
    async fn fetch_series(&self, symbol: MetalSymbol) -> Result<String, QuoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing == Some(symbol) {
            return Err(QuoteError::Network("series responded with status 503 Service Unavailable".into()));
        }
        Ok(CSV.to_string())
    }
}

struct Harness {
    app: Router,
    clock: Arc<ManualClock>,
    rates: Arc<FakeRates>,
    series: Arc<FakeSeries>,
}

fn harness(series: FakeSeries) -> Harness {
    let clock = ManualClock::new();
    let rates = Arc::new(FakeRates::default());
    let series = Arc::new(series);
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(60), clock.clone()));
    let service = MetalsService::new(
        rates.clone(),
        series.clone(),
        cache,
        clock.clone(),
        MetalSymbol::ALL.to_vec(),
        "KRW",
    );
    let state = AppState {
        metals_service: Arc::new(service),
        metrics: None,
    };

    Harness {
        app: create_router(state, "*"),
        clock,
        rates,
        series,
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn test_metals_miss_then_hit_serves_identical_body() {
    let h = harness(FakeSeries::default());

    let (status, headers, first) = get(&h.app, "/v1/metals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-cache"], "MISS");
    assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=60");

    h.clock.advance(30);
    let (status, headers, second) = get(&h.app, "/v1/metals").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-cache"], "HIT");
    assert_eq!(first, second);

    assert_eq!(h.rates.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.series.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_metals_payload_shape() {
    let h = harness(FakeSeries::default());

    let (_, _, body) = get(&h.app, "/v1/metals").await;
    let json: Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["updated_at"], "2024-01-02T09:00:00.000Z");
    assert_eq!(json["currency"], "KRW");
    assert_eq!(json["fx_rate"], 1300.0);

    let gold = &json["instruments"]["xauusd"];
    assert_eq!(gold["symbol"], "xauusd");
    assert_eq!(gold["latest"]["date"], "2024-01-02");
    assert_eq!(gold["latest"]["close"], 12.0);
    assert_eq!(gold["previous"]["close"], 10.0);
    assert_eq!(gold["change"], 2.0);
    assert_eq!(gold["change_pct"], 20.0);
    assert_eq!(gold["converted_close"], 15600.0);
    assert_eq!(gold["converted_previous_close"], 13000.0);
    assert_eq!(gold["converted_change"], 2600.0);
    assert_eq!(gold["converted_change_pct"], 20.0);

    assert!(json["instruments"]["xagusd"].is_object());
    assert!(json["instruments"]["xptusd"].is_object());
}

#[tokio::test]
async fn test_expired_cache_refetches_exactly_once() {
    let h = harness(FakeSeries::default());

    get(&h.app, "/v1/metals").await;
    h.clock.advance(60);

    let (_, headers, _) = get(&h.app, "/v1/metals").await;
    assert_eq!(headers["x-cache"], "MISS");
    let (_, headers, _) = get(&h.app, "/v1/metals").await;
    assert_eq!(headers["x-cache"], "HIT");

    assert_eq!(h.rates.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.series.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_upstream_failure_returns_error_envelope_without_caching() {
    let h = harness(FakeSeries {
        failing: Some(MetalSymbol::Xagusd),
        ..Default::default()
    });

    let (status, headers, body) = get(&h.app, "/v1/metals").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
    assert!(headers.get("x-cache").is_none());
    assert!(headers.get(header::CACHE_CONTROL).is_none());

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(
        json["error"],
        "network failure: series responded with status 503 Service Unavailable"
    );

    let (_, _, health) = get(&h.app, "/health").await;
    let health: Value = serde_json::from_slice(&health).unwrap();
    assert_eq!(health["cache"], "cold");

    // Nothing was cached, so the next request fetches again.
    get(&h.app, "/v1/metals").await;
    assert_eq!(h.rates.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalid_symbol_is_rejected() {
    let h = harness(FakeSeries::default());

    for uri in [
        "/v1/metal?symbol=btcusd",
        "/v1/metal",
        "/v1/metal?symbol=xauusd&symbol=btcusd",
        "/v1/metal?symbol=xauusd&symbol=xagusd",
    ] {
        let (status, headers, body) = get(&h.app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json; charset=utf-8");
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "invalid symbol");
        assert_eq!(json["success"], false);
    }
    assert_eq!(h.series.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_single_symbol_quote() {
    let h = harness(FakeSeries::default());

    let (status, headers, body) = get(&h.app, "/v1/metal?symbol=XPTUSD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=60");

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["symbol"], "xptusd");
    assert_eq!(json["quote"]["change_pct"], 20.0);
    assert_eq!(h.rates.calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.series.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_health_reports_cache_state() {
    let h = harness(FakeSeries::default());

    let (status, _, body) = get(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["cache"], "cold");
    assert_eq!(json["cache_ttl_secs"], 60);

    get(&h.app, "/v1/metals").await;
    get(&h.app, "/v1/metals").await;

    let (_, _, body) = get(&h.app, "/health").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["cache"], "warm");
    assert_eq!(json["cache_stats"]["hits"], 1);
    assert_eq!(json["cache_stats"]["misses"], 1);

    h.clock.advance(61);
    let (_, _, body) = get(&h.app, "/health").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["cache"], "expired");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let h = harness(FakeSeries::default());

    let (status, _, body) = get(&h.app, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["paths"]["/v1/metals"].is_object());
    assert!(json["paths"]["/v1/metal"].is_object());
}

#[tokio::test]
async fn test_metrics_without_recorder_is_not_found() {
    let h = harness(FakeSeries::default());

    let (status, _, _) = get(&h.app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
