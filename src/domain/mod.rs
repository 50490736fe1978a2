//! Domain layer - Quote entities and the traits upstream sources implement.
//!
//! This module defines the domain model for the metals quote gateway,
//! following clean architecture principles. It contains:
//! - Source traits that define access to the FX and price-history providers
//! - Domain entities (price points, quotes, payloads)
//! - The shared error taxonomy
//! - The clock abstraction used for cache freshness

pub mod error;
pub mod quote_models;

pub use error::QuoteError;
pub use quote_models::*;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Source of the USD to target-currency exchange rate.
///
/// Implementations must be thread-safe (`Send + Sync`) for use in async
/// contexts.
///
/// # Implementations
///
/// See `infrastructure::fx_client::FxRateClient` for the HTTP implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetch the current rate.
    ///
    /// # Errors
    ///
    /// - `RateUnavailable` if the provider response has no usable rate
    /// - `Network` / `Timeout` if the provider cannot be reached after retry
    async fn fetch_rate(&self) -> Result<ExchangeRate, QuoteError>;
}

/// Source of raw daily OHLCV series text.
///
/// The body is returned as-is; validation happens in
/// `application::series::extract_latest_previous`.
///
/// # Implementations
///
/// See `infrastructure::stooq_client::StooqClient` for the HTTP implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Fetch the raw CSV body for one symbol.
    ///
    /// # Errors
    ///
    /// - `Network` / `Timeout` if the provider cannot be reached after retry
    async fn fetch_series(&self, symbol: MetalSymbol) -> Result<String, QuoteError>;
}

/// Wall-clock seam so cache freshness can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
