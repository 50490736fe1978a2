//! Metals quote service with cache-first approach.
//!
//! On a cache miss this service fetches the FX rate and every configured
//! metal series concurrently, turns each series into a quote, projects it
//! into the target currency and stores the assembled payload.

use crate::application::quote::{compute_quote, convert_quote};
use crate::application::response_cache::{CacheStatus, ResponseCache};
use crate::application::series::extract_latest_previous;
use crate::domain::{
    AggregatePayload, Clock, MetalSymbol, QuoteError, QuoteSample, RateSource, SeriesSource,
    SymbolQuotePayload,
};
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Metals quote service
///
/// Serves the aggregated payload from the response cache when fresh and
/// re-aggregates from the upstream sources otherwise. Aggregation is
/// all-or-nothing: a failure in any fetch fails the whole cycle and leaves
/// the cache untouched.
pub struct MetalsService {
    rates: Arc<dyn RateSource>,
    series: Arc<dyn SeriesSource>,
    cache: Arc<ResponseCache>,
    clock: Arc<dyn Clock>,
    symbols: Vec<MetalSymbol>,
    currency: String,
}

impl MetalsService {
    pub fn new(
        rates: Arc<dyn RateSource>,
        series: Arc<dyn SeriesSource>,
        cache: Arc<ResponseCache>,
        clock: Arc<dyn Clock>,
        symbols: Vec<MetalSymbol>,
        currency: impl Into<String>,
    ) -> Self {
        let currency = currency.into();
        info!(
            "Initialized MetalsService for {:?} converted to {}",
            symbols, currency
        );
        Self {
            rates,
            series,
            cache,
            clock,
            symbols,
            currency,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Get the aggregated payload, from cache when fresh.
    #[instrument(skip(self))]
    pub async fn get_metals(&self) -> Result<(Arc<AggregatePayload>, CacheStatus), QuoteError> {
        if let Some(payload) = self.cache.get().await {
            return Ok((payload, CacheStatus::Hit));
        }

        info!("Cache miss, aggregating from upstream providers");
        let payload = Arc::new(self.aggregate().await?);
        self.cache.set(payload.clone()).await;

        Ok((payload, CacheStatus::Miss))
    }

    /// Run one full aggregation cycle without touching the cache.
    ///
    /// The FX fetch and every metal fetch are polled concurrently and all of
    /// them are awaited; the first error (FX first, then metals in configured
    /// order) is returned only after every fetch has settled.
    pub async fn aggregate(&self) -> Result<AggregatePayload, QuoteError> {
        let quotes = join_all(self.symbols.iter().map(|&symbol| self.fetch_quote(symbol)));
        let (rate, quotes) = futures::join!(self.rates.fetch_rate(), quotes);

        let rate = rate.inspect_err(|e| warn!("FX rate fetch failed: {}", e))?;

        let mut instruments = BTreeMap::new();
        for (&symbol, quote) in self.symbols.iter().zip(quotes) {
            let quote = quote?;
            instruments.insert(
                symbol.as_str().to_string(),
                convert_quote(symbol, quote, rate),
            );
        }

        Ok(AggregatePayload {
            success: true,
            updated_at: iso_timestamp(self.clock.now()),
            currency: self.currency.clone(),
            fx_rate: rate.value(),
            instruments,
        })
    }

    /// Get a single symbol's USD quote, bypassing the aggregate cache.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn get_quote(&self, symbol: MetalSymbol) -> Result<SymbolQuotePayload, QuoteError> {
        let quote = self.fetch_quote(symbol).await?;

        Ok(SymbolQuotePayload {
            success: true,
            updated_at: iso_timestamp(self.clock.now()),
            symbol,
            quote,
        })
    }

    async fn fetch_quote(&self, symbol: MetalSymbol) -> Result<QuoteSample, QuoteError> {
        let body = self.series.fetch_series(symbol).await?;
        let (latest, previous) = extract_latest_previous(&body)
            .inspect_err(|e| warn!("Series for {} rejected: {}", symbol, e))?;
        Ok(compute_quote(latest, previous))
    }
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-02T09:00:00.000Z`.
fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
