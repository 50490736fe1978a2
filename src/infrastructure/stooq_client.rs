//! HTTP client for the daily price-history provider.
//!
//! Series are requested as `<base>?s=<symbol>&i=d` and returned as raw CSV
//! text; validation belongs to the series extractor.

use crate::domain::{MetalSymbol, QuoteError, SeriesSource};
use crate::infrastructure::http::get_text;
use crate::infrastructure::resilience::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

/// Daily CSV download endpoint
pub const DEFAULT_SERIES_BASE_URL: &str = "https://stooq.com/q/d/l/";

/// Daily interval query value
const DAILY_INTERVAL: &str = "d";

#[derive(Clone)]
pub struct StooqClient {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl StooqClient {
    pub fn new(client: Client, base_url: &str, policy: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            policy,
        }
    }
}

#[async_trait]
impl SeriesSource for StooqClient {
    async fn fetch_series(&self, symbol: MetalSymbol) -> Result<String, QuoteError> {
        let query = [("s", symbol.as_str()), ("i", DAILY_INTERVAL)];
        let body = self
            .policy
            .run("series", || get_text(&self.client, "series", &self.base_url, &query))
            .await?;

        info!("Fetched {} series ({} bytes)", symbol, body.len());
        Ok(body)
    }
}
