//! HTTP client for the USD exchange-rate provider.
//!
//! The provider answers with `{ "rates": { "KRW": 1385.27, ... } }`. Only the
//! transport call is retried; a body that parses but lacks the rate fails
//! immediately with `RateUnavailable`.

use crate::domain::{ExchangeRate, QuoteError, RateSource};
use crate::infrastructure::http::get_text;
use crate::infrastructure::resilience::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

/// Latest USD rates endpoint
pub const DEFAULT_FX_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Target currency when none is configured
pub const DEFAULT_CURRENCY: &str = "KRW";

#[derive(Clone)]
pub struct FxRateClient {
    client: Client,
    url: String,
    currency: String,
    policy: RetryPolicy,
}

impl FxRateClient {
    pub fn new(client: Client, url: &str, currency: &str, policy: RetryPolicy) -> Self {
        Self {
            client,
            url: url.to_string(),
            currency: currency.trim().to_ascii_uppercase(),
            policy,
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Pull `rates.<currency>` out of a provider response body.
    pub fn parse_rate(body: &str, currency: &str) -> Result<ExchangeRate, QuoteError> {
        let json: Value = serde_json::from_str(body)
            .map_err(|e| QuoteError::RateUnavailable(format!("invalid JSON body: {}", e)))?;

        let value = json
            .get("rates")
            .and_then(|rates| rates.get(currency))
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                QuoteError::RateUnavailable(format!("rates.{} missing from response", currency))
            })?;

        ExchangeRate::new(value)
    }
}

#[async_trait]
impl RateSource for FxRateClient {
    async fn fetch_rate(&self) -> Result<ExchangeRate, QuoteError> {
        let body = self
            .policy
            .run("fx", || get_text(&self.client, "fx", &self.url, &[]))
            .await?;

        let rate = Self::parse_rate(&body, &self.currency)?;
        info!("Fetched USD/{} rate: {}", self.currency, rate.value());
        Ok(rate)
    }
}
