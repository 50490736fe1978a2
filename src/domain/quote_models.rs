//! Domain models for metal quotes and the aggregated payload.
//!
//! These are the shapes served to clients; field names are part of the public
//! JSON contract.

use crate::domain::QuoteError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============================================================================
// Symbols
// ============================================================================

/// Metal symbols the price-history provider is queried for.
///
/// This is a closed allow-list: anything else is rejected before it reaches
/// an upstream URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetalSymbol {
    /// Gold vs USD
    Xauusd,
    /// Silver vs USD
    Xagusd,
    /// Platinum vs USD
    Xptusd,
}

impl MetalSymbol {
    pub const ALL: [MetalSymbol; 3] = [MetalSymbol::Xauusd, MetalSymbol::Xagusd, MetalSymbol::Xptusd];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetalSymbol::Xauusd => "xauusd",
            MetalSymbol::Xagusd => "xagusd",
            MetalSymbol::Xptusd => "xptusd",
        }
    }
}

impl fmt::Display for MetalSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetalSymbol {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xauusd" => Ok(MetalSymbol::Xauusd),
            "xagusd" => Ok(MetalSymbol::Xagusd),
            "xptusd" => Ok(MetalSymbol::Xptusd),
            _ => Err(QuoteError::InvalidSymbol),
        }
    }
}

// ============================================================================
// Prices and quotes
// ============================================================================

/// One daily observation taken from a price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricePoint {
    /// Trading date as reported by the provider (e.g. "2024-01-02")
    pub date: String,
    /// Closing price in USD, always > 0
    pub close: f64,
}

/// Latest/previous pair with derived change metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct QuoteSample {
    pub latest: PricePoint,
    pub previous: PricePoint,
    /// `latest.close - previous.close`
    pub change: f64,
    /// `change / previous.close * 100`
    pub change_pct: f64,
}

/// USD to target-currency conversion scalar for one aggregation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRate(f64);

impl ExchangeRate {
    /// Build a rate, rejecting zero, negative and non-finite values.
    pub fn new(value: f64) -> Result<Self, QuoteError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(QuoteError::RateUnavailable(format!("unusable rate value {}", value)))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// A metal quote projected into the target currency.
///
/// `converted_change_pct` is the USD-domain percentage: both converted closes
/// use today's rate, so the ratio is unchanged. A true day-over-day figure
/// would need the previous day's rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConvertedQuote {
    pub symbol: MetalSymbol,
    #[serde(flatten)]
    pub quote: QuoteSample,
    pub converted_close: f64,
    pub converted_previous_close: f64,
    pub converted_change: f64,
    pub converted_change_pct: f64,
}

// ============================================================================
// Response payloads
// ============================================================================

/// Aggregated success envelope for `/v1/metals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AggregatePayload {
    pub success: bool,
    /// ISO-8601 UTC timestamp of the aggregation
    pub updated_at: String,
    /// Target currency code of the converted figures (e.g. "KRW")
    pub currency: String,
    pub fx_rate: f64,
    /// Converted quotes keyed by lowercase symbol
    pub instruments: BTreeMap<String, ConvertedQuote>,
}

/// Success envelope for the single-symbol `/v1/metal` variant (USD only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SymbolQuotePayload {
    pub success: bool,
    pub updated_at: String,
    pub symbol: MetalSymbol,
    pub quote: QuoteSample,
}

/// Failure envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorPayload {
    pub success: bool,
    pub error: String,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}
