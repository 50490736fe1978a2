//! Error taxonomy shared by every layer of the quote pipeline.

use thiserror::Error;

/// Failure raised anywhere between the upstream providers and the HTTP layer.
///
/// The `Display` text of each variant is what ends up in the `error` field of
/// a failure envelope, so it must never carry internal detail such as a
/// backtrace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuoteError {
    /// The price series has too few lines or too few valid rows
    #[error("malformed series: {0}")]
    MalformedSeries(String),

    /// An extracted close is non-finite or not strictly positive
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// The FX provider response has no usable rate for the target currency
    #[error("fx rate unavailable: {0}")]
    RateUnavailable(String),

    /// Transport failure or non-success upstream status
    #[error("network failure: {0}")]
    Network(String),

    /// An upstream attempt exceeded its time budget (milliseconds)
    #[error("upstream request timed out after {0}ms")]
    Timeout(u64),

    /// The requested symbol is not on the allow-list
    #[error("invalid symbol")]
    InvalidSymbol,
}

impl QuoteError {
    /// Whether this failure came from the request itself rather than upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(self, QuoteError::InvalidSymbol)
    }
}

impl From<reqwest::Error> for QuoteError {
    fn from(e: reqwest::Error) -> Self {
        QuoteError::Network(e.to_string())
    }
}
