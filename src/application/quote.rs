//! Quote arithmetic: day-over-day change and currency projection.

use crate::domain::{ConvertedQuote, ExchangeRate, MetalSymbol, PricePoint, QuoteSample};

/// Compute absolute and percentage change between two observations.
///
/// `previous.close` has already been validated as strictly positive by the
/// series extractor, so the division is always defined.
pub fn compute_quote(latest: PricePoint, previous: PricePoint) -> QuoteSample {
    let change = latest.close - previous.close;
    let change_pct = change / previous.close * 100.0;

    QuoteSample {
        latest,
        previous,
        change,
        change_pct,
    }
}

/// Project a USD quote into the target currency using this cycle's rate.
///
/// `converted_change_pct` deliberately mirrors `change_pct`; see
/// [`ConvertedQuote`].
pub fn convert_quote(symbol: MetalSymbol, quote: QuoteSample, rate: ExchangeRate) -> ConvertedQuote {
    let converted_close = quote.latest.close * rate.value();
    let converted_previous_close = quote.previous.close * rate.value();
    let converted_change = converted_close - converted_previous_close;
    let converted_change_pct = quote.change_pct;

    ConvertedQuote {
        symbol,
        quote,
        converted_close,
        converted_previous_close,
        converted_change,
        converted_change_pct,
    }
}
