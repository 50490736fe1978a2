//! Latest/previous row extraction from daily OHLCV CSV series.
//!
//! The provider returns `Date,Open,High,Low,Close[,Volume]` text that is
//! oldest-first, so the two most recent observations are found by scanning
//! backward from the end. Rows are validated against the column schema rather
//! than compared with header text, which keeps the scan tolerant of trailing
//! blank lines, repeated headers and `N/D` placeholders. A non-numeric newest
//! row is skipped, so the scan falls back to the next older valid rows; only
//! numeric closes that are unusable are reported as `InvalidPrice`.
//!
//! Fields are never quoted by the provider, so quoting is disabled: a stray
//! `"` stays inside its own field instead of swallowing later lines.

use crate::domain::{PricePoint, QuoteError};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

/// Minimum number of columns a data row must carry (Date..Close).
pub const MIN_ROW_FIELDS: usize = 5;

/// Minimum number of non-blank lines: header plus two observations.
pub const MIN_SERIES_LINES: usize = 3;

const DATE_COLUMN: usize = 0;
const CLOSE_COLUMN: usize = 4;

/// Extract the latest and previous valid observations from a CSV blob.
///
/// The first line is always treated as the header and never considered as a
/// data row.
///
/// # Errors
///
/// - `MalformedSeries` if fewer than 3 lines exist or fewer than 2 valid rows
///   are found
/// - `InvalidPrice` if either close is non-finite or not strictly positive
///
/// # Examples
///
/// ```
/// use metals_quote_gateway::application::series::extract_latest_previous;
///
/// let csv = "Date,Open,High,Low,Close,Volume\n\
///            2024-01-01,10,11,9,10,100\n\
///            2024-01-02,11,12,10,12,120\n";
/// let (latest, previous) = extract_latest_previous(csv).unwrap();
/// assert_eq!(latest.close, 12.0);
/// assert_eq!(previous.date, "2024-01-01");
/// ```
pub fn extract_latest_previous(csv_text: &str) -> Result<(PricePoint, PricePoint), QuoteError> {
    let records = read_records(csv_text);
    if records.len() < MIN_SERIES_LINES {
        return Err(QuoteError::MalformedSeries(format!(
            "expected at least {} lines, found {}",
            MIN_SERIES_LINES,
            records.len()
        )));
    }

    let mut valid_rows = records[1..].iter().rev().filter_map(parse_row);
    let (latest, previous) = match (valid_rows.next(), valid_rows.next()) {
        (Some(latest), Some(previous)) => (latest, previous),
        _ => {
            return Err(QuoteError::MalformedSeries(
                "no latest/previous rows".to_string(),
            ))
        }
    };

    ensure_positive(&latest, "latest")?;
    ensure_positive(&previous, "previous")?;

    Ok((latest, previous))
}

/// Read every non-blank line as a record, tolerating ragged rows.
fn read_records(csv_text: &str) -> Vec<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(csv_text.as_bytes());

    reader
        .records()
        .filter_map(|record| match record {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Skipping unreadable CSV line: {}", e);
                None
            }
        })
        .filter(|record| record.iter().any(|field| !field.is_empty()))
        .collect()
}

/// Schema check for one data row: a date plus numeric Open/High/Low/Close.
///
/// Returns `None` for rows that do not fit the schema. A close that parses
/// but is unusable (`NaN`, `inf`, `<= 0`) still yields a point so the caller
/// can report it as `InvalidPrice`.
fn parse_row(record: &StringRecord) -> Option<PricePoint> {
    if record.len() < MIN_ROW_FIELDS {
        return None;
    }

    let date = record.get(DATE_COLUMN).filter(|d| !d.is_empty())?;

    let mut prices = [0.0_f64; CLOSE_COLUMN];
    for (slot, column) in prices.iter_mut().zip(1..=CLOSE_COLUMN) {
        *slot = record.get(column)?.parse::<f64>().ok()?;
    }

    Some(PricePoint {
        date: date.to_string(),
        close: prices[CLOSE_COLUMN - 1],
    })
}

fn ensure_positive(point: &PricePoint, label: &str) -> Result<(), QuoteError> {
    if point.close.is_finite() && point.close > 0.0 {
        Ok(())
    } else {
        Err(QuoteError::InvalidPrice(format!(
            "{} close {} on {}",
            label, point.close, point.date
        )))
    }
}
