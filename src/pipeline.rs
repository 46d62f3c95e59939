//! Fetchers that turn upstream documents into tables
//!
//! Each fetcher owns its [`AlphaVantage`](crate::client::AlphaVantage) client
//! (and with it the API key). Operations that need several upstream calls
//! issue them one after another.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::error::{Error, Result};

/// Economic indicators: treasury yields, federal funds rate, monthly indicators
pub mod economy;
/// Quarterly and annual fundamentals merged into one wide table
pub mod fundamentals;
/// Intraday and daily price history
pub mod historic;
/// News sentiment feed
pub mod sentiment;

pub use economy::{EconomicSeriesFetcher, IndicatorRow, IndicatorTable, TimeSeriesPoint};
pub use fundamentals::{
    FundamentalRow, FundamentalTable, FundamentalTableAssembler, LineItems, Period, Statement, StatementRecord, StatementSet,
};
pub use historic::{HistoricSeriesFetcher, PriceBar};
pub use sentiment::{NewsArticle, NewsSentimentFetcher};

/// Markers the upstream writes in place of a value
pub(crate) fn is_missing(raw: &str) -> bool {
    matches!(raw.trim(), "" | "." | "None" | "-")
}

/// Parse an upstream numeric string.
///
/// The upstream writes missing observations as `"."` (economic series) or
/// `"None"` (statements); both become `None`.
pub(crate) fn parse_number(field: &str, raw: &str) -> Result<Option<f64>> {
    if is_missing(raw) {
        return Ok(None);
    }
    let raw = raw.trim();
    raw.parse::<f64>().map(Some).map_err(|_| Error::invalid(field, raw))
}

/// Like [`parse_number`] for a JSON value that may already be a number
pub(crate) fn json_number(field: &str, value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => parse_number(field, s),
        other => Err(Error::invalid(field, other.to_string())),
    }
}

pub(crate) fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| Error::invalid(field, raw))
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM` and bare dates (midnight)
pub(crate) fn parse_timestamp(field: &str, raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts);
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(ts);
    }
    Ok(parse_date(field, raw)?.and_time(NaiveTime::MIN))
}
