use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::client::AlphaVantage;
use crate::error::{Error, Result};
use crate::pipeline::{json_number, parse_timestamp};
use crate::request::Request;
use crate::request::common::{Interval, OutputSize, YearMonth};

/// One OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBar {
    /// Bar start (midnight for daily bars)
    pub timestamp: NaiveDateTime,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Traded volume
    pub volume: u64,
}

/// Row of an intraday CSV body
#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

impl CsvBar {
    fn into_bar(self) -> Result<PriceBar> {
        Ok(PriceBar {
            timestamp: parse_timestamp("timestamp", &self.timestamp)?,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// Append `bars` (ascending) after `out`, dropping every bar that is not
/// strictly later than the last bar kept. This covers both overlap with the
/// previous slice and repeated timestamps within a slice; the first bar of a
/// timestamp wins.
fn append_after(out: &mut Vec<PriceBar>, bars: Vec<PriceBar>) {
    let mut dropped = 0usize;
    for bar in bars {
        if out.last().is_none_or(|last| bar.timestamp > last.timestamp) {
            out.push(bar);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        debug!(dropped, "dropped bars with repeated timestamps");
    }
}

fn ascending(rows: Vec<CsvBar>) -> Result<Vec<PriceBar>> {
    let mut bars = rows.into_iter().map(CsvBar::into_bar).collect::<Result<Vec<_>>>()?;
    bars.sort_by_key(|bar| bar.timestamp);
    Ok(bars)
}

/// Parse a `TIME_SERIES_DAILY` JSON document into ascending bars
pub fn parse_daily(doc: &Value) -> Result<Vec<PriceBar>> {
    let series = doc
        .as_object()
        .and_then(|obj| obj.iter().find(|(key, _)| key.starts_with("Time Series")))
        .and_then(|(_, series)| series.as_object())
        .ok_or_else(|| Error::missing("Time Series", doc.to_string()))?;

    let mut bars = Vec::with_capacity(series.len());
    for (timestamp, fields) in series {
        let price = |name: &str| -> Result<f64> {
            field(fields, name)
                .map(|v| json_number(name, v))
                .transpose()?
                .flatten()
                .ok_or_else(|| Error::missing(name, fields.to_string()))
        };
        let volume = field(fields, "volume").ok_or_else(|| Error::missing("volume", fields.to_string()))?;
        let volume = match volume {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        }
        .ok_or_else(|| Error::invalid("volume", volume.to_string()))?;

        bars.push(PriceBar {
            timestamp: parse_timestamp("timestamp", timestamp)?,
            open: price("open")?,
            high: price("high")?,
            low: price("low")?,
            close: price("close")?,
            volume,
        });
    }
    bars.sort_by_key(|bar| bar.timestamp);
    Ok(bars)
}

/// Look up `"1. open"`-style keys by their name part
fn field<'v>(fields: &'v Value, name: &str) -> Option<&'v Value> {
    fields.as_object()?.iter().find_map(|(key, value)| {
        let bare = key.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ');
        (bare == name).then_some(value)
    })
}

/// Fetches multi-period price history.
///
/// Slices (years or months) are requested oldest first, each sorted
/// ascending and concatenated. Where adjacent slices overlap, bars not later
/// than the last kept timestamp are dropped.
#[derive(Debug, Clone)]
pub struct HistoricSeriesFetcher<Client: Request> {
    client: AlphaVantage<Client>,
}

impl<C: Request> HistoricSeriesFetcher<C> {
    /// Create a fetcher owning the given client
    pub fn new(client: AlphaVantage<C>) -> Self {
        Self { client }
    }

    /// The client used for requests
    pub fn client(&self) -> &AlphaVantage<C> {
        &self.client
    }

    async fn intraday_slices(
        &self,
        symbol: &str,
        interval: Interval,
        slice: &str,
        values: Vec<String>,
    ) -> Result<Vec<PriceBar>> {
        info!(symbol, %interval, calls = values.len(), "fetching intraday history");
        let mut out = Vec::new();
        for value in values {
            let rows = self
                .client
                .query("TIME_SERIES_INTRADAY")
                .param("symbol", symbol)
                .param("interval", interval)
                .param(slice, &value)
                .param("outputsize", OutputSize::Full)
                .csv::<CsvBar>()
                .get()
                .await?;
            append_after(&mut out, ascending(rows)?);
        }
        Ok(out)
    }

    /// Intraday bars for each calendar year in `years`, one request per year
    pub async fn intraday_years(
        &self,
        symbol: &str,
        interval: Interval,
        years: RangeInclusive<i32>,
    ) -> Result<Vec<PriceBar>> {
        let values = years.map(|year| year.to_string()).collect();
        self.intraday_slices(symbol, interval, "year", values).await
    }

    /// Intraday bars for the last `years` calendar years, ending with the current one
    pub async fn intraday_history(&self, symbol: &str, interval: Interval, years: u32) -> Result<Vec<PriceBar>> {
        let current = Utc::now().year();
        let first = i32::try_from(years)
            .ok()
            .and_then(|years| current.checked_sub(years))
            .and_then(|first| first.checked_add(1))
            .ok_or_else(|| Error::invalid("years", years.to_string()))?;
        self.intraday_years(symbol, interval, first..=current).await
    }

    /// Intraday bars for one month
    pub async fn intraday_month(&self, symbol: &str, interval: Interval, month: YearMonth) -> Result<Vec<PriceBar>> {
        self.intraday_slices(symbol, interval, "month", vec![month.to_string()])
            .await
    }

    /// Intraday bars for the last `months` months, ending with the current one
    pub async fn intraday_months(&self, symbol: &str, interval: Interval, months: usize) -> Result<Vec<PriceBar>> {
        let today = Utc::now();
        let values = YearMonth::new(today.year(), today.month())
            .trailing(months)
            .iter()
            .map(YearMonth::to_string)
            .collect();
        self.intraday_slices(symbol, interval, "month", values).await
    }

    /// Daily bars: the whole history with [`OutputSize::Full`], the latest
    /// 100 with [`OutputSize::Compact`]
    pub async fn daily(&self, symbol: &str, output_size: OutputSize) -> Result<Vec<PriceBar>> {
        let doc = self
            .client
            .query("TIME_SERIES_DAILY")
            .param("symbol", symbol)
            .param("outputsize", output_size)
            .json()
            .get()
            .await?;
        parse_daily(&doc)
    }
}
