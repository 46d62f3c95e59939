use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::client::AlphaVantage;
use crate::error::{Error, Result};
use crate::pipeline::{parse_date, parse_number};
use crate::request::Request;
use crate::request::common::{EconomicIndicator, Maturity};

/// One observation of an economic series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    /// Observation date
    pub date: NaiveDate,
    /// Observed value; `None` where the upstream reports no observation
    pub value: Option<f64>,
}

/// Several series joined on date; only dates present in every series are kept
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorTable {
    /// Column names, one per joined series
    pub columns: Vec<String>,
    /// Rows in the order of the first series
    pub rows: Vec<IndicatorRow>,
}

/// A row of an [`IndicatorTable`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    /// Shared date
    pub date: NaiveDate,
    /// One value per column
    pub values: Vec<Option<f64>>,
}

impl IndicatorTable {
    /// Inner-join named series on their dates
    pub fn inner_join(series: Vec<(String, Vec<TimeSeriesPoint>)>) -> Self {
        let mut iter = series.into_iter();
        let Some((first_name, first)) = iter.next() else {
            return Self::default();
        };

        let mut columns = vec![first_name];
        let mut lookups: Vec<HashMap<NaiveDate, Option<f64>>> = Vec::new();
        for (name, points) in iter {
            columns.push(name);
            let mut by_date = HashMap::with_capacity(points.len());
            for point in points {
                by_date.entry(point.date).or_insert(point.value);
            }
            lookups.push(by_date);
        }

        let rows = first
            .into_iter()
            .filter_map(|point| {
                let mut values = Vec::with_capacity(columns.len());
                values.push(point.value);
                for lookup in &lookups {
                    values.push(*lookup.get(&point.date)?);
                }
                Some(IndicatorRow {
                    date: point.date,
                    values,
                })
            })
            .collect();

        Self { columns, rows }
    }

    /// All values of a column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| row.values[idx]).collect())
    }
}

#[derive(Deserialize)]
struct RawPoint {
    date: String,
    value: String,
}

/// Parse a `data` array of `{"date", "value"}` objects.
///
/// The array may be bare or wrapped as `{"name": .., "data": [..]}`.
pub fn parse_series(doc: &Value) -> Result<Vec<TimeSeriesPoint>> {
    let data = match doc {
        Value::Array(_) => doc,
        _ => doc.get("data").ok_or_else(|| Error::missing("data", doc.to_string()))?,
    };
    let raw: Vec<RawPoint> = serde_json::from_value(data.clone())?;
    raw.into_iter()
        .map(|p| {
            Ok(TimeSeriesPoint {
                date: parse_date("date", &p.date)?,
                value: parse_number("value", &p.value)?,
            })
        })
        .collect()
}

/// Fetches U.S. economic series.
///
/// Every method returns the upstream's ordering unchanged.
#[derive(Debug, Clone)]
pub struct EconomicSeriesFetcher<Client: Request> {
    client: AlphaVantage<Client>,
}

impl<C: Request> EconomicSeriesFetcher<C> {
    /// Create a fetcher owning the given client
    pub fn new(client: AlphaVantage<C>) -> Self {
        Self { client }
    }

    /// The client used for requests
    pub fn client(&self) -> &AlphaVantage<C> {
        &self.client
    }

    /// Daily treasury yield for one maturity
    pub async fn treasury_yield(&self, maturity: Maturity) -> Result<Vec<TimeSeriesPoint>> {
        let doc = self
            .client
            .query("TREASURY_YIELD")
            .param("interval", "daily")
            .param("maturity", maturity)
            .json()
            .get()
            .await?;
        parse_series(&doc)
    }

    /// Daily treasury yields for every maturity, joined on date.
    ///
    /// Columns are named `TREASURY_YIELD_<MATURITY>`.
    pub async fn treasury_yields(&self) -> Result<IndicatorTable> {
        info!(calls = Maturity::ALL.len(), "fetching treasury yield curve");
        let mut series = Vec::with_capacity(Maturity::ALL.len());
        for maturity in Maturity::ALL {
            series.push((maturity.column(), self.treasury_yield(maturity).await?));
        }
        Ok(IndicatorTable::inner_join(series))
    }

    /// Daily U.S. federal funds rate
    pub async fn federal_funds_rate(&self) -> Result<Vec<TimeSeriesPoint>> {
        let doc = self
            .client
            .query("FEDERAL_FUNDS_RATE")
            .param("interval", "daily")
            .json()
            .get()
            .await?;
        parse_series(&doc)
    }

    /// One monthly indicator
    pub async fn monthly_indicator(&self, indicator: EconomicIndicator) -> Result<Vec<TimeSeriesPoint>> {
        let doc = self.client.query(indicator.function()).json().get().await?;
        parse_series(&doc)
    }

    /// The fixed list of monthly indicators (CPI, inflation, retail sales,
    /// durables, unemployment, nonfarm payroll), joined on date.
    pub async fn monthly_indicators(&self) -> Result<IndicatorTable> {
        info!(calls = EconomicIndicator::MONTHLY.len(), "fetching monthly indicators");
        let mut series = Vec::with_capacity(EconomicIndicator::MONTHLY.len());
        for indicator in EconomicIndicator::MONTHLY {
            series.push((indicator.function().to_string(), self.monthly_indicator(indicator).await?));
        }
        Ok(IndicatorTable::inner_join(series))
    }
}
