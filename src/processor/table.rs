//! Polars DataFrame conversion for the fetched tables
//!
//! Dates and timestamps become string columns; missing values become nulls.
use polars_core::frame::DataFrame;
use polars_core::prelude::{Column, NamedFrom};

use crate::error::Result;
use crate::pipeline::{FundamentalTable, IndicatorTable, NewsArticle, PriceBar, TimeSeriesPoint};

/// Conversion into a Polars `DataFrame`
pub trait ToDataFrame {
    /// Build the frame
    fn to_dataframe(&self) -> Result<DataFrame>;
}

impl ToDataFrame for [TimeSeriesPoint] {
    fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self.iter().map(|p| p.date.to_string()).collect();
        let values: Vec<Option<f64>> = self.iter().map(|p| p.value).collect();
        Ok(DataFrame::new(vec![
            Column::new("DATE".into(), dates),
            Column::new("VALUE".into(), values),
        ])?)
    }
}

impl ToDataFrame for IndicatorTable {
    fn to_dataframe(&self) -> Result<DataFrame> {
        let dates: Vec<String> = self.rows.iter().map(|r| r.date.to_string()).collect();
        let mut columns = vec![Column::new("DATE".into(), dates)];
        for (idx, name) in self.columns.iter().enumerate() {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.values[idx]).collect();
            columns.push(Column::new(name.as_str().into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }
}

impl ToDataFrame for FundamentalTable {
    /// Columns: `FISCAL_DATE_ENDING`, `TICKER`, `REPORTED_CURRENCY`,
    /// `REPORTED_DATE`, `REPORT_TIME`, then every line item.
    fn to_dataframe(&self) -> Result<DataFrame> {
        let rows = &self.rows;
        let mut columns = vec![
            Column::new(
                "FISCAL_DATE_ENDING".into(),
                rows.iter().map(|r| r.fiscal_date_ending.to_string()).collect::<Vec<_>>(),
            ),
            Column::new("TICKER".into(), vec![self.symbol.clone(); rows.len()]),
            Column::new(
                "REPORTED_CURRENCY".into(),
                rows.iter().map(|r| r.reported_currency.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "REPORTED_DATE".into(),
                rows.iter().map(|r| r.reported_date.map(|d| d.to_string())).collect::<Vec<_>>(),
            ),
            Column::new(
                "REPORT_TIME".into(),
                rows.iter().map(|r| r.report_time.clone()).collect::<Vec<_>>(),
            ),
        ];
        for name in self.columns() {
            let values: Vec<Option<f64>> = rows.iter().map(|r| r.get(&name)).collect();
            columns.push(Column::new(name.as_str().into(), values));
        }
        Ok(DataFrame::new(columns)?)
    }
}

impl ToDataFrame for [PriceBar] {
    fn to_dataframe(&self) -> Result<DataFrame> {
        let floats = |f: fn(&PriceBar) -> f64| -> Vec<f64> { self.iter().map(f).collect() };
        Ok(DataFrame::new(vec![
            Column::new(
                "TIMESTAMP".into(),
                self.iter().map(|b| b.timestamp.to_string()).collect::<Vec<_>>(),
            ),
            Column::new("OPEN".into(), floats(|b| b.open)),
            Column::new("HIGH".into(), floats(|b| b.high)),
            Column::new("LOW".into(), floats(|b| b.low)),
            Column::new("CLOSE".into(), floats(|b| b.close)),
            Column::new("VOLUME".into(), self.iter().map(|b| b.volume).collect::<Vec<u64>>()),
        ])?)
    }
}

impl ToDataFrame for [NewsArticle] {
    fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Column::new(
                "TIME_PUBLISHED".into(),
                self.iter().map(|a| a.published.to_string()).collect::<Vec<_>>(),
            ),
            Column::new("TITLE".into(), self.iter().map(|a| a.title.clone()).collect::<Vec<_>>()),
            Column::new("SOURCE".into(), self.iter().map(|a| a.source.clone()).collect::<Vec<_>>()),
            Column::new(
                "OVERALL_SENTIMENT_SCORE".into(),
                self.iter().map(|a| a.overall_sentiment_score).collect::<Vec<_>>(),
            ),
        ])?)
    }
}
