//! Common parameter types used across multiple endpoints
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Output size for Alpha Vantage time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// Compact (latest 100 data points)
    Compact,
    /// Full (20+ years of historical data)
    Full,
}

impl fmt::Display for OutputSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSize::Compact => write!(f, "compact"),
            OutputSize::Full => write!(f, "full"),
        }
    }
}

/// Time series interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interval {
    /// 1 minute
    #[serde(rename = "1min")]
    OneMin,
    /// 5 minutes
    #[serde(rename = "5min")]
    FiveMin,
    /// 15 minutes
    #[serde(rename = "15min")]
    FifteenMin,
    /// 30 minutes
    #[serde(rename = "30min")]
    ThirtyMin,
    /// 60 minutes
    #[serde(rename = "60min")]
    SixtyMin,
}

impl FromStr for Interval {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1min" => Ok(Interval::OneMin),
            "5min" => Ok(Interval::FiveMin),
            "15min" => Ok(Interval::FifteenMin),
            "30min" => Ok(Interval::ThirtyMin),
            "60min" => Ok(Interval::SixtyMin),
            _ => Err(Error::Custom(format!("Invalid interval: {s}"))),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::OneMin => write!(f, "1min"),
            Interval::FiveMin => write!(f, "5min"),
            Interval::FifteenMin => write!(f, "15min"),
            Interval::ThirtyMin => write!(f, "30min"),
            Interval::SixtyMin => write!(f, "60min"),
        }
    }
}

/// Treasury yield maturity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Maturity {
    /// 3 months
    #[serde(rename = "3month")]
    ThreeMonth,
    /// 2 years
    #[serde(rename = "2year")]
    TwoYear,
    /// 5 years
    #[serde(rename = "5year")]
    FiveYear,
    /// 7 years
    #[serde(rename = "7year")]
    SevenYear,
    /// 10 years
    #[serde(rename = "10year")]
    TenYear,
    /// 30 years
    #[serde(rename = "30year")]
    ThirtyYear,
}

impl Maturity {
    /// Every maturity the upstream publishes, shortest first
    pub const ALL: [Maturity; 6] = [
        Maturity::ThreeMonth,
        Maturity::TwoYear,
        Maturity::FiveYear,
        Maturity::SevenYear,
        Maturity::TenYear,
        Maturity::ThirtyYear,
    ];

    /// Column name used in joined yield tables, e.g. `TREASURY_YIELD_10YEAR`
    pub fn column(&self) -> String {
        format!("TREASURY_YIELD_{}", self.to_string().to_uppercase())
    }
}

impl fmt::Display for Maturity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Maturity::ThreeMonth => "3month",
            Maturity::TwoYear => "2year",
            Maturity::FiveYear => "5year",
            Maturity::SevenYear => "7year",
            Maturity::TenYear => "10year",
            Maturity::ThirtyYear => "30year",
        };
        f.write_str(s)
    }
}

impl FromStr for Maturity {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Maturity::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Custom(format!("Invalid maturity: {s}")))
    }
}

/// Monthly economic indicators published as plain `(date, value)` series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EconomicIndicator {
    /// Consumer price index
    Cpi,
    /// Annual inflation rate
    Inflation,
    /// Advance retail sales
    RetailSales,
    /// Durable goods orders
    Durables,
    /// Unemployment rate
    Unemployment,
    /// Total nonfarm payroll
    NonfarmPayroll,
}

impl EconomicIndicator {
    /// The fixed set of monthly indicators, in table column order
    pub const MONTHLY: [EconomicIndicator; 6] = [
        EconomicIndicator::Cpi,
        EconomicIndicator::Inflation,
        EconomicIndicator::RetailSales,
        EconomicIndicator::Durables,
        EconomicIndicator::Unemployment,
        EconomicIndicator::NonfarmPayroll,
    ];

    /// Upstream `function` name, also used as the table column name
    pub fn function(&self) -> &'static str {
        match self {
            EconomicIndicator::Cpi => "CPI",
            EconomicIndicator::Inflation => "INFLATION",
            EconomicIndicator::RetailSales => "RETAIL_SALES",
            EconomicIndicator::Durables => "DURABLES",
            EconomicIndicator::Unemployment => "UNEMPLOYMENT",
            EconomicIndicator::NonfarmPayroll => "NONFARM_PAYROLL",
        }
    }
}

impl fmt::Display for EconomicIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function())
    }
}

/// A calendar month, rendered as `YYYY-MM` for the intraday `month` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    /// Calendar year
    pub year: i32,
    /// Month, 1 through 12
    pub month: u32,
}

impl YearMonth {
    /// Create a year-month pair. The month is not range-checked.
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The month before this one
    pub fn previous(self) -> Self {
        if self.month <= 1 {
            Self::new(self.year - 1, 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// The `n` months ending with (and including) this one, oldest first
    pub fn trailing(self, n: usize) -> Vec<YearMonth> {
        let mut months = Vec::with_capacity(n);
        let mut current = self;
        for _ in 0..n {
            months.push(current);
            current = current.previous();
        }
        months.reverse();
        months
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
