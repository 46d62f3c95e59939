use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::client::AlphaVantage;
use crate::error::{Error, Result};
use crate::pipeline::{is_missing, json_number, parse_date};
use crate::request::Request;

/// Line items of one statement, keyed by UPPER_SNAKE_CASE name
pub type LineItems = BTreeMap<String, Option<f64>>;

/// The four upstream documents merged into a fundamentals table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {
    /// `BALANCE_SHEET`
    BalanceSheet,
    /// `INCOME_STATEMENT`
    IncomeStatement,
    /// `CASH_FLOW`
    CashFlow,
    /// `EARNINGS`
    Earnings,
}

/// Reporting period of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// Fiscal quarters
    Quarterly,
    /// Fiscal years
    Annual,
}

impl Statement {
    /// Merge order of the documents; on a column name clash the earlier
    /// statement keeps the bare name
    pub const ALL: [Statement; 4] = [
        Statement::BalanceSheet,
        Statement::IncomeStatement,
        Statement::CashFlow,
        Statement::Earnings,
    ];

    /// Upstream `function` name
    pub fn function(&self) -> &'static str {
        match self {
            Statement::BalanceSheet => "BALANCE_SHEET",
            Statement::IncomeStatement => "INCOME_STATEMENT",
            Statement::CashFlow => "CASH_FLOW",
            Statement::Earnings => "EARNINGS",
        }
    }

    /// Key of the record array in the upstream document
    pub fn reports_key(&self, period: Period) -> &'static str {
        match (self, period) {
            (Statement::Earnings, Period::Quarterly) => "quarterlyEarnings",
            (Statement::Earnings, Period::Annual) => "annualEarnings",
            (_, Period::Quarterly) => "quarterlyReports",
            (_, Period::Annual) => "annualReports",
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function())
    }
}

/// Convert an upstream camelCase name to UPPER_SNAKE_CASE.
///
/// Every upper-case letter after the first character starts a new word, so
/// `reportedEPS` becomes `REPORTED_E_P_S`.
pub fn column_name(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 8);
    for (i, ch) in camel.chars().enumerate() {
        if i > 0 && ch.is_ascii_uppercase() {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

/// One per-period record of a statement document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementRecord {
    /// Fiscal period end, the join key
    pub fiscal_date_ending: NaiveDate,
    /// `reportedCurrency`, statements only
    pub reported_currency: Option<String>,
    /// `reportedDate`, earnings only
    pub reported_date: Option<NaiveDate>,
    /// `reportTime`, earnings only
    pub report_time: Option<String>,
    /// Every other field, parsed as a number
    pub items: LineItems,
}

impl StatementRecord {
    /// Parse one record object
    pub fn from_json(record: &Value) -> Result<Self> {
        let obj = record
            .as_object()
            .ok_or_else(|| Error::invalid("report", record.to_string()))?;

        let fiscal = obj
            .get("fiscalDateEnding")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::missing("fiscalDateEnding", record.to_string()))?;

        let mut parsed = StatementRecord {
            fiscal_date_ending: parse_date("fiscalDateEnding", fiscal)?,
            reported_currency: None,
            reported_date: None,
            report_time: None,
            items: LineItems::new(),
        };

        for (key, value) in obj {
            match key.as_str() {
                "fiscalDateEnding" => {}
                "reportedCurrency" => parsed.reported_currency = value.as_str().map(str::to_owned),
                "reportTime" => parsed.report_time = value.as_str().map(str::to_owned),
                "reportedDate" => {
                    parsed.reported_date = match value.as_str() {
                        Some(s) if !is_missing(s) => Some(parse_date(key, s)?),
                        _ => None,
                    }
                }
                _ => {
                    parsed.items.insert(column_name(key), json_number(key, value)?);
                }
            }
        }
        Ok(parsed)
    }
}

/// Parse the record array stored under `key`
pub fn parse_statement(doc: &Value, key: &str) -> Result<Vec<StatementRecord>> {
    let reports = doc
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| Error::missing(key, doc.to_string()))?;
    reports.iter().map(StatementRecord::from_json).collect()
}

/// One fiscal period with a section per source document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalRow {
    /// Fiscal period end
    pub fiscal_date_ending: NaiveDate,
    /// Currency reported by the first statement that carries one
    pub reported_currency: Option<String>,
    /// Earnings announcement date
    pub reported_date: Option<NaiveDate>,
    /// Earnings announcement time (`pre-market` / `post-market`)
    pub report_time: Option<String>,
    /// Balance sheet line items, if the period appears in that document
    pub balance_sheet: Option<LineItems>,
    /// Income statement line items
    pub income_statement: Option<LineItems>,
    /// Cash flow line items
    pub cash_flow: Option<LineItems>,
    /// Earnings line items
    pub earnings: Option<LineItems>,
}

impl FundamentalRow {
    fn empty(fiscal_date_ending: NaiveDate) -> Self {
        Self {
            fiscal_date_ending,
            reported_currency: None,
            reported_date: None,
            report_time: None,
            balance_sheet: None,
            income_statement: None,
            cash_flow: None,
            earnings: None,
        }
    }

    /// Line items contributed by one document
    pub fn section(&self, statement: Statement) -> Option<&LineItems> {
        match statement {
            Statement::BalanceSheet => self.balance_sheet.as_ref(),
            Statement::IncomeStatement => self.income_statement.as_ref(),
            Statement::CashFlow => self.cash_flow.as_ref(),
            Statement::Earnings => self.earnings.as_ref(),
        }
    }

    fn section_mut(&mut self, statement: Statement) -> &mut Option<LineItems> {
        match statement {
            Statement::BalanceSheet => &mut self.balance_sheet,
            Statement::IncomeStatement => &mut self.income_statement,
            Statement::CashFlow => &mut self.cash_flow,
            Statement::Earnings => &mut self.earnings,
        }
    }

    /// Value of a line item in one document's section
    pub fn get_in(&self, statement: Statement, item: &str) -> Option<f64> {
        self.section(statement)?.get(item).copied().flatten()
    }

    /// Value of a column as named by [`FundamentalTable::columns`].
    ///
    /// A bare name resolves to the first section in merge order that has it;
    /// `<ITEM>_<FUNCTION>` (e.g. `NET_INCOME_CASH_FLOW`) reads that document's
    /// section. `None` if no section has the column or the upstream reported
    /// no value.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.locate(column)
            .and_then(|(statement, item)| self.get_in(statement, item))
    }

    /// Whether any section has the column
    pub fn has_column(&self, column: &str) -> bool {
        self.locate(column).is_some()
    }

    fn locate<'c>(&self, column: &'c str) -> Option<(Statement, &'c str)> {
        let bare = Statement::ALL
            .into_iter()
            .find(|&s| self.section(s).is_some_and(|items| items.contains_key(column)));
        if let Some(statement) = bare {
            return Some((statement, column));
        }
        Statement::ALL.into_iter().find_map(|statement| {
            let item = column.strip_suffix(statement.function())?.strip_suffix('_')?;
            self.section(statement)?.contains_key(item).then_some((statement, item))
        })
    }

    fn absorb(&mut self, statement: Statement, record: StatementRecord) {
        if self.reported_currency.is_none() {
            self.reported_currency = record.reported_currency;
        }
        if self.reported_date.is_none() {
            self.reported_date = record.reported_date;
        }
        if self.report_time.is_none() {
            self.report_time = record.report_time;
        }
        // Repeated periods within one document: the first value of a line item is kept
        let section = self.section_mut(statement).get_or_insert_with(LineItems::new);
        for (name, value) in record.items {
            section.entry(name).or_insert(value);
        }
    }
}

/// Records of all four documents for one symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementSet {
    /// Balance sheet records
    pub balance_sheet: Vec<StatementRecord>,
    /// Income statement records
    pub income_statement: Vec<StatementRecord>,
    /// Cash flow records
    pub cash_flow: Vec<StatementRecord>,
    /// Earnings records
    pub earnings: Vec<StatementRecord>,
}

impl StatementSet {
    fn take(&mut self, statement: Statement) -> Vec<StatementRecord> {
        let slot = match statement {
            Statement::BalanceSheet => &mut self.balance_sheet,
            Statement::IncomeStatement => &mut self.income_statement,
            Statement::CashFlow => &mut self.cash_flow,
            Statement::Earnings => &mut self.earnings,
        };
        std::mem::take(slot)
    }
}

/// Fundamentals of one symbol, one row per fiscal period, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalTable {
    /// Upper-cased symbol
    pub symbol: String,
    /// Rows sorted by fiscal date ascending
    pub rows: Vec<FundamentalRow>,
}

impl FundamentalTable {
    /// Outer-join the four documents on fiscal date ending.
    ///
    /// A period present in only some documents still yields a row; the
    /// sections of the documents lacking it stay `None`. Values are passed
    /// through without currency or unit normalization.
    pub fn assemble(symbol: &str, mut statements: StatementSet) -> Self {
        let mut by_period: BTreeMap<NaiveDate, FundamentalRow> = BTreeMap::new();
        for statement in Statement::ALL {
            for record in statements.take(statement) {
                by_period
                    .entry(record.fiscal_date_ending)
                    .or_insert_with(|| FundamentalRow::empty(record.fiscal_date_ending))
                    .absorb(statement, record);
            }
        }
        Self {
            symbol: symbol.to_uppercase(),
            rows: by_period.into_values().collect(),
        }
    }

    /// Union of the line items of all rows, in merge order.
    ///
    /// A line item already named by an earlier document is suffixed with the
    /// later document's function, so `NET_INCOME` from the cash flow becomes
    /// `NET_INCOME_CASH_FLOW` next to the income statement's `NET_INCOME`.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for statement in Statement::ALL {
            let mut names: Vec<&String> = self
                .rows
                .iter()
                .filter_map(|row| row.section(statement))
                .flat_map(|items| items.keys())
                .collect();
            names.sort();
            names.dedup();
            for name in names {
                if columns.contains(name) {
                    columns.push(format!("{name}_{}", statement.function()));
                } else {
                    columns.push(name.clone());
                }
            }
        }
        columns
    }

    /// Row for a fiscal period
    pub fn row(&self, fiscal_date_ending: NaiveDate) -> Option<&FundamentalRow> {
        self.rows.iter().find(|row| row.fiscal_date_ending == fiscal_date_ending)
    }
}

/// Builds wide fundamentals tables from balance sheet, income statement,
/// cash flow and earnings documents
#[derive(Debug, Clone)]
pub struct FundamentalTableAssembler<Client: Request> {
    client: AlphaVantage<Client>,
}

impl<C: Request> FundamentalTableAssembler<C> {
    /// Create an assembler owning the given client
    pub fn new(client: AlphaVantage<C>) -> Self {
        Self { client }
    }

    /// The client used for requests
    pub fn client(&self) -> &AlphaVantage<C> {
        &self.client
    }

    /// Fetch the records of one document
    pub async fn statement(&self, symbol: &str, statement: Statement, period: Period) -> Result<Vec<StatementRecord>> {
        let doc = self
            .client
            .query(statement.function())
            .param("symbol", symbol)
            .json()
            .get()
            .await?;
        parse_statement(&doc, statement.reports_key(period))
    }

    /// Quarterly balance sheet records
    pub async fn balance_sheet(&self, symbol: &str) -> Result<Vec<StatementRecord>> {
        self.statement(symbol, Statement::BalanceSheet, Period::Quarterly).await
    }

    /// Quarterly income statement records
    pub async fn income_statement(&self, symbol: &str) -> Result<Vec<StatementRecord>> {
        self.statement(symbol, Statement::IncomeStatement, Period::Quarterly).await
    }

    /// Quarterly cash flow records
    pub async fn cash_flow(&self, symbol: &str) -> Result<Vec<StatementRecord>> {
        self.statement(symbol, Statement::CashFlow, Period::Quarterly).await
    }

    /// Quarterly earnings records
    pub async fn earnings(&self, symbol: &str) -> Result<Vec<StatementRecord>> {
        self.statement(symbol, Statement::Earnings, Period::Quarterly).await
    }

    /// Fetch all four documents for a period and merge them
    pub async fn table(&self, symbol: &str, period: Period) -> Result<FundamentalTable> {
        info!(symbol, ?period, calls = Statement::ALL.len(), "assembling fundamentals");
        let statements = StatementSet {
            balance_sheet: self.statement(symbol, Statement::BalanceSheet, period).await?,
            income_statement: self.statement(symbol, Statement::IncomeStatement, period).await?,
            cash_flow: self.statement(symbol, Statement::CashFlow, period).await?,
            earnings: self.statement(symbol, Statement::Earnings, period).await?,
        };
        Ok(FundamentalTable::assemble(symbol, statements))
    }

    /// One row per fiscal quarter
    pub async fn quarterly(&self, symbol: &str) -> Result<FundamentalTable> {
        self.table(symbol, Period::Quarterly).await
    }

    /// One row per fiscal year
    pub async fn annual(&self, symbol: &str) -> Result<FundamentalTable> {
        self.table(symbol, Period::Annual).await
    }
}
