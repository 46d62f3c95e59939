//! Fetcher behaviour against an in-memory transport

mod common;

use chrono::{Datelike, NaiveDate, Utc};
use serde_json::json;

use alphav_etl::Error;
use alphav_etl::pipeline::{
    EconomicSeriesFetcher, FundamentalTableAssembler, HistoricSeriesFetcher, NewsSentimentFetcher, Statement,
};
use alphav_etl::request::common::{EconomicIndicator, Interval, Maturity, OutputSize, YearMonth};

use common::{BASE, KEY, client, params};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn pairs(expected: &[(&str, &str)]) -> Vec<(String, String)> {
    expected.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn query_url_has_exactly_the_supplied_parameters() {
    let (client, _) = client();
    let url = client
        .query("TIME_SERIES_INTRADAY")
        .param("symbol", "BRK.B")
        .param("interval", Interval::FiveMin)
        .param("note", "a&b c")
        .url()
        .unwrap();

    assert!(url.starts_with(&format!("{BASE}?")));
    assert!(url.contains("note=a%26b+c"));
    assert_eq!(
        params(&url),
        pairs(&[
            ("function", "TIME_SERIES_INTRADAY"),
            ("symbol", "BRK.B"),
            ("interval", "5min"),
            ("note", "a&b c"),
            ("apikey", KEY),
        ])
    );
}

#[tokio::test]
async fn treasury_yield_returns_date_value_pairs() {
    let (client, mock) = client();
    mock.ok_json(json!([{"date": "2023-01-01", "value": "3.5"}]));

    let fetcher = EconomicSeriesFetcher::new(client);
    let points = fetcher.treasury_yield(Maturity::TenYear).await.unwrap();

    let pairs_out: Vec<(NaiveDate, Option<f64>)> = points.iter().map(|p| (p.date, p.value)).collect();
    assert_eq!(pairs_out, vec![(date("2023-01-01"), Some(3.5))]);
    assert_eq!(
        params(&mock.urls()[0]),
        pairs(&[
            ("function", "TREASURY_YIELD"),
            ("interval", "daily"),
            ("maturity", "10year"),
            ("apikey", KEY),
        ])
    );
}

#[tokio::test]
async fn federal_funds_rate_keeps_upstream_order() {
    let (client, mock) = client();
    mock.ok_json(json!({
        "name": "Effective Federal Funds Rate",
        "interval": "daily",
        "data": [
            {"date": "2024-01-03", "value": "5.33"},
            {"date": "2024-01-02", "value": "."},
            {"date": "2024-01-01", "value": "5.32"}
        ]
    }));

    let points = EconomicSeriesFetcher::new(client).federal_funds_rate().await.unwrap();
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![date("2024-01-03"), date("2024-01-02"), date("2024-01-01")]);
    assert_eq!(points[1].value, None);
    assert_eq!(params(&mock.urls()[0])[0], ("function".to_string(), "FEDERAL_FUNDS_RATE".to_string()));
}

#[tokio::test]
async fn monthly_indicators_issue_one_call_each_and_join_on_date() {
    let (client, mock) = client();
    for (i, _) in EconomicIndicator::MONTHLY.iter().enumerate() {
        let mut data = vec![json!({"date": "2024-02-01", "value": format!("{}", i + 1)})];
        // Only the first series has January
        if i == 0 {
            data.push(json!({"date": "2024-01-01", "value": "0.5"}));
        }
        mock.ok_json(json!({"data": data}));
    }

    let table = EconomicSeriesFetcher::new(client).monthly_indicators().await.unwrap();

    let functions: Vec<String> = mock.urls().iter().map(|u| params(u)[0].1.clone()).collect();
    assert_eq!(
        functions,
        vec!["CPI", "INFLATION", "RETAIL_SALES", "DURABLES", "UNEMPLOYMENT", "NONFARM_PAYROLL"]
    );
    assert_eq!(table.columns, functions);
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].date, date("2024-02-01"));
    assert_eq!(table.column("DURABLES").unwrap(), vec![Some(4.0)]);
}

#[tokio::test]
async fn treasury_yields_request_every_maturity() {
    let (client, mock) = client();
    for _ in Maturity::ALL {
        mock.ok_json(json!({"data": [{"date": "2024-01-02", "value": "4.1"}]}));
    }

    let table = EconomicSeriesFetcher::new(client).treasury_yields().await.unwrap();

    let maturities: Vec<String> = mock.urls().iter().map(|u| params(u)[2].1.clone()).collect();
    assert_eq!(maturities, vec!["3month", "2year", "5year", "7year", "10year", "30year"]);
    assert_eq!(table.columns[0], "TREASURY_YIELD_3MONTH");
    assert_eq!(table.rows[0].values.len(), 6);
}

fn quarterly(key: &str, records: serde_json::Value) -> serde_json::Value {
    json!({"symbol": "IBM", "annualReports": [], key: records})
}

#[tokio::test]
async fn quarter_missing_from_one_document_still_produces_a_row() {
    let (client, mock) = client();
    mock.ok_json(quarterly(
        "quarterlyReports",
        json!([
            {"fiscalDateEnding": "2024-06-30", "reportedCurrency": "USD", "totalAssets": "200"},
            {"fiscalDateEnding": "2024-03-31", "reportedCurrency": "USD", "totalAssets": "100"}
        ]),
    ))
    .ok_json(quarterly(
        "quarterlyReports",
        json!([
            {"fiscalDateEnding": "2024-06-30", "reportedCurrency": "USD", "totalRevenue": "20"},
            {"fiscalDateEnding": "2024-03-31", "reportedCurrency": "USD", "totalRevenue": "10"}
        ]),
    ))
    .ok_json(quarterly(
        "quarterlyReports",
        json!([
            {"fiscalDateEnding": "2024-03-31", "reportedCurrency": "USD", "operatingCashflow": "7", "capitalExpenditures": "None"}
        ]),
    ))
    .ok_json(json!({
        "symbol": "IBM",
        "annualEarnings": [],
        "quarterlyEarnings": [
            {"fiscalDateEnding": "2024-06-30", "reportedDate": "2024-07-24", "reportedEPS": "2.43",
             "estimatedEPS": "2.2", "surprise": "0.23", "surprisePercentage": "10.45", "reportTime": "post-market"},
            {"fiscalDateEnding": "2024-03-31", "reportedDate": "2024-04-24", "reportedEPS": "1.68",
             "estimatedEPS": "1.6", "surprise": "0.08", "surprisePercentage": "5", "reportTime": "post-market"}
        ]
    }));

    let table = FundamentalTableAssembler::new(client).quarterly("ibm").await.unwrap();

    let functions: Vec<String> = mock.urls().iter().map(|u| params(u)[0].1.clone()).collect();
    assert_eq!(functions, vec!["BALANCE_SHEET", "INCOME_STATEMENT", "CASH_FLOW", "EARNINGS"]);
    assert!(mock.urls().iter().all(|u| params(u)[1] == ("symbol".to_string(), "ibm".to_string())));

    assert_eq!(table.symbol, "IBM");
    assert_eq!(table.rows.len(), 2);

    let q1 = &table.rows[0];
    let q2 = &table.rows[1];
    assert_eq!(q1.fiscal_date_ending, date("2024-03-31"));
    assert_eq!(q1.get("OPERATING_CASHFLOW"), Some(7.0));
    assert!(q1.has_column("CAPITAL_EXPENDITURES"));
    assert_eq!(q1.get("CAPITAL_EXPENDITURES"), None);

    assert_eq!(q2.fiscal_date_ending, date("2024-06-30"));
    assert!(q2.cash_flow.is_none());
    assert!(!q2.has_column("OPERATING_CASHFLOW"));
    assert_eq!(q2.get("TOTAL_ASSETS"), Some(200.0));
    assert_eq!(q2.get("TOTAL_REVENUE"), Some(20.0));
    assert_eq!(q2.get("REPORTED_E_P_S"), Some(2.43));
    assert_eq!(q2.reported_date, Some(date("2024-07-24")));
    assert_eq!(q2.report_time.as_deref(), Some("post-market"));
    assert_eq!(q2.reported_currency.as_deref(), Some("USD"));
    for statement in [Statement::BalanceSheet, Statement::IncomeStatement, Statement::Earnings] {
        assert!(q2.section(statement).is_some(), "{statement} should be present");
    }

    assert_eq!(table.columns()[0], "TOTAL_ASSETS");
    assert!(table.columns().contains(&"SURPRISE_PERCENTAGE".to_string()));
}

#[tokio::test]
async fn rate_limit_body_surfaces_as_missing_field() {
    let (client, mock) = client();
    mock.ok_json(json!({"Information": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}));

    let err = FundamentalTableAssembler::new(client).quarterly("IBM").await.unwrap_err();

    match err {
        Error::MissingField { field, body } => {
            assert_eq!(field, "quarterlyReports");
            assert!(body.contains("rate limit"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn line_item_shared_by_two_documents_gets_two_columns() {
    let (client, mock) = client();
    let record = |items: serde_json::Value| {
        let mut record = json!({"fiscalDateEnding": "2024-03-31", "reportedCurrency": "USD"});
        record.as_object_mut().unwrap().extend(items.as_object().unwrap().clone());
        json!([record])
    };
    mock.ok_json(quarterly("quarterlyReports", record(json!({"totalAssets": "1000"}))))
        .ok_json(quarterly("quarterlyReports", record(json!({"netIncome": "100"}))))
        .ok_json(quarterly("quarterlyReports", record(json!({"netIncome": "250"}))))
        .ok_json(json!({
            "quarterlyEarnings": [
                {"fiscalDateEnding": "2024-03-31", "reportedDate": "", "reportedEPS": "1.68"}
            ]
        }));

    let table = FundamentalTableAssembler::new(client).quarterly("IBM").await.unwrap();

    assert_eq!(
        table.columns(),
        vec!["TOTAL_ASSETS", "NET_INCOME", "NET_INCOME_CASH_FLOW", "REPORTED_E_P_S"]
    );
    let row = &table.rows[0];
    assert_eq!(row.get("NET_INCOME"), Some(100.0));
    assert_eq!(row.get("NET_INCOME_CASH_FLOW"), Some(250.0));
    assert_eq!(row.reported_date, None);
}

#[tokio::test]
async fn annual_table_reads_annual_reports() {
    let (client, mock) = client();
    for _ in 0..3 {
        mock.ok_json(json!({"annualReports": [{"fiscalDateEnding": "2023-12-31", "totalAssets": "1"}]}));
    }
    mock.ok_json(json!({"annualEarnings": [{"fiscalDateEnding": "2023-12-31", "reportedEPS": "9.6"}]}));

    let table = FundamentalTableAssembler::new(client).annual("IBM").await.unwrap();
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].get("REPORTED_E_P_S"), Some(9.6));
    assert_eq!(mock.calls(), 4);
}

const YEAR_2022: &str = "timestamp,open,high,low,close,volume\n\
2022-12-30 16:00:00,10,11,9,10.5,100\n\
2022-12-30 15:55:00,10,11,9,10.0,90\n";

const YEAR_2023: &str = "timestamp,open,high,low,close,volume\n\
2023-01-03 09:35:00,12,13,11,12.5,300\n\
2023-01-03 09:30:00,11,12,10,11.5,200\n\
2022-12-30 16:00:00,10,11,9,10.5,100\n";

#[tokio::test]
async fn two_years_issue_two_calls_in_chronological_order() {
    let (client, mock) = client();
    mock.respond(200, YEAR_2022).respond(200, YEAR_2023);

    let bars = HistoricSeriesFetcher::new(client)
        .intraday_years("IBM", Interval::FiveMin, 2022..=2023)
        .await
        .unwrap();

    assert_eq!(mock.calls(), 2);
    let urls = mock.urls();
    assert_eq!(
        params(&urls[0]),
        pairs(&[
            ("function", "TIME_SERIES_INTRADAY"),
            ("symbol", "IBM"),
            ("interval", "5min"),
            ("year", "2022"),
            ("outputsize", "full"),
            ("datatype", "csv"),
            ("apikey", KEY),
        ])
    );
    assert!(urls[1].contains("year=2023"));

    let stamps: Vec<String> = bars.iter().map(|b| b.timestamp.to_string()).collect();
    assert_eq!(
        stamps,
        vec![
            "2022-12-30 15:55:00",
            "2022-12-30 16:00:00",
            "2023-01-03 09:30:00",
            "2023-01-03 09:35:00",
        ]
    );
    assert_eq!(bars[3].volume, 300);
}

#[tokio::test]
async fn history_counts_back_from_the_current_year() {
    let (client, mock) = client();
    mock.respond(200, "timestamp,open,high,low,close,volume\n")
        .respond(200, "timestamp,open,high,low,close,volume\n");

    let bars = HistoricSeriesFetcher::new(client)
        .intraday_history("IBM", Interval::SixtyMin, 2)
        .await
        .unwrap();

    assert!(bars.is_empty());
    let current = Utc::now().year();
    let years: Vec<String> = mock
        .urls()
        .iter()
        .filter_map(|u| params(u).into_iter().find(|(k, _)| k == "year").map(|(_, v)| v))
        .collect();
    assert_eq!(years, vec![(current - 1).to_string(), current.to_string()]);
}

#[tokio::test]
async fn trailing_months_use_the_month_parameter() {
    let (client, mock) = client();
    for _ in 0..3 {
        mock.respond(200, "timestamp,open,high,low,close,volume\n");
    }

    HistoricSeriesFetcher::new(client)
        .intraday_months("IBM", Interval::OneMin, 3)
        .await
        .unwrap();

    let today = Utc::now();
    let expected: Vec<String> = YearMonth::new(today.year(), today.month())
        .trailing(3)
        .iter()
        .map(|m| m.to_string())
        .collect();
    let months: Vec<String> = mock
        .urls()
        .iter()
        .filter_map(|u| params(u).into_iter().find(|(k, _)| k == "month").map(|(_, v)| v))
        .collect();
    assert_eq!(months, expected);
}

#[tokio::test]
async fn single_month_is_one_sorted_request() {
    let (client, mock) = client();
    mock.respond(
        200,
        "timestamp,open,high,low,close,volume\n\
2024-03-01 09:35:00,2,2,2,2,20\n\
2024-03-01 09:30:00,1,1,1,1,10\n",
    );

    let bars = HistoricSeriesFetcher::new(client)
        .intraday_month("IBM", Interval::FiveMin, YearMonth::new(2024, 3))
        .await
        .unwrap();

    assert_eq!(
        params(&mock.urls()[0]),
        pairs(&[
            ("function", "TIME_SERIES_INTRADAY"),
            ("symbol", "IBM"),
            ("interval", "5min"),
            ("month", "2024-03"),
            ("outputsize", "full"),
            ("datatype", "csv"),
            ("apikey", KEY),
        ])
    );
    assert_eq!(mock.calls(), 1);
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    assert_eq!(closes, vec![1.0, 2.0]);
}

#[tokio::test]
async fn history_longer_than_the_calendar_is_rejected() {
    let (client, mock) = client();

    let err = HistoricSeriesFetcher::new(client)
        .intraday_history("IBM", Interval::FiveMin, u32::MAX)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidValue { ref field, .. } if field == "years"));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn server_error_propagates_without_retry() {
    let (client, mock) = client();
    mock.respond(500, "Internal Server Error").respond(200, YEAR_2023);

    let err = HistoricSeriesFetcher::new(client)
        .intraday_years("IBM", Interval::FiveMin, 2022..=2023)
        .await
        .unwrap_err();

    match err {
        Error::ApiError { status, message, .. } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn transport_failure_propagates() {
    let (client, mock) = client();

    let err = EconomicSeriesFetcher::new(client)
        .monthly_indicator(EconomicIndicator::Cpi)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn daily_history_is_ascending() {
    let (client, mock) = client();
    mock.ok_json(json!({
        "Meta Data": {"1. Information": "Daily Prices", "2. Symbol": "IBM"},
        "Time Series (Daily)": {
            "2024-01-03": {"1. open": "2", "2. high": "3", "3. low": "1", "4. close": "2.5", "5. volume": "100"},
            "2024-01-02": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5", "5. volume": "50"}
        }
    }));

    let bars = HistoricSeriesFetcher::new(client).daily("IBM", OutputSize::Full).await.unwrap();

    assert_eq!(bars.len(), 2);
    assert!(bars[0].timestamp < bars[1].timestamp);
    assert!(mock.urls()[0].contains("function=TIME_SERIES_DAILY"));
    assert!(mock.urls()[0].contains("outputsize=full"));
}

#[tokio::test]
async fn news_sentiment_splits_the_year_in_halves() {
    let (client, mock) = client();
    let feed = |score: f64| {
        json!({"feed": [{
            "title": "IBM earnings",
            "time_published": "20230630T120000",
            "source": "Wire",
            "overall_sentiment_score": score
        }]})
    };
    mock.ok_json(feed(0.2)).ok_json(feed(-0.5));

    let articles = NewsSentimentFetcher::new(client).year("IBM", 2023).await.unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].overall_sentiment_score, -0.5);
    let urls = mock.urls();
    assert_eq!(urls.len(), 2);
    assert_eq!(
        params(&urls[0]),
        pairs(&[
            ("function", "NEWS_SENTIMENT"),
            ("tickers", "IBM"),
            ("time_from", "20230101T0130"),
            ("time_to", "20230630T0130"),
            ("limit", "1000"),
            ("sort", "RELEVANCE"),
            ("apikey", KEY),
        ])
    );
    assert!(urls[1].contains("time_to=20231231T0130"));
}

#[tokio::test]
async fn compact_daily_requests_latest_bars() {
    let (client, mock) = client();
    mock.ok_json(json!({"Time Series (Daily)": {}}));

    let bars = HistoricSeriesFetcher::new(client).daily("IBM", OutputSize::Compact).await.unwrap();

    assert!(bars.is_empty());
    assert!(mock.urls()[0].contains("outputsize=compact"));
}

#[tokio::test]
async fn news_sentiment_since_first_year_walks_every_year_oldest_first() {
    let (client, mock) = client();
    let current = Utc::now().year();
    let calls = 2 * (current - 2022 + 1) as usize;
    // The same article shows up in every window; the last one scores highest
    for call in 0..calls {
        let score = if call + 1 == calls { -0.9 } else { 0.1 };
        mock.ok_json(json!({"feed": [{
            "title": "IBM guidance",
            "time_published": "20221231T120000",
            "source": "Wire",
            "overall_sentiment_score": score
        }, {
            "title": format!("window {call}"),
            "time_published": "20230102T090000",
            "source": "Wire",
            "overall_sentiment_score": 0.0
        }]}));
    }

    let articles = NewsSentimentFetcher::new(client).since_first_year("IBM").await.unwrap();

    assert_eq!(mock.calls(), calls);
    let windows: Vec<String> = mock
        .urls()
        .iter()
        .filter_map(|u| params(u).into_iter().find(|(k, _)| k == "time_from").map(|(_, v)| v))
        .collect();
    let expected: Vec<String> = (2022..=current)
        .flat_map(|year| [format!("{year}0101T0130"), format!("{year}0630T0130")])
        .collect();
    assert_eq!(windows, expected);

    assert_eq!(articles.len(), 1 + calls);
    assert_eq!(articles[0].title, "IBM guidance");
    assert_eq!(articles[0].overall_sentiment_score, -0.9);
    assert!(articles.windows(2).all(|w| w[0].published <= w[1].published));
}

#[tokio::test]
async fn news_sentiment_rejects_years_without_coverage() {
    let (client, mock) = client();

    let err = NewsSentimentFetcher::new(client).year("IBM", 2019).await.unwrap_err();

    assert!(matches!(err, Error::InvalidYear { year: 2019, first: 2022, .. }));
    assert_eq!(mock.calls(), 0);
}
