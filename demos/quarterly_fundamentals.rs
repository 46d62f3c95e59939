//! Print the quarterly fundamentals table for a symbol.
//!
//! ```sh
//! RUST_LOG=alphav_etl=debug cargo run --example quarterly_fundamentals --features dotenvy -- IBM
//! ```

use alphav_etl::AlphaVantage;
use alphav_etl::pipeline::FundamentalTableAssembler;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "IBM".to_string());
    let assembler = FundamentalTableAssembler::new(AlphaVantage::from_env()?);
    let table = assembler.quarterly(&symbol).await?;

    let columns = table.columns();
    println!("{} quarters, {} line items", table.rows.len(), columns.len());
    for row in &table.rows {
        let missing: Vec<&str> = [
            ("balance sheet", row.balance_sheet.is_none()),
            ("income statement", row.income_statement.is_none()),
            ("cash flow", row.cash_flow.is_none()),
            ("earnings", row.earnings.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        println!(
            "{}  assets={:?}  revenue={:?}  eps={:?}  missing={:?}",
            row.fiscal_date_ending,
            row.get("TOTAL_ASSETS"),
            row.get("TOTAL_REVENUE"),
            row.get("REPORTED_E_P_S"),
            missing
        );
    }
    Ok(())
}
