//! Alpha Vantage fetchers for economic indicators, fundamentals and price history
//!
//! # Quick Start
//!
//! ```no_run
//! use alphav_etl::AlphaVantage;
//! use alphav_etl::pipeline::FundamentalTableAssembler;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let assembler = FundamentalTableAssembler::new(AlphaVantage::new("your_api_key"));
//!     let table = assembler.quarterly("IBM").await?;
//!     for row in &table.rows {
//!         println!("{} {:?}", row.fiscal_date_ending, row.get("TOTAL_ASSETS"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Fetchers
//!
//! Each fetcher owns an [`AlphaVantage`] client, and with it the API key:
//!
//! - [`EconomicSeriesFetcher`](pipeline::EconomicSeriesFetcher) - treasury yields, federal funds rate,
//!   monthly indicators.
//! - [`FundamentalTableAssembler`](pipeline::FundamentalTableAssembler) - balance sheet, income statement,
//!   cash flow and earnings merged per fiscal quarter.
//! - [`HistoricSeriesFetcher`](pipeline::HistoricSeriesFetcher) - multi-year intraday and daily bars.
//! - [`NewsSentimentFetcher`](pipeline::NewsSentimentFetcher) - news feed sentiment.
//!
//! Single calls can also be made directly:
//!
//! ```no_run
//! use alphav_etl::AlphaVantage;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AlphaVantage::new("your_api_key");
//! let json = client.query("CPI").param("interval", "monthly").json().get().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **`hyper`** (default) - Uses [`hyper`](https://docs.rs/hyper) as the HTTP client.
//!
//! - **`reqwest`** - Alternative HTTP client using [`reqwest`](https://docs.rs/reqwest).
//!   To use reqwest instead: `default-features = false, features = ["reqwest"]`.
//!
//! - **`dotenvy`** - Adds `AlphaVantage::from_env()`, which loads `ALPHAVANTAGE_API_KEY`
//!   from `.env` or the environment.
//!
//! - **`table`** - Converts every table type to a Polars `DataFrame`.

#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod execute;
pub mod pipeline;
pub mod processor;
pub mod request;
pub mod response;

pub use client::ApiKey;
pub use error::{Error, Result};
pub use request::Request;
pub use response::Response;

/// The main Alpha Vantage API client with the default HTTP client.
///
/// - When `hyper` feature is enabled (default): uses `HyperClient`
/// - When `reqwest` feature is enabled: uses `reqwest::Client`
/// - Otherwise: use `client::AlphaVantage<YourClient>` directly
#[cfg(feature = "reqwest")]
pub type AlphaVantage = client::AlphaVantage<reqwest::Client>;

/// The main Alpha Vantage API client with the default HTTP client.
///
/// - When `hyper` feature is enabled (default): uses `HyperClient`
/// - When `reqwest` feature is enabled: uses `reqwest::Client`
/// - Otherwise: use `client::AlphaVantage<YourClient>` directly
#[cfg(all(feature = "hyper", not(feature = "reqwest")))]
pub type AlphaVantage = client::AlphaVantage<request::HyperClient>;

// When neither reqwest nor hyper is enabled, re-export the generic AlphaVantage
#[cfg(not(any(feature = "reqwest", feature = "hyper")))]
pub use client::AlphaVantage;
