//! Alpha Vantage API client and credential
use std::fmt;

use crate::request::{Query, Request};

/// Fixed upstream endpoint
pub const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage API key.
///
/// Opaque: never validated, and redacted in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as sent in the `apikey` parameter
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        ApiKey::new(key)
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        ApiKey(key)
    }
}

/// The main Alpha Vantage API client.
///
/// When the `reqwest` feature is enabled, this uses `reqwest::Client` as the default HTTP client.
/// When the `hyper` feature is enabled, this uses `HyperClient` as the default HTTP client.
/// Otherwise, you must provide your own HTTP client that implements [`Request`].
#[cfg(feature = "reqwest")]
#[derive(Debug, Clone)]
pub struct AlphaVantage<Client: Request = reqwest::Client> {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

/// The main Alpha Vantage API client.
///
/// When the `reqwest` feature is enabled, this uses `reqwest::Client` as the default HTTP client.
/// When the `hyper` feature is enabled, this uses `HyperClient` as the default HTTP client.
/// Otherwise, you must provide your own HTTP client that implements [`Request`].
#[cfg(all(feature = "hyper", not(feature = "reqwest")))]
#[derive(Debug, Clone)]
pub struct AlphaVantage<Client: Request = crate::request::HyperClient> {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

/// The main Alpha Vantage API client.
///
/// You must provide your own HTTP client that implements [`Request`].
#[cfg(not(any(feature = "reqwest", feature = "hyper")))]
#[derive(Debug, Clone)]
pub struct AlphaVantage<Client: Request> {
    client: Client,
    api_key: ApiKey,
    base_url: String,
}

impl<Client: Request> AlphaVantage<Client> {
    /// Create a client for the given API key using a fresh HTTP client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use alphav_etl::AlphaVantage;
    ///
    /// let client = AlphaVantage::new("my_api_key");
    /// ```
    pub fn new(api_key: impl Into<ApiKey>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Create a client whose key is read from `ALPHAVANTAGE_API_KEY`.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingApiKey`](crate::Error::MissingApiKey) if the variable is not set.
    #[cfg(feature = "dotenvy")]
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("ALPHAVANTAGE_API_KEY").map_err(|_| crate::Error::MissingApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Sets the HTTP client for this instance.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Point requests at another endpoint than [`BASE_URL`].
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Get the API key for this instance.
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Endpoint every request is sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get a reference to the underlying HTTP client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Start a query for an upstream `function`
    pub fn query(&self, function: impl Into<String>) -> Query<'_, Client> {
        Query::new(self, function)
    }
}
