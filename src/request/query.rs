//! Generic query builder shared by every fetcher
//!
//! A [`Query`] holds the upstream `function` name and an ordered list of
//! parameters. The URL is rendered as `BASE?function=..&<params>&apikey=..`;
//! values are form-urlencoded but otherwise passed through untouched, the
//! upstream decides what is valid.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::AlphaVantage;
use crate::error::{Error, Result};
use crate::execute::Execute;
use crate::processor::{Csv, Json, Processor, Raw};
use crate::request::Request;

/// Render a request URL from its parts.
///
/// `function` comes first and `apikey` last; `params` keep their order.
pub fn build_url(base_url: &str, function: &str, params: &[(String, String)], api_key: &str) -> Result<String> {
    let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
    pairs.push(("function", function));
    pairs.extend(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    pairs.push(("apikey", api_key));

    let query = serde_urlencoded::to_string(&pairs).map_err(|e| Error::Custom(format!("Failed to encode query: {e}")))?;
    Ok(format!("{base_url}?{query}"))
}

/// Request builder for a single upstream call
pub struct Query<'a, Client: Request, P: Processor = Raw> {
    client: &'a AlphaVantage<Client>,
    function: String,
    params: Vec<(String, String)>,
    processor: P,
}

// Constructor - always starts with Raw
impl<'a, C: Request> Query<'a, C, Raw> {
    /// Create a query for the given upstream function (returns the raw body by default)
    pub fn new(client: &'a AlphaVantage<C>, function: impl Into<String>) -> Self {
        Self {
            client,
            function: function.into(),
            params: Vec::new(),
            processor: Raw,
        }
    }
}

impl<'a, C: Request, P: Processor + 'a> Query<'a, C, P> {
    /// Execute the request and return the result
    pub fn get(self) -> impl std::future::Future<Output = Result<P::Output>> + 'a {
        Execute::get(self)
    }

    /// Append a query parameter
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Upstream function name
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Parameters added so far, excluding `function` and `apikey`
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Render the full request URL
    pub fn url(&self) -> Result<String> {
        build_url(
            self.client.base_url(),
            &self.function,
            &self.params,
            self.client.api_key().expose(),
        )
    }

    /// Swap the processor used to interpret the response
    pub fn process_with<Q: Processor>(self, processor: Q) -> Query<'a, C, Q> {
        Query {
            client: self.client,
            function: self.function,
            params: self.params,
            processor,
        }
    }

    /// Parse the response body as JSON
    pub fn json(self) -> Query<'a, C, Json> {
        self.process_with(Json)
    }

    /// Request CSV output (`datatype=csv`) and deserialize every row as `T`.
    ///
    /// Without it the upstream answers in JSON.
    pub fn csv<T: DeserializeOwned>(self) -> Query<'a, C, Csv<T>> {
        self.param("datatype", "csv").process_with(Csv(PhantomData))
    }
}

impl<'a, C: Request, P: Processor + 'a> Execute for Query<'a, C, P> {
    type Output = P::Output;

    #[allow(refining_impl_trait_reachable)]
    async fn get(self) -> Result<P::Output> {
        let url = self.url()?;
        debug!(function = %self.function, params = ?self.params, "requesting");

        // Make request using Request trait
        let response = self.client.client().get(&url).await;

        // Process using associated Processor type
        self.processor.process(response)
    }
}
