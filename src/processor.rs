//! Processors turn a transport result into the requested output type

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::response::Response;

#[cfg(feature = "table")]
pub mod table;

/// Interprets a response, or forwards the transport error
pub trait Processor {
    /// The output type of the processor
    type Output;

    /// Process the result of a single request
    fn process<R: Response>(&self, response: Result<R>) -> Result<Self::Output>;
}

/// Reject non-success statuses, keeping the body unparsed
fn success<R: Response>(response: Result<R>) -> Result<R> {
    let resp = response?;
    if !resp.is_success() {
        return Err(Error::ApiError {
            request_id: resp.request_id().to_owned(),
            status: resp.status(),
            message: resp.body().to_owned(),
        });
    }
    Ok(resp)
}

/// Returns the body text unchanged
pub struct Raw;

impl Processor for Raw {
    type Output = String;

    fn process<R: Response>(&self, response: Result<R>) -> Result<String> {
        Ok(success(response)?.body().to_owned())
    }
}

/// Parses the body as a JSON document
pub struct Json;

impl Processor for Json {
    type Output = serde_json::Value;

    fn process<R: Response>(&self, response: Result<R>) -> Result<serde_json::Value> {
        let resp = success(response)?;
        Ok(serde_json::from_str(resp.body())?)
    }
}

/// Parses the body as CSV with a header row, deserializing each record as `T`
pub struct Csv<T>(pub(crate) PhantomData<fn() -> T>);

impl<T> Default for Csv<T> {
    fn default() -> Self {
        Csv(PhantomData)
    }
}

impl<T: DeserializeOwned> Processor for Csv<T> {
    type Output = Vec<T>;

    fn process<R: Response>(&self, response: Result<R>) -> Result<Vec<T>> {
        let resp = success(response)?;
        // Error payloads arrive as JSON even when CSV was requested
        if resp.body().trim_start().starts_with('{') {
            return Err(Error::invalid("csv body", resp.body()));
        }
        let mut reader = csv::Reader::from_reader(resp.body().as_bytes());
        let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
        Ok(rows)
    }
}
