//! Execute trait for running a single upstream request
//!
//! Every [`Query`](crate::request::Query) implements `Execute`; its `.get()`
//! issues one GET and hands the result to the query's processor.

use crate::error::Result;

/// Trait for executing API requests
pub trait Execute {
    /// The output type of the request
    type Output;

    /// Execute the request and return the processed result
    fn get(self) -> impl std::future::Future<Output = Result<Self::Output>>;
}
