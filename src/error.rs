//! Error types for the Alpha Vantage fetchers

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by requests, processors and fetchers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP client failed before a response was received
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// Error raised by `reqwest`
    #[cfg(feature = "reqwest")]
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    /// The upstream answered with a non-success status
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// Request id echoed by the upstream, if any
        request_id: Option<String>,
        /// HTTP status code
        status: u16,
        /// Raw response body
        message: String,
    },

    /// The body was not valid JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The body was not the expected CSV
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// A field the parser relies on is absent. The raw body is kept unparsed.
    #[error("missing field `{field}` in response: {body}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Raw body (or the offending fragment)
        body: String,
    },

    /// A field holds a value that cannot be interpreted
    #[error("invalid value for `{field}`: {value:?}")]
    InvalidValue {
        /// Name of the field
        field: String,
        /// The value as received
        value: String,
    },

    /// News sentiment is only available for a bounded range of years
    #[error("invalid year {year}: must be between {first} and {last}")]
    InvalidYear {
        /// Requested year
        year: i32,
        /// First accepted year
        first: i32,
        /// Last accepted year
        last: i32,
    },

    /// `ALPHAVANTAGE_API_KEY` could not be found
    #[error("ALPHAVANTAGE_API_KEY is not set")]
    MissingApiKey,

    /// DataFrame construction failed
    #[cfg(feature = "table")]
    #[error(transparent)]
    Polars(#[from] polars_core::error::PolarsError),

    /// Anything else
    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub(crate) fn missing(field: impl Into<String>, body: impl Into<String>) -> Self {
        Error::MissingField {
            field: field.into(),
            body: body.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, value: impl Into<String>) -> Self {
        Error::InvalidValue {
            field: field.into(),
            value: value.into(),
        }
    }
}
