//! Error types for the Route4Me client.
//!
//! # Design
//! Parameter problems are caught before any request is built and surface as
//! [`ParamValueError`], naming the offending field. Everything that goes wrong
//! once a request is on its way lands in [`ApiError`]. `NotFound` gets a
//! dedicated variant because callers frequently distinguish "the optimization
//! does not exist" from "the server returned something unexpected".

use serde_json::Value;
use thiserror::Error;

use crate::http::HttpMethod;

/// A field value failed its type, range, choice or pattern check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for `{field}`: {constraint}")]
pub struct ParamValueError {
    pub field: String,
    pub constraint: String,
}

impl ParamValueError {
    pub fn new(field: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
        }
    }
}

/// Errors returned by the network client and the endpoint façades.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404: the requested resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The server answered 2xx but the payload did not report success.
    #[error("{method} returned an unexpected response: {response}")]
    UnexpectedResponse { method: HttpMethod, response: Value },

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be decoded into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The host transport could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    InvalidParameter(#[from] ParamValueError),
}

/// Errors raised while assembling a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingApiKey(&'static str),

    #[error("API key must not be empty")]
    EmptyApiKey,
}
