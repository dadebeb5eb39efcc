//! Error types for the JSON API client.
//!
//! # Design
//! Each layer has its own error: `TransportError` for network I/O,
//! `CodecError` for JSON encoding and decoding, `RequestError` for building
//! a request. `ApiError` is what client methods return and wraps the others.
//!
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other unexpected statuses land in `HttpError` with the raw
//! status code and body for debugging.

use std::time::Duration;

use thiserror::Error;

/// Failures of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The host could not be reached or the connection broke mid-exchange.
    #[error("connection to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    /// The server answered with something that could not be read as an
    /// HTTP response, or the body exceeded the read limit.
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// The exchange did not complete within the configured deadline.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
}

/// JSON serialization failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(String),

    /// The bytes were not JSON or did not match the target shape.
    #[error("deserialization failed: {0}")]
    Decode(String),
}

/// Invalid request parts.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("unsupported HTTP method `{0}`")]
    UnsupportedMethod(String),
}

/// Errors returned by `JsonClient` and `CrptApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Request(#[from] RequestError),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a status other than the one expected.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport(TransportError::Timeout { .. }))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, ApiError::Transport(TransportError::Connection { .. }))
    }

    /// The HTTP status carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
