//! Blocking, typed JSON-over-HTTP client.
//!
//! # Overview
//! A caller supplies a logical request (method, URL, payload); the `codec`
//! encodes the payload, a `Transport` sends it and returns the raw response,
//! and the `codec` decodes the body into a typed value or an error.
//!
//! # Design
//! - `JsonClient` holds only configuration, an optional `RateLimiter` and a
//!   `Transport`; no per-request state.
//! - Each operation splits into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`), so the I/O boundary is explicit
//!   and both halves are testable without a network.
//! - `HttpTransport` is the default `ureq` transport; anything implementing
//!   `Transport` can replace it.
//! - `CrptApi` builds on `JsonClient` for the CRPT document creation endpoint.

pub mod client;
pub mod codec;
pub mod config;
pub mod crpt;
pub mod document;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod transport;

pub use client::JsonClient;
pub use codec::{decode, encode};
pub use config::{ClientConfig, RateLimitConfig};
pub use crpt::CrptApi;
pub use document::{Description, Document, Product};
pub use error::{ApiError, CodecError, RequestError, TransportError};
pub use http::{Headers, HttpMethod, HttpRequest, HttpResponse, RequestBuilder};
pub use rate_limit::RateLimiter;
pub use transport::{HttpTransport, Transport};
