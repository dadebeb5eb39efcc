//! Typed JSON client over a pluggable `Transport`.
//!
//! # Design
//! Every call is split into a `build_request` step that produces an
//! `HttpRequest` and a `parse_response` step that consumes an `HttpResponse`.
//! Both halves are pure and usable on their own when the host wants to run
//! the HTTP round-trip itself. `execute` connects them through the
//! configured `Transport`, taking a rate-limit permit first when one is
//! configured.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::{self, JSON_CONTENT_TYPE};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};
use crate::rate_limit::RateLimiter;
use crate::transport::{HttpTransport, Transport};

/// Client for a JSON API rooted at `ClientConfig::base_url`.
///
/// Holds no per-request state; share it across threads behind an `Arc`.
#[derive(Debug)]
pub struct JsonClient<T = HttpTransport> {
    base_url: String,
    default_headers: Headers,
    limiter: Option<RateLimiter>,
    transport: T,
}

impl JsonClient<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> JsonClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        config.validate()?;
        let mut default_headers: Headers = config.default_headers.iter().collect();
        if let Some(agent) = &config.user_agent {
            default_headers.insert("user-agent", agent.as_str());
        }
        let limiter = config
            .rate_limit
            .map(|limit| RateLimiter::new(limit.requests, limit.window()))
            .transpose()?;
        Ok(Self {
            base_url: config.trimmed_base_url().to_string(),
            default_headers,
            limiter,
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.limiter.as_ref()
    }

    /// Build a request for `path` (joined onto the base URL) with an
    /// optional JSON payload.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&B>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request_with_headers(method, path, payload, &Headers::new())
    }

    /// Like `build_request`, with per-request headers that override the
    /// configured defaults.
    pub fn build_request_with_headers<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&B>,
        headers: &Headers,
    ) -> Result<HttpRequest, ApiError> {
        let mut builder = HttpRequest::builder(method, self.url_for(path))
            .headers(&self.default_headers)
            .header("accept", JSON_CONTENT_TYPE);
        if let Some(payload) = payload {
            builder = builder
                .header("content-type", JSON_CONTENT_TYPE)
                .body(codec::encode(payload)?);
        }
        Ok(builder.headers(headers).build()?)
    }

    /// Check that `response` has `expected` status and decode its body.
    pub fn parse_response<R: DeserializeOwned>(
        &self,
        response: &HttpResponse,
        expected: u16,
    ) -> Result<R, ApiError> {
        check_status(response, expected)?;
        Ok(response.json()?)
    }

    /// Send `request` through the transport, waiting for a rate-limit
    /// permit first if a limit is configured.
    pub fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire();
        }
        Ok(self.transport.send(request)?)
    }

    pub fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        let request = self.build_request::<()>(HttpMethod::Get, path, None)?;
        self.parse_response(&self.execute(&request)?, 200)
    }

    pub fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        payload: &B,
        expected: u16,
    ) -> Result<R, ApiError> {
        let request = self.build_request(HttpMethod::Post, path, Some(payload))?;
        self.parse_response(&self.execute(&request)?, expected)
    }

    pub fn put<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        payload: &B,
    ) -> Result<R, ApiError> {
        let request = self.build_request(HttpMethod::Put, path, Some(payload))?;
        self.parse_response(&self.execute(&request)?, 200)
    }

    /// Delete the resource at `path`; any 2xx status counts as success.
    pub fn delete(&self, path: &str) -> Result<(), ApiError> {
        let request = self.build_request::<()>(HttpMethod::Delete, path, None)?;
        let response = self.execute(&request)?;
        if response.is_success() {
            return Ok(());
        }
        Err(status_error(&response))
    }

    fn url_for(&self, path: &str) -> String {
        if path.is_empty() || path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

/// Map a status other than `expected` to the appropriate `ApiError` variant.
pub(crate) fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status() == expected {
        return Ok(());
    }
    Err(status_error(response))
}

fn status_error(response: &HttpResponse) -> ApiError {
    if response.status() == 404 {
        return ApiError::NotFound;
    }
    ApiError::HttpError {
        status: response.status(),
        body: response.text(),
    }
}
