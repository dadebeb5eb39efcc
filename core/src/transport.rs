//! Network I/O for a single HTTP exchange.
//!
//! # Design
//! `Transport` is the only seam that touches the network. `JsonClient` is
//! generic over it, so tests can swap in an in-memory implementation and
//! hosts can plug in their own HTTP stack.
//!
//! `HttpTransport` is the blocking `ureq` implementation. Its agent keeps no
//! idle connections, so every call opens and closes its own connection, and
//! it reports 4xx/5xx as ordinary responses: status interpretation belongs
//! to the client, not the transport.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::TransportError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};

/// Executes one `HttpRequest` and yields exactly one `HttpResponse` or one
/// `TransportError`.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking HTTP/1.1 transport backed by `ureq`.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    timeout: Duration,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport whose calls fail with `TransportError::Timeout`
    /// once `timeout` elapses.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .max_idle_connections(0)
            .max_idle_connections_per_host(0)
            .build()
            .new_agent();
        Self { agent, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, url: &str, err: ureq::Error) -> TransportError {
        match err {
            ureq::Error::Timeout(_) => TransportError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            },
            ureq::Error::Io(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                TransportError::Timeout {
                    url: url.to_string(),
                    timeout: self.timeout,
                }
            }
            ureq::Error::Http(_) | ureq::Error::BodyExceedsLimit(_) => {
                TransportError::InvalidResponse {
                    url: url.to_string(),
                    reason: err.to_string(),
                }
            }
            other => TransportError::Connection {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &Headers) -> ureq::RequestBuilder<B> {
    for (name, value) in headers.iter() {
        builder = builder.header(name, value);
    }
    builder
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url().as_str();
        let headers = request.headers();
        let started = Instant::now();

        let result = match (request.method(), request.body()) {
            (HttpMethod::Get, None) => with_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Get, Some(body)) => with_headers(self.agent.get(url), headers)
                .force_send_body()
                .send(body),
            (HttpMethod::Delete, None) => with_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Delete, Some(body)) => with_headers(self.agent.delete(url), headers)
                .force_send_body()
                .send(body),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(url), headers).send(body),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(url), headers).send(body),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), headers).send_empty(),
        };

        let mut response = match result {
            Ok(response) => response,
            Err(e) => {
                let err = self.classify(url, e);
                tracing::warn!(method = %request.method(), url, error = %err, "request failed");
                return Err(err);
            }
        };

        let status = response.status().as_u16();
        let response_headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| self.classify(url, e))?;

        tracing::debug!(
            method = %request.method(),
            url,
            status,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );

        Ok(HttpResponse::new(status, response_headers, body))
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn transport_is_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpTransport>();
        assert_send_sync::<Box<dyn Transport>>();
    }

    #[test]
    fn refused_connection_is_connection_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let request = HttpRequest::builder(HttpMethod::Get, format!("http://127.0.0.1:{port}/echo"))
            .build()
            .unwrap();
        let err = HttpTransport::new(Duration::from_secs(2)).send(&request).unwrap_err();
        assert!(matches!(err, TransportError::Connection { .. }), "got {err:?}");
    }

    #[test]
    fn timeouts_are_classified() {
        let transport = HttpTransport::new(Duration::from_millis(100));
        let err = transport.classify(
            "http://localhost/delay",
            ureq::Error::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")),
        );
        assert!(matches!(err, TransportError::Timeout { .. }));
    }

    #[test]
    fn malformed_responses_are_not_connection_errors() {
        let transport = HttpTransport::new(Duration::from_secs(1));

        let err = transport.classify("http://localhost/big", ureq::Error::BodyExceedsLimit(10));
        assert!(matches!(err, TransportError::InvalidResponse { .. }), "got {err:?}");

        let bad_value = ureq::http::HeaderValue::from_str("a\nb").unwrap_err();
        let err = transport.classify(
            "http://localhost/echo",
            ureq::Error::Http(ureq::http::Error::from(bad_value)),
        );
        assert!(matches!(err, TransportError::InvalidResponse { .. }), "got {err:?}");
    }

    #[test]
    fn debug_hides_agent_internals() {
        let transport = HttpTransport::new(Duration::from_millis(250));
        assert_eq!(format!("{transport:?}"), "HttpTransport { timeout: 250ms, .. }");
    }
}
