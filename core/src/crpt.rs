//! Client for the CRPT ("Chestny Znak") document creation endpoint.
//!
//! # Design
//! A thin layer over `JsonClient`: it knows the endpoint path, the
//! `signature` and bearer `authorization` headers, and that success is
//! `200 OK`. Both credentials come from the caller unchanged. Requests go
//! through the client's rate limiter, so `ClientConfig::rate_limit` caps how
//! many documents are submitted per window.

use serde_json::Value;

use crate::client::{check_status, JsonClient};
use crate::config::ClientConfig;
use crate::document::Document;
use crate::error::ApiError;
use crate::http::{Headers, HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{HttpTransport, Transport};

pub const CREATE_DOCUMENT_PATH: &str = "/api/v3/lk/documents/create";

#[derive(Debug)]
pub struct CrptApi<T = HttpTransport> {
    client: JsonClient<T>,
}

impl CrptApi<HttpTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: JsonClient::new(config)?,
        })
    }
}

impl<T: Transport> CrptApi<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ApiError> {
        Ok(Self {
            client: JsonClient::with_transport(config, transport)?,
        })
    }

    pub fn client(&self) -> &JsonClient<T> {
        &self.client
    }

    pub fn build_create_document(
        &self,
        document: &Document,
        signature: &str,
        auth_token: &str,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = Headers::new();
        headers.insert("signature", signature);
        headers.insert("authorization", format!("Bearer {auth_token}"));
        self.client.build_request_with_headers(
            HttpMethod::Post,
            CREATE_DOCUMENT_PATH,
            Some(document),
            &headers,
        )
    }

    /// Decode the body of a `200 OK`; any other status is an error.
    pub fn parse_create_document(&self, response: &HttpResponse) -> Result<Value, ApiError> {
        check_status(response, 200)?;
        if response.body().is_empty() {
            return Ok(Value::Null);
        }
        Ok(response.json()?)
    }

    /// Submit `document`, blocking while the rate limit is exhausted.
    pub fn create_document(
        &self,
        document: &Document,
        signature: &str,
        auth_token: &str,
    ) -> Result<Value, ApiError> {
        let request = self.build_create_document(document, signature, auth_token)?;
        let response = match self.client.execute(&request) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(doc_id = %document.doc_id, error = %err, "failed to send document");
                return Err(err);
            }
        };
        if let Err(err) = check_status(&response, 200) {
            tracing::warn!(
                doc_id = %document.doc_id,
                status = response.status(),
                body = %response.text(),
                "document creation rejected"
            );
            return Err(err);
        }
        match self.parse_create_document(&response) {
            Ok(body) => {
                tracing::info!(doc_id = %document.doc_id, %body, "document created");
                Ok(body)
            }
            Err(err) => {
                tracing::warn!(
                    doc_id = %document.doc_id,
                    error = %err,
                    body = %response.text(),
                    "document accepted but response body is not JSON"
                );
                Err(err)
            }
        }
    }
}
