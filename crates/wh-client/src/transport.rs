//! HTTP transport boundary.
//!
//! Requests and responses are plain data. The client builds [`ApiRequest`]
//! values and hands them to an [`HttpTransport`], which owns the actual I/O,
//! timeouts and retries.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use wh_core::Result;

/// A fully built request, ready for a transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Base path, request path and encoded query
    pub url: Url,
    /// Request headers, including credentials
    pub headers: HeaderMap,
    /// JSON body, if any
    pub body: Option<serde_json::Value>,
    /// Whether the transport should send cookies cross-origin
    pub with_credentials: bool,
}

impl ApiRequest {
    /// Value of a header as text, if present and printable.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A response returned by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as text
    pub body: String,
}

impl ApiResponse {
    /// Create a response with no headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Create a `200 OK` response carrying a JSON body.
    #[must_use]
    pub fn ok_json(body: &serde_json::Value) -> Self {
        Self::new(StatusCode::OK, body.to_string())
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `R`.
    pub fn json<R: DeserializeOwned>(&self) -> Result<R> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Executes requests on behalf of the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return the raw response.
    ///
    /// Non-success statuses are returned as responses, not errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be delivered.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}
