//! Base service for WH Open API requests.
//!
//! [`ApiClient`] takes its [`Configuration`] and [`HttpTransport`] explicitly.
//! Per-endpoint code builds a [`QueryParams`] collection, assembles a request
//! with [`ApiClient::request`], and sends it through the transport.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use wh_core::config::BEARER_AUTH;
use wh_core::{add_to_params, Configuration, Error, ParamValue, QueryParamStyle, QueryParams, Result};

use crate::transport::{ApiRequest, ApiResponse, HttpTransport};

const USER_AGENT: &str = concat!("wh-client/", env!("CARGO_PKG_VERSION"));

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    transport: Arc<dyn HttpTransport>,
    configuration: Configuration,
    default_headers: HeaderMap,
    error: Option<Error>,
}

impl ApiClientBuilder {
    /// Create a builder around a transport, using the default configuration.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        Self {
            transport,
            configuration: Configuration::default(),
            default_headers,
            error: None,
        }
    }

    /// Override the configuration.
    #[must_use]
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = configuration;
        self
    }

    /// Add a header sent with every request.
    ///
    /// An invalid name or value is reported by [`ApiClientBuilder::build`].
    #[must_use]
    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.default_headers.insert(name, value);
            }
            (Err(err), _) => {
                self.error.get_or_insert(err.into());
            }
            (_, Err(err)) => {
                self.error.get_or_insert(err.into());
            }
        }
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if a default header is not valid HTTP.
    pub fn build(mut self) -> Result<ApiClient> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        Ok(self.into_client())
    }

    fn into_client(self) -> ApiClient {
        ApiClient {
            configuration: Arc::new(self.configuration),
            transport: self.transport,
            default_headers: self.default_headers,
        }
    }
}

/// Shared request construction for every WH Open API service.
#[derive(Clone)]
pub struct ApiClient {
    configuration: Arc<Configuration>,
    transport: Arc<dyn HttpTransport>,
    default_headers: HeaderMap,
}

impl ApiClient {
    /// Construct a client from a configuration and a transport.
    #[must_use]
    pub fn new(configuration: Configuration, transport: Arc<dyn HttpTransport>) -> Self {
        ApiClientBuilder::new(transport)
            .with_configuration(configuration)
            .into_client()
    }

    /// Start building a client around a transport.
    #[must_use]
    pub fn builder(transport: Arc<dyn HttpTransport>) -> ApiClientBuilder {
        ApiClientBuilder::new(transport)
    }

    /// The client configuration.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Headers sent with every request.
    #[must_use]
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// A new, empty query collection using the configured codec.
    #[must_use]
    pub fn query(&self) -> QueryParams {
        self.configuration.query_params()
    }

    /// Add a typed value to a query collection using OpenAPI style rules.
    ///
    /// # Errors
    ///
    /// Returns an error for a `deepObject` parameter given a non-object value.
    pub fn add_to_params<'a>(
        &self,
        params: &'a mut QueryParams,
        key: &str,
        value: &ParamValue,
        style: QueryParamStyle,
        explode: bool,
    ) -> Result<&'a mut QueryParams> {
        add_to_params(params, key, value, style, explode)
    }

    /// Unwrap a required parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingParameter`] when the value is absent.
    pub fn require<T>(value: Option<T>, name: &str, operation: &str) -> Result<T> {
        value.ok_or_else(|| Error::MissingParameter {
            name: name.to_string(),
            operation: operation.to_string(),
        })
    }

    /// Returns true if the operation accepts `multipart/form-data`.
    #[must_use]
    pub fn can_consume_form(consumes: &[&str]) -> bool {
        consumes.contains(&"multipart/form-data")
    }

    /// Start a request for `path`, relative to the configured base path.
    #[must_use]
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder<'_> {
        RequestBuilder {
            client: self,
            method,
            path: path.to_string(),
            headers: self.default_headers.clone(),
            query: None,
            body: None,
            error: None,
        }
    }

    /// Send a request and return the successful response.
    ///
    /// # Errors
    ///
    /// Returns a transport error, or an error mapped from a non-2xx status.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");
        let method = request.method.clone();
        let url = request.url.clone();

        let response = self.transport.execute(request).await?;
        if response.is_success() {
            return Ok(response);
        }

        warn!(
            method = %method,
            url = %url,
            status = response.status.as_u16(),
            "request failed"
        );
        Err(map_status_to_error(response.status, response.body))
    }

    /// Send a request and deserialize the JSON response body.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails or the body does not match `R`.
    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        self.send(request).await?.json()
    }

    /// Send a request and discard the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }
}

/// Assembles one [`ApiRequest`].
///
/// Header and body errors are held until [`RequestBuilder::build`].
pub struct RequestBuilder<'a> {
    client: &'a ApiClient,
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Option<QueryParams>,
    body: Option<serde_json::Value>,
    error: Option<Error>,
}

impl RequestBuilder<'_> {
    /// Attach `Authorization: Bearer <token>` when the `bearerAuth`
    /// credential is available.
    #[must_use]
    pub fn bearer_auth(self) -> Self {
        self.credential_header(BEARER_AUTH, "Authorization", Some("Bearer "))
    }

    /// Attach a credential as a header when it is available.
    #[must_use]
    pub fn credential_header(mut self, credential_key: &str, header: &str, prefix: Option<&str>) -> Self {
        if let Err(err) = self.client.configuration.add_credential_to_headers(
            credential_key,
            header,
            &mut self.headers,
            prefix,
        ) {
            self.error.get_or_insert(err);
        }
        self
    }

    /// Attach the query parameters.
    #[must_use]
    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = Some(query);
        self
    }

    /// Set `Accept` from the operation's produced media types.
    #[must_use]
    pub fn accept(self, accepts: &[&str]) -> Self {
        match Configuration::select_header_accept(accepts) {
            Some(selected) => self.header(ACCEPT.as_str(), selected),
            None => self,
        }
    }

    /// Set `Content-Type` from the operation's consumed media types.
    #[must_use]
    pub fn content_type(self, consumes: &[&str]) -> Self {
        match Configuration::select_header_content_type(consumes) {
            Some(selected) => self.header(CONTENT_TYPE.as_str(), selected),
            None => self,
        }
    }

    /// Set a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(err), _) => {
                self.error.get_or_insert(err.into());
            }
            (_, Err(err)) => {
                self.error.get_or_insert(err.into());
            }
        }
        self
    }

    /// Serialize `body` as the JSON request body.
    #[must_use]
    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(value),
            Err(err) => {
                self.error.get_or_insert(err.into());
            }
        }
        self
    }

    /// Finish the request.
    ///
    /// # Errors
    ///
    /// Returns the first header or body error recorded while building, or an
    /// error if the base path and request path do not form a valid URL.
    pub fn build(self) -> Result<ApiRequest> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let configuration = &self.client.configuration;
        let mut url = Url::parse(&format!("{}{}", configuration.base_path(), self.path))?;
        if let Some(query) = &self.query {
            query.to_http_params().apply_to(&mut url);
        }
        debug!(method = %self.method, url = %url, "built request");

        Ok(ApiRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            with_credentials: configuration.sends_credentials(),
        })
    }
}

fn map_status_to_error(status: StatusCode, text: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::NotFound(text),
        StatusCode::BAD_REQUEST => Error::BadRequest(text),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized(text),
        StatusCode::CONFLICT => Error::Conflict(text),
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => Error::ServiceUnavailable(text),
        status => Error::Http {
            status: status.as_u16(),
            message: text,
        },
    }
}
