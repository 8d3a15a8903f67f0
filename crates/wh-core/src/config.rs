//! Client configuration and credential lookup.
//!
//! A [`Configuration`] is passed explicitly to whatever builds requests. It
//! carries the base path, credentials resolved lazily at request-build time,
//! and the codec used for query parameters.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use validator::Validate;

use crate::codec::{encode_component, ParameterCodec, PercentCodec};
use crate::error::{Error, Result};
use crate::query::QueryParams;
use crate::value::{format_date, ParamValue};

/// Base path used when none is configured.
pub const DEFAULT_BASE_PATH: &str = "http://localhost:8080";

/// Credential name used for bearer token authentication.
pub const BEARER_AUTH: &str = "bearerAuth";

/// Closure returning the current value of a credential.
pub type CredentialProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// A credential value: either fixed or computed on every lookup.
pub enum Credential {
    /// Literal secret
    Static(SecretString),
    /// Resolved each time a request is built
    Provider(CredentialProvider),
}

impl Credential {
    /// Create a fixed credential.
    pub fn fixed(value: impl Into<String>) -> Self {
        Self::Static(SecretString::from(value.into()))
    }

    /// Create a credential backed by a provider closure.
    pub fn provider<F>(provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        Self::Provider(Arc::new(provider))
    }

    /// Resolve the current value.
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::Static(secret) => Some(secret.expose_secret().to_string()),
            Self::Provider(provider) => provider(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(_) => f.write_str("Credential::Static([REDACTED])"),
            Self::Provider(_) => f.write_str("Credential::Provider(..)"),
        }
    }
}

/// Configuration shared by every request a client builds.
#[derive(Debug, Validate)]
pub struct Configuration {
    /// Base URL prepended to every request path
    #[validate(url)]
    base_path: String,

    /// Whether the transport should send cookies and auth on cross-origin calls
    with_credentials: bool,

    /// Username for basic authentication
    username: Option<String>,

    /// Password for basic authentication
    password: Option<SecretString>,

    /// Token used by the default `bearerAuth` credential
    access_token: Option<Credential>,

    /// Legacy API keys by name
    api_keys: HashMap<String, SecretString>,

    /// Credentials keyed by security scheme name
    credentials: HashMap<String, Credential>,

    /// Codec for query keys and values
    codec: Option<Arc<dyn ParameterCodec>>,
}

impl Configuration {
    /// Create a configuration for the given base path.
    ///
    /// A trailing `/` on the base path is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the base path is not a valid URL.
    pub fn new(base_path: impl Into<String>) -> Result<Self> {
        let config = Self {
            base_path: base_path.into().trim_end_matches('/').to_string(),
            ..Self::default()
        };

        config
            .validate()
            .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set the `with_credentials` flag.
    #[must_use]
    pub const fn with_credentials(mut self, enabled: bool) -> Self {
        self.with_credentials = enabled;
        self
    }

    /// Set basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Set a fixed access token for `bearerAuth`.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(Credential::fixed(token));
        self
    }

    /// Set an access token provider for `bearerAuth`.
    #[must_use]
    pub fn with_access_token_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.access_token = Some(Credential::provider(provider));
        self
    }

    /// Register a credential for a security scheme.
    #[must_use]
    pub fn with_credential(mut self, key: impl Into<String>, credential: Credential) -> Self {
        self.credentials.insert(key.into(), credential);
        self
    }

    /// Register a legacy API key.
    #[must_use]
    pub fn with_api_key(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.api_keys
            .insert(name.into(), SecretString::from(value.into()));
        self
    }

    /// Use a custom codec for query parameters.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn ParameterCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Whether requests carry credentials cross-origin.
    #[must_use]
    pub const fn sends_credentials(&self) -> bool {
        self.with_credentials
    }

    /// Username for basic authentication, if set.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Password for basic authentication, if set.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|secret| secret.expose_secret())
    }

    /// Legacy API key by name.
    #[must_use]
    pub fn api_key(&self, name: &str) -> Option<&str> {
        self.api_keys.get(name).map(|secret| secret.expose_secret())
    }

    /// Codec for query parameters; percent-encoding unless overridden.
    #[must_use]
    pub fn codec(&self) -> Arc<dyn ParameterCodec> {
        self.codec
            .clone()
            .unwrap_or_else(|| Arc::new(PercentCodec))
    }

    /// Create an empty query collection using the configured codec.
    #[must_use]
    pub fn query_params(&self) -> QueryParams {
        QueryParams::with_codec(self.codec())
    }

    /// Resolve a credential by security scheme name.
    ///
    /// `bearerAuth` falls back to the access token when no explicit
    /// credential was registered under that name.
    #[must_use]
    pub fn lookup_credential(&self, key: &str) -> Option<String> {
        match self.credentials.get(key) {
            Some(credential) => credential.resolve(),
            None if key == BEARER_AUTH => self.access_token.as_ref().and_then(Credential::resolve),
            None => None,
        }
    }

    /// Set `header_name` to `prefix + credential` when the credential resolves
    /// to a non-empty value.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is not valid HTTP.
    pub fn add_credential_to_headers(
        &self,
        credential_key: &str,
        header_name: &str,
        headers: &mut HeaderMap,
        prefix: Option<&str>,
    ) -> Result<()> {
        let Some(value) = self.resolved(credential_key) else {
            return Ok(());
        };

        let name = HeaderName::from_bytes(header_name.as_bytes())?;
        let mut value = HeaderValue::from_str(&format!("{}{value}", prefix.unwrap_or_default()))?;
        value.set_sensitive(true);
        headers.insert(name, value);
        Ok(())
    }

    /// Set query parameter `param_name` when the credential resolves to a
    /// non-empty value.
    pub fn add_credential_to_query(
        &self,
        credential_key: &str,
        param_name: &str,
        query: &mut QueryParams,
    ) {
        if let Some(value) = self.resolved(credential_key) {
            query.set(param_name, value);
        }
    }

    fn resolved(&self, credential_key: &str) -> Option<String> {
        let value = self
            .lookup_credential(credential_key)
            .filter(|value| !value.is_empty());
        if value.is_none() {
            debug!(credential = credential_key, "credential not available, skipping");
        }
        value
    }

    /// Choose the `Content-Type` for a request body.
    ///
    /// Prefers the first JSON MIME type, then the first entry.
    #[must_use]
    pub fn select_header_content_type<'a>(content_types: &[&'a str]) -> Option<&'a str> {
        select_preferring_json(content_types)
    }

    /// Choose the `Accept` header for a request.
    ///
    /// Prefers the first JSON MIME type, then the first entry.
    #[must_use]
    pub fn select_header_accept<'a>(accepts: &[&'a str]) -> Option<&'a str> {
        select_preferring_json(accepts)
    }

    /// Check if the given MIME type is a JSON MIME type.
    ///
    /// Matches `application/json`, `application/json; charset=UTF8`,
    /// `APPLICATION/JSON`, `application/vnd.company+json` and
    /// `application/json-patch+json`.
    #[must_use]
    pub fn is_json_mime(mime: &str) -> bool {
        json_mime_pattern().is_match(mime) || mime.eq_ignore_ascii_case("application/json-patch+json")
    }

    /// Default encoder for path parameters.
    ///
    /// Dates render as ISO-8601 for `date-time` (or no format) and as
    /// `YYYY-MM-DD` for `date`. The result is percent-encoded.
    #[must_use]
    pub fn encode_path_param(value: &ParamValue, data_format: Option<&str>) -> String {
        let text = match (value, data_format) {
            (ParamValue::Date(date), Some("date")) => date.format("%Y-%m-%d").to_string(),
            (ParamValue::Date(date), _) => format_date(date),
            (other, _) => other.to_param_string(),
        };
        encode_component(&text)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            with_credentials: false,
            username: None,
            password: None,
            access_token: None,
            api_keys: HashMap::new(),
            credentials: HashMap::new(),
            codec: None,
        }
    }
}

fn select_preferring_json<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .find(|mime| Configuration::is_json_mime(mime))
        .or_else(|| candidates.first().copied())
}

fn json_mime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(application/json|[^;/ \t]+/[^;/ \t]+[+]json)[ \t]*(;.*)?$")
            .expect("JSON MIME pattern is valid")
    })
}
