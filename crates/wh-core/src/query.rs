//! OpenAPI-aware query parameter collection.
//!
//! [`QueryParams`] stores each parameter with its own resolved `explode` and
//! delimiter options. Encoding is deferred until the collection is rendered
//! with [`QueryParams::to_record`], `to_string`, or
//! [`QueryParams::to_http_params`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::codec::{IdentityCodec, ParameterCodec, PercentCodec};

/// Separator used between values of a non-exploded parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// `,` (form and csv)
    #[default]
    Comma,
    /// ` ` (spaceDelimited)
    Space,
    /// `|` (pipeDelimited)
    Pipe,
    /// tab (tsv)
    Tab,
}

impl Delimiter {
    /// The delimiter as it appears in the query string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comma => ",",
            Self::Space => " ",
            Self::Pipe => "|",
            Self::Tab => "\t",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call overrides for a parameter's serialization options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamOptions {
    /// Override for `explode`
    pub explode: Option<bool>,
    /// Override for the delimiter
    pub delimiter: Option<Delimiter>,
}

impl ParamOptions {
    /// Create empty overrides.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            explode: None,
            delimiter: None,
        }
    }

    /// Set the `explode` override.
    #[must_use]
    pub const fn with_explode(mut self, explode: bool) -> Self {
        self.explode = Some(explode);
        self
    }

    /// Set the delimiter override.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = Some(delimiter);
        self
    }
}

/// Fully resolved serialization options.
///
/// Used both as the collection defaults and as the options stored on each
/// entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOptions {
    /// One occurrence per value when true; a single joined occurrence otherwise
    pub explode: bool,
    /// Separator used when `explode` is false
    pub delimiter: Delimiter,
}

impl ResolvedOptions {
    /// OpenAPI defaults for form-style query parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            explode: true,
            delimiter: Delimiter::Comma,
        }
    }

    /// Layer overrides on top of these options.
    #[must_use]
    pub fn merge(self, local: ParamOptions) -> Self {
        Self {
            explode: local.explode.unwrap_or(self.explode),
            delimiter: local.delimiter.unwrap_or(self.delimiter),
        }
    }
}

impl Default for ResolvedOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Unencoded values accepted by [`QueryParams::set`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryValues(Vec<String>);

impl QueryValues {
    /// Consume into the underlying values.
    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for QueryValues {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for QueryValues {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for QueryValues {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<Vec<&str>> for QueryValues {
    fn from(values: Vec<&str>) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[String]> for QueryValues {
    fn from(values: &[String]) -> Self {
        Self(values.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for QueryValues {
    fn from(values: [&str; N]) -> Self {
        Self(values.iter().map(|v| (*v).to_string()).collect())
    }
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamEntry {
    values: Vec<String>,
    options: ResolvedOptions,
}

impl ParamEntry {
    /// Unencoded values in insertion order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Options resolved when the entry was created or last updated.
    #[must_use]
    pub const fn options(&self) -> ResolvedOptions {
        self.options
    }
}

/// Encoded value for one key of a [`QueryRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValue {
    /// Values joined by the raw delimiter (`explode = false`)
    Joined(String),
    /// Individually encoded values (`explode = true`)
    Exploded(Vec<String>),
}

/// Encoded keys and values in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryRecord {
    entries: Vec<(String, RecordValue)>,
}

impl QueryRecord {
    /// Look up the value for an encoded key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RecordValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Iterate over encoded keys and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the record has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into `(key, value)` pairs, repeating the key for exploded values.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(key, value)| {
            let values: Vec<&str> = match value {
                RecordValue::Joined(joined) => vec![joined.as_str()],
                RecordValue::Exploded(values) => values.iter().map(String::as_str).collect(),
            };
            values.into_iter().map(move |v| (key.as_str(), v))
        })
    }
}

/// Already-encoded multi-value parameters, ready for a transport.
///
/// Values are never re-encoded when the bag is rendered or applied to a URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpParams {
    pairs: Vec<(String, String)>,
}

impl HttpParams {
    /// Build from an encoded record.
    #[must_use]
    pub fn from_record(record: &QueryRecord) -> Self {
        let codec = IdentityCodec;
        let pairs = record
            .pairs()
            .map(|(k, v)| (codec.encode_key(k), codec.encode_value(v)))
            .collect();
        Self { pairs }
    }

    /// Encoded `(key, value)` pairs in order.
    #[must_use]
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Return the collected pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// All values recorded for an encoded key.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if no parameters are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Append the parameters to a URL's query, keeping any existing query.
    ///
    /// Tabs and line breaks are escaped here because the URL parser strips
    /// them. A raw space is escaped by the parser itself.
    pub fn apply_to(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            return;
        }
        let query = escape_url_whitespace(&self.to_string());
        let merged = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
            _ => query,
        };
        url.set_query(Some(&merged));
    }
}

fn escape_url_whitespace(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        match c {
            '\t' => escaped.push_str("%09"),
            '\n' => escaped.push_str("%0A"),
            '\r' => escaped.push_str("%0D"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl fmt::Display for HttpParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Builder for OpenAPI query parameters with per-parameter options.
#[derive(Debug, Clone)]
pub struct QueryParams {
    params: Vec<(String, ParamEntry)>,
    codec: Arc<dyn ParameterCodec>,
    defaults: ResolvedOptions,
}

impl QueryParams {
    /// Create an empty collection with the percent-encoding codec and
    /// OpenAPI defaults (`explode = true`, `,`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_codec(Arc::new(PercentCodec))
    }

    /// Create an empty collection with a specific codec.
    #[must_use]
    pub fn with_codec(codec: Arc<dyn ParameterCodec>) -> Self {
        Self::with_codec_and_defaults(codec, ResolvedOptions::new())
    }

    /// Create an empty collection with a codec and collection defaults.
    #[must_use]
    pub fn with_codec_and_defaults(
        codec: Arc<dyn ParameterCodec>,
        defaults: ResolvedOptions,
    ) -> Self {
        Self {
            params: Vec::new(),
            codec,
            defaults,
        }
    }

    /// Collection defaults applied to new and updated entries.
    #[must_use]
    pub const fn defaults(&self) -> ResolvedOptions {
        self.defaults
    }

    /// Change the collection defaults.
    ///
    /// Entries that already exist keep the options they were resolved with.
    pub fn set_defaults(&mut self, defaults: ResolvedOptions) -> &mut Self {
        self.defaults = defaults;
        self
    }

    /// Replace a parameter's values using the collection defaults.
    pub fn set(&mut self, key: impl Into<String>, values: impl Into<QueryValues>) -> &mut Self {
        self.set_with(key, values, ParamOptions::new())
    }

    /// Replace a parameter's values and options.
    pub fn set_with(
        &mut self,
        key: impl Into<String>,
        values: impl Into<QueryValues>,
        options: ParamOptions,
    ) -> &mut Self {
        let entry = ParamEntry {
            values: values.into().into_inner(),
            options: self.defaults.merge(options),
        };
        let key = key.into();
        if let Some(existing) = self.entry_mut(&key) {
            *existing = entry;
        } else {
            self.params.push((key, entry));
        }
        self
    }

    /// Append a value, creating the parameter if needed.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value: String = value.into();
        if let Some(entry) = self.entry_mut(&key) {
            entry.values.push(value);
            return self;
        }
        self.set(key, value)
    }

    /// Append a value and layer `options` over the parameter's current options.
    pub fn append_with(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        options: ParamOptions,
    ) -> &mut Self {
        let key = key.into();
        let value: String = value.into();
        if let Some(entry) = self.entry_mut(&key) {
            entry.options = entry.options.merge(options);
            entry.values.push(value);
            return self;
        }
        self.set_with(key, value, options)
    }

    /// Look up a parameter by its unencoded key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamEntry> {
        self.params
            .iter()
            .find_map(|(k, entry)| (k == key).then_some(entry))
    }

    /// Returns true if the parameter exists.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Unencoded keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(k, _)| k.as_str())
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Encode every parameter according to its own options.
    ///
    /// Exploded parameters keep one encoded value per occurrence. Otherwise
    /// the encoded values are joined with the raw delimiter, which is never
    /// itself percent-encoded.
    #[must_use]
    pub fn to_record(&self) -> QueryRecord {
        let entries = self
            .params
            .iter()
            .map(|(key, entry)| {
                let encoded_key = self.codec.encode_key(key);
                let encoded: Vec<String> = entry
                    .values
                    .iter()
                    .map(|v| self.codec.encode_value(v))
                    .collect();
                let value = if entry.options.explode {
                    RecordValue::Exploded(encoded)
                } else {
                    RecordValue::Joined(encoded.join(entry.options.delimiter.as_str()))
                };
                (encoded_key, value)
            })
            .collect();
        QueryRecord { entries }
    }

    /// Convert into a transport parameter bag without double encoding.
    #[must_use]
    pub fn to_http_params(&self) -> HttpParams {
        HttpParams::from_record(&self.to_record())
    }

    fn entry_mut(&mut self, key: &str) -> Option<&mut ParamEntry> {
        self.params
            .iter_mut()
            .find_map(|(k, entry)| (k == key).then_some(entry))
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders `key=value` segments joined by `&`.
///
/// Exploded parameters repeat their key once per value (`tags=a&tags=b`).
impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.to_record();
        for (i, (key, value)) in record.pairs().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
