//! Key and value codecs for URL query strings.
//!
//! [`PercentCodec`] applies URI-component percent-encoding (the same character
//! set JavaScript's `encodeURIComponent` leaves untouched). [`IdentityCodec`]
//! passes text through unchanged and is used once values are already encoded.

use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped by URI-component encoding.
///
/// Everything except ASCII alphanumerics and `- _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encodes and decodes query keys and values.
pub trait ParameterCodec: fmt::Debug + Send + Sync {
    /// Encode a parameter key.
    fn encode_key(&self, key: &str) -> String;

    /// Encode a parameter value.
    fn encode_value(&self, value: &str) -> String;

    /// Decode a parameter key.
    fn decode_key(&self, key: &str) -> String;

    /// Decode a parameter value.
    fn decode_value(&self, value: &str) -> String;
}

/// URI-component percent-encoding codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PercentCodec;

impl PercentCodec {
    fn encode(input: &str) -> String {
        utf8_percent_encode(input, URI_COMPONENT).to_string()
    }

    // Malformed sequences decode lossily instead of failing.
    fn decode(input: &str) -> String {
        percent_decode_str(input).decode_utf8_lossy().into_owned()
    }
}

impl ParameterCodec for PercentCodec {
    fn encode_key(&self, key: &str) -> String {
        Self::encode(key)
    }

    fn encode_value(&self, value: &str) -> String {
        Self::encode(value)
    }

    fn decode_key(&self, key: &str) -> String {
        Self::decode(key)
    }

    fn decode_value(&self, value: &str) -> String {
        Self::decode(value)
    }
}

/// Pass-through codec for text that is already encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityCodec;

impl ParameterCodec for IdentityCodec {
    fn encode_key(&self, key: &str) -> String {
        key.to_string()
    }

    fn encode_value(&self, value: &str) -> String {
        value.to_string()
    }

    fn decode_key(&self, key: &str) -> String {
        key.to_string()
    }

    fn decode_value(&self, value: &str) -> String {
        value.to_string()
    }
}

/// Percent-encode a single path or query component.
#[must_use]
pub fn encode_component(input: &str) -> String {
    PercentCodec::encode(input)
}
