//! Request construction for the WH Open API.
//!
//! Wraps the `wh-core` serialization engine in a base service that assembles
//! URLs, headers and query strings, then hands plain-data requests to an
//! [`HttpTransport`] supplied by the caller.

#![deny(missing_docs)]

pub mod client;
pub mod transport;

pub use client::{ApiClient, ApiClientBuilder, RequestBuilder};
pub use transport::{ApiRequest, ApiResponse, HttpTransport};

/// Convenient result alias that reuses the shared error type.
pub type Result<T> = wh_core::Result<T>;
