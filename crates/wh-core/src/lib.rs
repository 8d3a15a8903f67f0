//! # wh-core
//!
//! Query-parameter serialization and configuration for the WH Open API client.
//!
//! ## Modules
//!
//! - [`codec`] - Percent-encoding and identity codecs for query keys and values
//! - [`value`] - Tagged parameter values (primitives, dates, arrays, objects)
//! - [`query`] - Query parameter collection with per-parameter explode/delimiter options
//! - [`style`] - OpenAPI style dispatch (`form`, `spaceDelimited`, `pipeDelimited`, `deepObject`, JSON)
//! - [`config`] - Base path, credentials, and header selection helpers
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use wh_core::query::QueryParams;
//! use wh_core::style::QueryParamStyle;
//! use wh_core::value::ParamValue;
//!
//! let mut params = QueryParams::new();
//! params.add_styled("tags", ParamValue::array(["a", "b"]), QueryParamStyle::PipeDelimited, false)?;
//! assert_eq!(params.to_string(), "tags=a|b");
//! # Ok::<(), wh_core::Error>(())
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod error;
pub mod query;
pub mod style;
pub mod value;

// Re-export commonly used types
pub use codec::{IdentityCodec, ParameterCodec, PercentCodec};
pub use config::{Configuration, Credential};
pub use error::{Error, Result};
pub use query::{Delimiter, HttpParams, ParamOptions, QueryParams, QueryRecord, RecordValue, ResolvedOptions};
pub use style::{add_to_params, QueryParamStyle};
pub use value::ParamValue;
