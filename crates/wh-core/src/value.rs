//! Tagged parameter values.
//!
//! Request builders hand the style encoder a [`ParamValue`] rather than an
//! untyped value. The encoder classifies it once with [`ParamValue::shape`]
//! and matches the result exhaustively.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Number;

use crate::error::Result;

/// A value destined for the query string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Absent value; never serialized
    Null,
    /// Boolean primitive
    Bool(bool),
    /// Numeric primitive
    Number(Number),
    /// String primitive
    String(String),
    /// Point in time, rendered as ISO-8601 UTC
    Date(DateTime<Utc>),
    /// Ordered list of values
    Array(Vec<ParamValue>),
    /// Object fields in caller order
    Object(Vec<(String, ParamValue)>),
}

/// The classification the style encoder dispatches on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueShape<'a> {
    /// String, number or boolean
    Primitive,
    /// Date value
    Date(&'a DateTime<Utc>),
    /// Array of values
    Array(&'a [ParamValue]),
    /// Object with named fields
    Object(&'a [(String, ParamValue)]),
}

impl ParamValue {
    /// Build an object value from `(field, value)` pairs, keeping their order.
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ParamValue)>,
    {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build an array value from anything convertible into parameter values.
    pub fn array<T, I>(items: I) -> Self
    where
        T: Into<ParamValue>,
        I: IntoIterator<Item = T>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Convert any serializable DTO into a parameter value.
    ///
    /// Struct fields keep their declaration order. Timestamps inside the DTO
    /// arrive as strings, not [`ParamValue::Date`], because they pass through
    /// their own `Serialize` impl first.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized to JSON.
    pub fn from_serialize<T>(value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        Ok(serde_json::to_value(value)?.into())
    }

    /// Returns true for [`ParamValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Classify the value, or `None` when it is null.
    #[must_use]
    pub fn shape(&self) -> Option<ValueShape<'_>> {
        match self {
            Self::Null => None,
            Self::Bool(_) | Self::Number(_) | Self::String(_) => Some(ValueShape::Primitive),
            Self::Date(date) => Some(ValueShape::Date(date)),
            Self::Array(items) => Some(ValueShape::Array(items)),
            Self::Object(fields) => Some(ValueShape::Object(fields)),
        }
    }

    /// Render a single value as query text.
    ///
    /// Dates use ISO-8601 with millisecond precision and a `Z` suffix. Arrays
    /// join their elements with commas and objects render as JSON.
    #[must_use]
    pub fn to_param_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => number_to_string(n),
            Self::String(s) => s.clone(),
            Self::Date(date) => format_date(date),
            Self::Array(items) => items
                .iter()
                .map(Self::to_param_string)
                .collect::<Vec<_>>()
                .join(","),
            Self::Object(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    /// Render the whole value as JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Format a date the way `Date.prototype.toISOString` does.
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// Whole floats below 1e21 print without a fractional part, so `2.0` and `2`
// agree. Negative zero prints as `0`.
fn number_to_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e21 => {
            format!("{f:.0}")
        }
        _ => n.to_string(),
    }
}

impl Serialize for ParamValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(date) => serializer.serialize_str(&format_date(date)),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or_else(|| Self::String(value.to_string()), Self::Number)
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        Self::from(f64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl<T> From<Option<T>> for ParamValue
where
    T: Into<ParamValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T> From<Vec<T>> for ParamValue
where
    T: Into<ParamValue>,
{
    fn from(value: Vec<T>) -> Self {
        Self::array(value)
    }
}
