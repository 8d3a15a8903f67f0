//! OpenAPI style dispatch for query parameters.
//!
//! [`add_to_params`] decides how a [`ParamValue`] of any shape lands in a
//! [`QueryParams`] collection for a declared [`QueryParamStyle`]:
//!
//! | style | value | result |
//! |-------|-------|--------|
//! | any | null | nothing |
//! | `DeepObject` | object | `key[field]=value` per field |
//! | `Json` | any | one value holding the JSON text |
//! | simple | primitive or date | one appended value |
//! | simple | array | values joined or exploded with the style delimiter |
//! | `Form`, explode | object | each field becomes its own key |
//! | other simple | object | `key=f1,v1,f2,v2` with the style delimiter |
//!
//! Null fields inside objects are skipped.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};
use crate::query::{Delimiter, ParamOptions, QueryParams};
use crate::value::{format_date, ParamValue, ValueShape};

/// OpenAPI query parameter serialization style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryParamStyle {
    /// Whole value serialized as JSON
    Json,
    /// `form` (comma separated)
    Form,
    /// `deepObject` (`key[field]=value`)
    DeepObject,
    /// `spaceDelimited`
    SpaceDelimited,
    /// `pipeDelimited`
    PipeDelimited,
}

impl QueryParamStyle {
    /// The OpenAPI name of the style.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Form => "form",
            Self::DeepObject => "deepObject",
            Self::SpaceDelimited => "spaceDelimited",
            Self::PipeDelimited => "pipeDelimited",
        }
    }

    /// Delimiter used when the style joins multiple values.
    #[must_use]
    pub const fn delimiter(self) -> Delimiter {
        match self {
            Self::SpaceDelimited => Delimiter::Space,
            Self::PipeDelimited => Delimiter::Pipe,
            Self::Json | Self::Form | Self::DeepObject => Delimiter::Comma,
        }
    }
}

/// Add `value` under `key` according to `style` and `explode`.
///
/// # Errors
///
/// Returns [`Error::DeepObjectRequired`] when `style` is
/// [`QueryParamStyle::DeepObject`] and the value is not an object or array.
/// Returns [`Error::Serialization`] if a [`QueryParamStyle::Json`] value
/// cannot be rendered.
pub fn add_to_params<'a>(
    params: &'a mut QueryParams,
    key: &str,
    value: &ParamValue,
    style: QueryParamStyle,
    explode: bool,
) -> Result<&'a mut QueryParams> {
    let Some(shape) = value.shape() else {
        return Ok(params);
    };
    trace!(key, style = style.name(), explode, ?shape, "adding query parameter");

    match style {
        QueryParamStyle::DeepObject => add_deep_object(params, key, shape),
        QueryParamStyle::Json => Ok(params.append(key, value.to_json()?)),
        QueryParamStyle::Form | QueryParamStyle::SpaceDelimited | QueryParamStyle::PipeDelimited => {
            add_simple(params, key, value, shape, style, explode)
        }
    }
}

fn add_deep_object<'a>(
    params: &'a mut QueryParams,
    key: &str,
    shape: ValueShape<'_>,
) -> Result<&'a mut QueryParams> {
    match shape {
        ValueShape::Object(fields) => {
            for (field, value) in fields.iter().filter(|(_, v)| !v.is_null()) {
                params.append(format!("{key}[{field}]"), value.to_param_string());
            }
            Ok(params)
        }
        ValueShape::Array(items) => {
            for (index, value) in items.iter().enumerate().filter(|(_, v)| !v.is_null()) {
                params.append(format!("{key}[{index}]"), value.to_param_string());
            }
            Ok(params)
        }
        ValueShape::Primitive | ValueShape::Date(_) => Err(Error::DeepObjectRequired {
            key: key.to_string(),
        }),
    }
}

fn add_simple<'a>(
    params: &'a mut QueryParams,
    key: &str,
    value: &ParamValue,
    shape: ValueShape<'_>,
    style: QueryParamStyle,
    explode: bool,
) -> Result<&'a mut QueryParams> {
    match shape {
        ValueShape::Primitive => Ok(params.append(key, value.to_param_string())),
        ValueShape::Date(date) => Ok(params.append(key, format_date(date))),
        ValueShape::Array(items) => {
            let values: Vec<String> = items.iter().map(ParamValue::to_param_string).collect();
            let options = ParamOptions::new()
                .with_explode(explode)
                .with_delimiter(style.delimiter());
            Ok(params.set_with(key, values, options))
        }
        ValueShape::Object(fields) if style == QueryParamStyle::Form && explode => {
            for (field, value) in fields {
                add_to_params(params, field, value, style, explode)?;
            }
            Ok(params)
        }
        ValueShape::Object(fields) => Ok(concat_object(params, key, fields, style.delimiter())),
    }
}

/// Flatten an object into alternating field names and values under one key.
fn concat_object<'a>(
    params: &'a mut QueryParams,
    key: &str,
    fields: &[(String, ParamValue)],
    delimiter: Delimiter,
) -> &'a mut QueryParams {
    let mut tokens = Vec::with_capacity(fields.len() * 2);
    for (field, value) in fields {
        match value {
            ParamValue::Null => continue,
            ParamValue::Array(items) => {
                tokens.push(field.clone());
                tokens.extend(items.iter().map(ParamValue::to_param_string));
            }
            other => {
                tokens.push(field.clone());
                tokens.push(other.to_param_string());
            }
        }
    }
    let options = ParamOptions::new()
        .with_explode(false)
        .with_delimiter(delimiter);
    params.set_with(key, tokens, options)
}

impl QueryParams {
    /// Add a typed value using OpenAPI style rules.
    ///
    /// # Errors
    ///
    /// See [`add_to_params`].
    pub fn add_styled(
        &mut self,
        key: &str,
        value: impl Into<ParamValue>,
        style: QueryParamStyle,
        explode: bool,
    ) -> Result<&mut Self> {
        add_to_params(self, key, &value.into(), style, explode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::RecordValue;
    use chrono::{TimeZone, Utc};

    fn joined(value: &str) -> Option<RecordValue> {
        Some(RecordValue::Joined(value.to_string()))
    }

    fn exploded(values: &[&str]) -> Option<RecordValue> {
        Some(RecordValue::Exploded(
            values.iter().map(|v| (*v).to_string()).collect(),
        ))
    }

    #[test]
    fn null_is_a_no_op() {
        let mut params = QueryParams::new();
        params
            .add_styled("missing", ParamValue::Null, QueryParamStyle::DeepObject, true)
            .unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn deep_object_rejects_primitives() {
        let mut params = QueryParams::new();
        let err = params
            .add_styled("k", "not-an-object", QueryParamStyle::DeepObject, false)
            .unwrap_err();
        assert_eq!(
            err,
            Error::DeepObjectRequired {
                key: "k".to_string()
            }
        );
        assert!(err.to_string().contains("key k"));
    }

    #[test]
    fn deep_object_rejects_dates() {
        let mut params = QueryParams::new();
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert!(params
            .add_styled("since", date, QueryParamStyle::DeepObject, true)
            .is_err());
    }

    #[test]
    fn deep_object_uses_bracket_keys() {
        let mut params = QueryParams::new();
        let value = ParamValue::object([("a", ParamValue::from(1)), ("b", ParamValue::from(2))]);
        params
            .add_styled("k", value, QueryParamStyle::DeepObject, true)
            .unwrap();

        let keys: Vec<_> = params.keys().collect();
        assert_eq!(keys, vec!["k[a]", "k[b]"]);
        assert_eq!(params.to_string(), "k%5Ba%5D=1&k%5Bb%5D=2");
    }

    #[test]
    fn deep_object_is_one_level_deep() {
        let mut params = QueryParams::new();
        let value = ParamValue::object([
            ("tags", ParamValue::array(["x", "y"])),
            ("skip", ParamValue::Null),
        ]);
        params
            .add_styled("f", value, QueryParamStyle::DeepObject, false)
            .unwrap();

        assert_eq!(params.len(), 1);
        assert_eq!(params.get("f[tags]").unwrap().values(), ["x,y"]);
    }

    #[test]
    fn json_style_appends_serialized_value() {
        let mut params = QueryParams::new();
        let value = ParamValue::object([("a", ParamValue::from(1)), ("b", ParamValue::from("x"))]);
        params
            .add_styled("filter", value, QueryParamStyle::Json, true)
            .unwrap();
        assert_eq!(params.get("filter").unwrap().values(), [r#"{"a":1,"b":"x"}"#]);
    }

    #[test]
    fn json_style_accepts_primitives() {
        let mut params = QueryParams::new();
        params
            .add_styled("q", "text", QueryParamStyle::Json, true)
            .unwrap();
        assert_eq!(params.get("q").unwrap().values(), [r#""text""#]);
    }

    #[test]
    fn primitives_append_their_string_form() {
        let mut params = QueryParams::new();
        params
            .add_styled("page", 0, QueryParamStyle::Form, true)
            .unwrap()
            .add_styled("active", true, QueryParamStyle::Form, true)
            .unwrap()
            .add_styled("page", 1, QueryParamStyle::Form, true)
            .unwrap();
        assert_eq!(params.to_string(), "page=0&page=1&active=true");
    }

    #[test]
    fn dates_use_iso_8601_for_simple_styles() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        for style in [
            QueryParamStyle::Form,
            QueryParamStyle::SpaceDelimited,
            QueryParamStyle::PipeDelimited,
        ] {
            let mut params = QueryParams::new();
            params.add_styled("since", date, style, true).unwrap();
            assert_eq!(
                params.get("since").unwrap().values(),
                ["2024-01-15T00:00:00.000Z"]
            );
        }
    }

    #[test]
    fn arrays_use_style_delimiter() {
        let cases = [
            (QueryParamStyle::Form, "a,b,c"),
            (QueryParamStyle::SpaceDelimited, "a b c"),
            (QueryParamStyle::PipeDelimited, "a|b|c"),
        ];
        for (style, expected) in cases {
            let mut params = QueryParams::new();
            params
                .add_styled("tags", ParamValue::array(["a", "b", "c"]), style, false)
                .unwrap();
            assert_eq!(params.to_record().get("tags").cloned(), joined(expected));
        }
    }

    #[test]
    fn exploded_arrays_repeat_the_key() {
        let mut params = QueryParams::new();
        params
            .add_styled("tags", ParamValue::array(["a", "b"]), QueryParamStyle::Form, true)
            .unwrap();
        assert_eq!(params.to_record().get("tags").cloned(), exploded(&["a", "b"]));
        assert_eq!(params.to_string(), "tags=a&tags=b");
    }

    #[test]
    fn array_replaces_previous_values() {
        let mut params = QueryParams::new();
        params.append("tags", "old");
        params
            .add_styled("tags", ParamValue::array([1, 2]), QueryParamStyle::Form, false)
            .unwrap();
        assert_eq!(params.to_string(), "tags=1,2");
    }

    #[test]
    fn array_elements_stringify_dates() {
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let mut params = QueryParams::new();
        params
            .add_styled(
                "at",
                ParamValue::array([ParamValue::from(date), ParamValue::from(3)]),
                QueryParamStyle::PipeDelimited,
                false,
            )
            .unwrap();
        assert_eq!(
            params.to_record().get("at").cloned(),
            joined("2024-01-15T00%3A00%3A00.000Z|3")
        );
    }

    #[test]
    fn form_explode_flattens_object_fields_to_top_level() {
        let mut params = QueryParams::new();
        let value = ParamValue::object([("x", ParamValue::from(1)), ("y", ParamValue::from(2))]);
        params
            .add_styled("p", value, QueryParamStyle::Form, true)
            .unwrap();

        assert!(!params.has("p"));
        assert_eq!(params.to_string(), "x=1&y=2");
    }

    #[test]
    fn form_explode_recurses_into_field_values() {
        let mut params = QueryParams::new();
        let pageable = ParamValue::object([
            ("page", ParamValue::from(0)),
            ("size", ParamValue::from(20)),
            ("sort", ParamValue::array(["name", "asc"])),
        ]);
        params
            .add_styled("pageable", pageable, QueryParamStyle::Form, true)
            .unwrap();
        assert_eq!(params.to_string(), "page=0&size=20&sort=name&sort=asc");
    }

    #[test]
    fn form_without_explode_interleaves_fields() {
        let mut params = QueryParams::new();
        let value = ParamValue::object([
            ("role", ParamValue::from("admin")),
            ("ids", ParamValue::array([1, 2])),
        ]);
        params
            .add_styled("filter", value, QueryParamStyle::Form, false)
            .unwrap();
        assert_eq!(params.to_record().get("filter").cloned(), joined("role,admin,ids,1,2"));
    }

    #[test]
    fn delimited_styles_interleave_fields_regardless_of_explode() {
        for (style, expected) in [
            (QueryParamStyle::SpaceDelimited, "R 100 G 200"),
            (QueryParamStyle::PipeDelimited, "R|100|G|200"),
        ] {
            for explode in [true, false] {
                let mut params = QueryParams::new();
                let value = ParamValue::object([
                    ("R", ParamValue::from(100)),
                    ("G", ParamValue::from(200)),
                ]);
                params.add_styled("color", value, style, explode).unwrap();
                assert_eq!(params.to_record().get("color").cloned(), joined(expected));
            }
        }
    }

    #[test]
    fn style_names_and_delimiters() {
        assert_eq!(QueryParamStyle::DeepObject.name(), "deepObject");
        assert_eq!(QueryParamStyle::Form.delimiter(), Delimiter::Comma);
        assert_eq!(QueryParamStyle::SpaceDelimited.delimiter(), Delimiter::Space);
        assert_eq!(QueryParamStyle::PipeDelimited.delimiter(), Delimiter::Pipe);
    }
}
