//! Parameter serialization for query strings, headers and path segments.
//!
//! Values are described by [`ParamValue`] and rendered according to an
//! OpenAPI [`Style`] and `explode` flag. [`QueryParams`] keeps pairs in
//! insertion order, so an array always encodes its elements in source order.

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt::Display;
use url::Url;

/// A typed parameter value prior to wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// No value; emits nothing
    Null,
    /// Rendered as `true`/`false`
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    String(String),
    /// Timestamp, rendered as RFC 3339
    Time(DateTime<Utc>),
    /// Ordered list
    Array(Vec<ParamValue>),
    /// Ordered property list
    Object(Vec<(String, ParamValue)>),
}

impl ParamValue {
    /// Build an object value from key/value pairs.
    pub fn object<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Self>,
    {
        Self::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// True for the null value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Scalar wire form, or `None` for null, arrays and objects.
    #[must_use]
    pub fn scalar_string(&self) -> Option<String> {
        match self {
            Self::Bool(v) => Some(v.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::String(v) => Some(v.clone()),
            Self::Time(v) => Some(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Null | Self::Array(_) | Self::Object(_) => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::String(_) | Self::Time(_) => {
                "scalar"
            }
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
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
        Self::Time(value)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Serialization style of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// `k=v`, the query default
    #[default]
    Form,
    /// Comma-joined, the path and header default
    Simple,
    /// Space-joined arrays
    SpaceDelimited,
    /// Pipe-joined arrays
    PipeDelimited,
    /// `k[p]=v` objects
    DeepObject,
    /// One pair per array element
    Multi,
}

impl Style {
    fn array_delimiter(self) -> Option<&'static str> {
        match self {
            Self::Form | Self::Simple => Some(","),
            Self::SpaceDelimited => Some(" "),
            Self::PipeDelimited => Some("|"),
            Self::DeepObject | Self::Multi => None,
        }
    }
}

/// Destination for serialized parameter pairs.
pub trait ParamSink {
    /// Append one key/value pair.
    fn append(&mut self, key: String, value: String);
}

/// Builder for assembling query parameter pairs in insertion order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: impl Into<String>, value: Option<T>)
    where
        T: Display,
    {
        if let Some(value) = value {
            self.pairs.push((key.into(), value.to_string()));
        }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Display,
    {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Iterate over the collected pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Values recorded under `key`, in insertion order.
    #[must_use]
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Append every pair to the URL's query string.
    pub fn append_to(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            return;
        }
        let mut query = url.query_pairs_mut();
        for (key, value) in &self.pairs {
            query.append_pair(key, value);
        }
    }

    /// `application/x-www-form-urlencoded` encoding of the pairs.
    #[must_use]
    pub fn to_urlencoded(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl ParamSink for QueryParams {
    fn append(&mut self, key: String, value: String) {
        self.pairs.push((key, value));
    }
}

/// Header sink: repeated keys are joined with a comma.
impl ParamSink for BTreeMap<String, String> {
    fn append(&mut self, key: String, value: String) {
        self.entry(key)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
}

fn unsupported(value: &ParamValue, style: Style, explode: bool) -> Error {
    Error::InvalidArgument(format!(
        "cannot serialize {} parameter with style {style:?} (explode={explode})",
        value.kind_name()
    ))
}

fn join_scalars(items: &[ParamValue], delimiter: &str) -> Result<String> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        if item.is_null() {
            continue;
        }
        parts.push(item.scalar_string().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "nested {} inside array parameter is not supported",
                item.kind_name()
            ))
        })?);
    }
    Ok(parts.join(delimiter))
}

fn join_object(props: &[(String, ParamValue)]) -> Result<String> {
    let mut parts = Vec::with_capacity(props.len() * 2);
    for (name, value) in props {
        if value.is_null() {
            continue;
        }
        let rendered = value.scalar_string().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "nested {} in property `{name}` is not supported",
                value.kind_name()
            ))
        })?;
        parts.push(name.clone());
        parts.push(rendered);
    }
    Ok(parts.join(","))
}

/// Render a value as a single string, as used for path segments and
/// non-exploded parameters.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when the value shape is not supported
/// by the style.
pub fn parameter_to_string(value: &ParamValue, style: Style) -> Result<String> {
    match value {
        ParamValue::Null => Ok(String::new()),
        ParamValue::Array(items) => {
            let delimiter = style
                .array_delimiter()
                .ok_or_else(|| unsupported(value, style, false))?;
            join_scalars(items, delimiter)
        }
        ParamValue::Object(props) => match style {
            Style::Form | Style::Simple => join_object(props),
            _ => Err(unsupported(value, style, false)),
        },
        scalar => scalar
            .scalar_string()
            .ok_or_else(|| unsupported(scalar, style, false)),
    }
}

/// Serialize a parameter into a query or header sink.
///
/// Null values emit no pair. Arrays with `Form`/explode or `Multi` emit one
/// pair per element in source order.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for unsupported style/shape
/// combinations.
pub fn parameter_add_to_header_or_query<S: ParamSink + ?Sized>(
    sink: &mut S,
    key: &str,
    value: &ParamValue,
    style: Style,
    explode: bool,
) -> Result<()> {
    match value {
        ParamValue::Null => Ok(()),
        ParamValue::Array(items) => add_array(sink, key, items, value, style, explode),
        ParamValue::Object(props) => add_object(sink, key, props, value, style, explode),
        scalar => match style {
            Style::Form | Style::Simple | Style::Multi => {
                let rendered = parameter_to_string(scalar, style)?;
                sink.append(key.to_string(), rendered);
                Ok(())
            }
            _ => Err(unsupported(scalar, style, explode)),
        },
    }
}

fn add_array<S: ParamSink + ?Sized>(
    sink: &mut S,
    key: &str,
    items: &[ParamValue],
    value: &ParamValue,
    style: Style,
    explode: bool,
) -> Result<()> {
    match (style, explode) {
        (Style::DeepObject, _) => Err(unsupported(value, style, explode)),
        (Style::Multi, _) | (Style::Form | Style::SpaceDelimited | Style::PipeDelimited, true) => {
            for item in items {
                if item.is_null() {
                    continue;
                }
                let rendered = item
                    .scalar_string()
                    .ok_or_else(|| unsupported(item, style, explode))?;
                sink.append(key.to_string(), rendered);
            }
            Ok(())
        }
        _ => {
            let rendered = parameter_to_string(value, style)?;
            sink.append(key.to_string(), rendered);
            Ok(())
        }
    }
}

fn add_object<S: ParamSink + ?Sized>(
    sink: &mut S,
    key: &str,
    props: &[(String, ParamValue)],
    value: &ParamValue,
    style: Style,
    explode: bool,
) -> Result<()> {
    match (style, explode) {
        (Style::DeepObject, _) => add_deep_object(sink, key, props),
        (Style::Form, true) => {
            for (name, prop) in props {
                if prop.is_null() {
                    continue;
                }
                let rendered = prop
                    .scalar_string()
                    .ok_or_else(|| unsupported(prop, style, explode))?;
                sink.append(name.clone(), rendered);
            }
            Ok(())
        }
        (Style::Form | Style::Simple, _) => {
            let rendered = join_object(props)?;
            sink.append(key.to_string(), rendered);
            Ok(())
        }
        _ => Err(unsupported(value, style, explode)),
    }
}

fn add_deep_object<S: ParamSink + ?Sized>(
    sink: &mut S,
    prefix: &str,
    props: &[(String, ParamValue)],
) -> Result<()> {
    for (name, prop) in props {
        let key = format!("{prefix}[{name}]");
        match prop {
            ParamValue::Null => {}
            ParamValue::Object(nested) => add_deep_object(sink, &key, nested)?,
            ParamValue::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    let rendered = item
                        .scalar_string()
                        .ok_or_else(|| unsupported(item, Style::DeepObject, true))?;
                    sink.append(key.clone(), rendered);
                }
            }
            scalar => {
                if let Some(rendered) = scalar.scalar_string() {
                    sink.append(key, rendered);
                }
            }
        }
    }
    Ok(())
}

/// Percent-encode a single path segment.
///
/// Everything outside the RFC 3986 unreserved set is escaped, including `/`.
#[must_use]
pub fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// Substitute `{name}` in a path template with an encoded parameter value.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the placeholder is missing or the
/// value cannot be rendered with the simple style.
pub fn substitute_path_param(path: &str, name: &str, value: &ParamValue) -> Result<String> {
    let placeholder = format!("{{{name}}}");
    if !path.contains(&placeholder) {
        return Err(Error::InvalidArgument(format!(
            "path `{path}` has no parameter `{name}`"
        )));
    }
    let rendered = parameter_to_string(value, Style::Simple)?;
    Ok(path.replace(&placeholder, &encode_path_segment(&rendered)))
}
