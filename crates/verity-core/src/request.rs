//! Turning an operation and its parameters into a sendable request.

use crate::auth::{ApiKeyScheme, SESSION_COOKIE};
use crate::config::Configuration;
use crate::content::{
    is_json_mime, is_xml_mime, select_header_accept, select_header_content_type,
    APPLICATION_JSON, FORM_URLENCODED, MULTIPART_FORM_DATA,
};
use crate::context::CallContext;
use crate::error::{Error, Result};
use crate::params::QueryParams;
use crate::transport::{redacted_headers, redacted_url};
use bytes::Bytes;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, USER_AGENT,
};
use reqwest::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Static description of one API operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Operation id, used for per-operation server selection
    pub id: &'static str,
    /// HTTP method
    pub method: Method,
    /// Path relative to the server base, with path parameters substituted
    pub path: String,
    /// Media types the operation accepts
    pub consumes: &'static [&'static str],
    /// Media types the operation produces
    pub produces: &'static [&'static str],
    /// API-key schemes the operation accepts
    pub api_keys: &'static [ApiKeyScheme],
    /// Headers fixed by the operation
    pub headers: BTreeMap<String, String>,
}

impl Operation {
    /// Describe an operation that consumes and produces nothing in particular.
    #[must_use]
    pub fn new(id: &'static str, method: Method, path: impl Into<String>) -> Self {
        Self {
            id,
            method,
            path: path.into(),
            consumes: &[],
            produces: &[],
            api_keys: &[],
            headers: BTreeMap::new(),
        }
    }

    /// Set the accepted request media types.
    #[must_use]
    pub const fn with_consumes(mut self, consumes: &'static [&'static str]) -> Self {
        self.consumes = consumes;
        self
    }

    /// Set the produced response media types.
    #[must_use]
    pub const fn with_produces(mut self, produces: &'static [&'static str]) -> Self {
        self.produces = produces;
        self
    }

    /// Set the accepted API-key schemes.
    #[must_use]
    pub const fn with_api_keys(mut self, api_keys: &'static [ApiKeyScheme]) -> Self {
        self.api_keys = api_keys;
        self
    }

    /// Add a fixed header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A request body before content-type specific encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A structured value, encoded according to the negotiated type
    Value(serde_json::Value),
    /// Text forwarded verbatim
    Text(String),
    /// Bytes forwarded verbatim
    Bytes(Bytes),
}

impl RequestBody {
    /// Capture a serializable value as a structured body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the value cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Value)
            .map_err(|err| Error::InvalidArgument(format!("failed to encode body: {err}")))
    }

    fn encode(self, content_type: Option<&str>) -> Result<Bytes> {
        match (self, content_type) {
            (Self::Text(text), _) => Ok(Bytes::from(text)),
            (Self::Bytes(bytes), _) => Ok(bytes),
            (Self::Value(value), None) => Ok(Bytes::from(serde_json::to_vec(&value)?)),
            (Self::Value(value), Some(ct)) if is_json_mime(ct) => {
                Ok(Bytes::from(serde_json::to_vec(&value)?))
            }
            (Self::Value(_), Some(ct)) if is_xml_mime(ct) => Err(Error::InvalidArgument(format!(
                "structured bodies cannot be encoded as `{ct}`; pass raw XML text"
            ))),
            (Self::Value(_), Some(ct)) => Err(Error::InvalidArgument(format!(
                "invalid body type for content type `{ct}`"
            ))),
        }
    }
}

/// A file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    /// Form field name
    pub field_name: String,
    /// File name reported to the server
    pub file_name: String,
    /// File content
    pub content: Bytes,
    /// Media type of the part
    pub content_type: Option<String>,
}

impl FormFile {
    /// Create a file part.
    pub fn new(
        field_name: impl Into<String>,
        file_name: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: file_name.into(),
            content: content.into(),
            content_type: None,
        }
    }

    /// Set the part's media type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Per-call inputs of an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestParts {
    /// Request body
    pub body: Option<RequestBody>,
    /// Operation parameters sent as headers
    pub headers: BTreeMap<String, String>,
    /// Query parameters
    pub query: QueryParams,
    /// Form fields, for urlencoded and multipart bodies
    pub form: QueryParams,
    /// File parts; their presence selects a multipart body
    pub files: Vec<FormFile>,
}

impl RequestParts {
    /// Create empty parts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Set the form fields.
    #[must_use]
    pub fn with_form(mut self, form: QueryParams) -> Self {
        self.form = form;
        self
    }

    /// Add a header parameter.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a file part.
    #[must_use]
    pub fn with_file(mut self, file: FormFile) -> Self {
        self.files.push(file);
        self
    }
}

/// A fully assembled request. It owns its body, so it can be sent more than
/// once.
#[derive(Clone)]
pub struct PreparedRequest {
    operation_id: &'static str,
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    request_id: Uuid,
    sensitive: Vec<String>,
}

impl PreparedRequest {
    /// Assemble a request for `operation` under `config` and `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error when server resolution fails, a header is not valid
    /// HTTP, or the body cannot be encoded for the negotiated content type.
    pub fn build(
        config: &Configuration,
        ctx: &CallContext,
        operation: &Operation,
        parts: RequestParts,
    ) -> Result<Self> {
        let base = config.server_url_with_context(ctx, operation.id)?;
        let mut url = join_url(&base, &operation.path)?;
        parts.query.append_to(&mut url);

        let mut content_type = select_header_content_type(operation.consumes);
        let accept = select_header_accept(operation.produces);

        let body = if parts.files.is_empty() {
            match content_type.as_deref() {
                Some(ct) if ct.eq_ignore_ascii_case(FORM_URLENCODED) => {
                    Some(Bytes::from(parts.form.to_urlencoded()))
                }
                _ => match parts.body {
                    Some(body) => {
                        if content_type.is_none() && matches!(body, RequestBody::Value(_)) {
                            content_type = Some(APPLICATION_JSON.to_string());
                        }
                        Some(body.encode(content_type.as_deref())?)
                    }
                    None => None,
                },
            }
        } else {
            let boundary = format!("verity-{}", Uuid::new_v4().simple());
            content_type = Some(format!("{MULTIPART_FORM_DATA}; boundary={boundary}"));
            Some(encode_multipart(&boundary, &parts.form, &parts.files))
        };

        let mut headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            set_header(&mut headers, name, value)?;
        }
        if let Some(ct) = &content_type {
            set_header(&mut headers, CONTENT_TYPE.as_str(), ct)?;
        }
        if let Some(accept) = &accept {
            set_header(&mut headers, ACCEPT.as_str(), accept)?;
        }
        for (name, value) in operation.headers.iter().chain(&parts.headers).chain(ctx.headers()) {
            set_header(&mut headers, name, value)?;
        }
        if !headers.contains_key(USER_AGENT) {
            set_header(&mut headers, USER_AGENT.as_str(), &config.user_agent)?;
        }

        let auth = match ctx.auth() {
            Some(overlay) => config.auth.overlay(overlay),
            None => config.auth.clone(),
        };
        let applied = auth.apply(operation.api_keys);
        if let Some(authorization) = &applied.authorization {
            set_header(&mut headers, AUTHORIZATION.as_str(), authorization)?;
        }
        for (name, value) in &applied.headers {
            set_header(&mut headers, name, value)?;
        }
        if !applied.query.is_empty() {
            url.query_pairs_mut().extend_pairs(applied.query.iter());
        }

        let mut cookies = applied.cookies;
        if let Some(token) = config.token_source.as_ref().and_then(|source| source.token()) {
            cookies.push((SESSION_COOKIE.to_string(), token));
        }
        if !cookies.is_empty() {
            let mut jar: Vec<String> = headers
                .get(COOKIE)
                .and_then(|v| v.to_str().ok())
                .map(|v| vec![v.to_string()])
                .unwrap_or_default();
            jar.extend(cookies.iter().map(|(name, value)| format!("{name}={value}")));
            set_header(&mut headers, COOKIE.as_str(), &jar.join("; "))?;
        }

        let sensitive = operation
            .api_keys
            .iter()
            .map(|scheme| scheme.param_name.to_ascii_lowercase())
            .collect();

        Ok(Self {
            operation_id: operation.id,
            method: operation.method.clone(),
            url,
            headers,
            body,
            request_id: Uuid::new_v4(),
            sensitive,
        })
    }

    /// Operation id.
    #[must_use]
    pub const fn operation_id(&self) -> &'static str {
        self.operation_id
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL including the query string.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Encoded body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Identifier used to correlate log lines of one call.
    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Lowercased header and query names that carry API keys.
    #[must_use]
    pub fn sensitive_names(&self) -> &[String] {
        &self.sensitive
    }
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("operation_id", &self.operation_id)
            .field("method", &self.method)
            .field("url", &redacted_url(&self.url, &self.sensitive))
            .field("headers", &redacted_headers(&self.headers, &self.sensitive))
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .field("request_id", &self.request_id)
            .finish()
    }
}

fn join_url(base: &str, path: &str) -> Result<Url> {
    let joined = match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{base}{}", &path[1..]),
        (false, false) if !path.is_empty() => format!("{base}/{path}"),
        _ => format!("{base}{path}"),
    };
    Ok(Url::parse(&joined)?)
}

fn set_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| Error::InvalidArgument(format!("invalid header name `{name}`: {err}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|err| Error::InvalidArgument(format!("invalid value for header `{name}`: {err}")))?;
    headers.insert(name, value);
    Ok(())
}

fn encode_multipart(boundary: &str, fields: &QueryParams, files: &[FormFile]) -> Bytes {
    let mut out = Vec::new();
    for (name, value) in fields.iter() {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", quote(name)).as_bytes(),
        );
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    for file in files {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                quote(&file.field_name),
                quote(&file.file_name)
            )
            .as_bytes(),
        );
        let part_type = file
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        out.extend_from_slice(format!("Content-Type: {part_type}\r\n\r\n").as_bytes());
        out.extend_from_slice(&file.content);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Bytes::from(out)
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
