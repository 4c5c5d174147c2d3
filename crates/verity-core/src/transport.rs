//! Sending prepared requests: cancellation, the single rate-limit retry and
//! redacted debug dumps.

use crate::client::ApiClient;
use crate::codec;
use crate::context::CallContext;
use crate::error::{Error, Result};
use crate::request::PreparedRequest;
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt::Write as _;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
use url::Url;

/// Replacement text for redacted values.
pub const REDACTED: &str = "REDACTED";

const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
];

const SENSITIVE_BODY_KEYS: &[&str] = &["password", "token"];

const CREDENTIAL_SCHEMES: &[&str] = &["bearer ", "basic "];

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: Url,
}

impl ApiResponse {
    /// Create a response from its parts.
    #[must_use]
    pub const fn new(status: StatusCode, headers: HeaderMap, body: Bytes, url: Url) -> Self {
        Self {
            status,
            headers,
            body,
            url,
        }
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Buffered body; can be read any number of times.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Final request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Decode the body according to its content type.
    ///
    /// # Errors
    ///
    /// Returns a decoding-kind error when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        codec::decode(&self.body, self.content_type())
    }

    /// Body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decoding`] if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String> {
        codec::decode_text(&self.body)
    }
}

/// Parse a `Retry-After` value, either delta-seconds or an HTTP-date.
///
/// Dates in the past yield a zero delay. Returns `None` for unparsable
/// values.
#[must_use]
pub fn parse_retry_after(value: &str, now: SystemTime) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = httpdate::parse_http_date(value).ok()?;
    Some(at.duration_since(now).unwrap_or(Duration::ZERO))
}

fn is_sensitive_header(name: &str, value: &str, sensitive: &[String]) -> bool {
    let name = name.to_ascii_lowercase();
    SENSITIVE_HEADERS.contains(&name.as_str())
        || name.contains("api-key")
        || name.contains("apikey")
        || sensitive.iter().any(|s| *s == name)
        || carries_credential_scheme(value)
}

/// Auth scheme names are case-insensitive.
fn carries_credential_scheme(value: &str) -> bool {
    let value = value.trim_start().as_bytes();
    CREDENTIAL_SCHEMES.iter().any(|scheme| {
        value
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme.as_bytes()))
    })
}

/// Header pairs with credential values replaced by [`REDACTED`].
///
/// `sensitive` holds extra lowercased header names to hide, such as the
/// API-key headers an operation declares.
#[must_use]
pub fn redacted_headers(headers: &HeaderMap, sensitive: &[String]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            let shown = if is_sensitive_header(name.as_str(), &value, sensitive) {
                REDACTED.to_string()
            } else {
                value
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}

/// The URL with API-key query parameters replaced by [`REDACTED`].
#[must_use]
pub fn redacted_url(url: &Url, sensitive: &[String]) -> String {
    let hides = |key: &str| {
        let key = key.to_ascii_lowercase();
        sensitive.iter().any(|s| *s == key) || key.contains("api_key") || key.contains("apikey")
    };
    if !url.query_pairs().any(|(key, _)| hides(&key)) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if hides(&key) {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut shown = url.clone();
    shown.query_pairs_mut().clear().extend_pairs(pairs);
    shown.to_string()
}

fn redact_value(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if SENSITIVE_BODY_KEYS.contains(&key.to_ascii_lowercase().as_str()) {
                    *inner = serde_json::Value::String(REDACTED.to_string());
                } else {
                    redact_value(inner);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

/// Body text for logs: JSON bodies have `password` and `token` members
/// replaced, other bodies are shown lossily.
#[must_use]
pub fn redacted_body(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

fn write_headers(out: &mut String, headers: &HeaderMap, sensitive: &[String]) {
    for (name, value) in redacted_headers(headers, sensitive) {
        let _ = writeln!(out, "{name}: {value}");
    }
}

/// Render a request for debug logs with credentials redacted.
#[must_use]
pub fn dump_request(request: &PreparedRequest) -> String {
    let sensitive = request.sensitive_names();
    let mut out = format!(
        "{} {}\n",
        request.method(),
        redacted_url(request.url(), sensitive)
    );
    write_headers(&mut out, request.headers(), sensitive);
    if let Some(body) = request.body() {
        out.push('\n');
        out.push_str(&redacted_body(body));
    }
    out
}

/// Render a response for debug logs with credentials redacted.
#[must_use]
pub fn dump_response(response: &ApiResponse) -> String {
    let mut out = format!("{}\n", response.status());
    write_headers(&mut out, response.headers(), &[]);
    if !response.body().is_empty() {
        out.push('\n');
        out.push_str(&redacted_body(response.body()));
    }
    out
}

impl ApiClient {
    /// Send a prepared request and buffer the response.
    ///
    /// A `429` carrying `Retry-After` is retried exactly once after the
    /// advertised delay, capped by the rate-limit policy. `PATCH` is never
    /// retried. Any status is
    /// returned as a response; classification happens in
    /// [`ApiClient::execute`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Canceled`] when the context is done before or while
    /// the call is in flight, and [`Error::Transport`] on network failure.
    pub async fn call_api(&self, ctx: &CallContext, request: &PreparedRequest) -> Result<ApiResponse> {
        ctx.check()?;

        let response = self.send_once(ctx, request, 1).await?;
        if response.status() != StatusCode::TOO_MANY_REQUESTS
            || !self.config().rate_limit.enabled
            || request.method() == Method::PATCH
        {
            return Ok(response);
        }

        let Some(delay) = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, SystemTime::now()))
        else {
            return Ok(response);
        };
        let delay = delay.min(self.config().rate_limit.max_wait());

        warn!(
            operation = request.operation_id(),
            request_id = %request.request_id(),
            ?delay,
            "Rate limited, retrying once"
        );
        tokio::select! {
            () = ctx.done() => return Err(Error::Canceled),
            () = tokio::time::sleep(delay) => {}
        }

        self.send_once(ctx, request, 2).await
    }

    async fn send_once(
        &self,
        ctx: &CallContext,
        request: &PreparedRequest,
        attempt: u32,
    ) -> Result<ApiResponse> {
        info!(
            operation = request.operation_id(),
            method = %request.method(),
            request_id = %request.request_id(),
            attempt,
            "Sending request"
        );
        if self.config().debug {
            debug!(request_id = %request.request_id(), "Request dump:\n{}", dump_request(request));
        }

        let mut builder = self
            .http
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let url = response.url().clone();
            let body = response.bytes().await?;
            Ok::<_, Error>(ApiResponse::new(status, headers, body, url))
        };

        let response = tokio::select! {
            () = ctx.done() => {
                debug!(request_id = %request.request_id(), "Request canceled in flight");
                return Err(Error::Canceled);
            }
            result = exchange => result?,
        };

        debug!(
            request_id = %request.request_id(),
            status = response.status().as_u16(),
            "Received response"
        );
        if self.config().debug {
            debug!(request_id = %request.request_id(), "Response dump:\n{}", dump_response(&response));
        }
        Ok(response)
    }
}
