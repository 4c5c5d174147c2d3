//! The shared API client.

use crate::codec;
use crate::config::Configuration;
use crate::context::CallContext;
use crate::error::{Error, GenericApiError, Result};
use crate::request::{Operation, PreparedRequest, RequestParts};
use crate::transport::ApiResponse;
use reqwest::{Certificate, Client, ClientBuilder};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Client for the Verity API.
///
/// Cloning is cheap: clones share the configuration and the connection
/// pool. The configuration cannot change after construction.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<Configuration>,
    pub(crate) http: Client,
}

impl ApiClient {
    /// Validate `config` and build a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn new(config: Configuration) -> Result<Self> {
        config.check()?;
        let http = build_http_client(&config)?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// Build a client around an existing `reqwest::Client`.
    ///
    /// The HTTP settings of `config` are not applied to `http`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the configuration is invalid.
    pub fn with_http_client(config: Configuration, http: Client) -> Result<Self> {
        config.check()?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// The frozen configuration.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Assemble the request for an operation.
    ///
    /// # Errors
    ///
    /// See [`PreparedRequest::build`].
    pub fn prepare_request(
        &self,
        ctx: &CallContext,
        operation: &Operation,
        parts: RequestParts,
    ) -> Result<PreparedRequest> {
        PreparedRequest::build(&self.config, ctx, operation, parts)
    }

    /// Decode a response body according to its content type.
    ///
    /// # Errors
    ///
    /// Returns a decoding-kind error when the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, response: &ApiResponse) -> Result<T> {
        codec::decode(response.body(), response.content_type())
    }

    /// Prepare, send and classify one operation call.
    ///
    /// Statuses of 300 and above become [`Error::Api`] carrying the status
    /// line, headers, raw body and the decoded body when it is JSON.
    ///
    /// # Errors
    ///
    /// Returns any preparation, transport or cancellation error, or
    /// [`Error::Api`] for an unsuccessful status.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        operation: &Operation,
        parts: RequestParts,
    ) -> Result<ApiResponse> {
        let request = self.prepare_request(ctx, operation, parts)?;
        let response = self.call_api(ctx, &request).await?;
        let status = response.status();
        if status.as_u16() >= 300 {
            debug!(
                operation = operation.id,
                request_id = %request.request_id(),
                status = status.as_u16(),
                "Request failed"
            );
            return Err(Error::Api(GenericApiError::from_response(
                status,
                response.headers().clone(),
                response.body().clone(),
            )));
        }
        Ok(response)
    }

    /// [`execute`](Self::execute) and decode the body.
    ///
    /// # Errors
    ///
    /// As for [`execute`](Self::execute), plus decoding errors.
    pub async fn execute_json<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        operation: &Operation,
        parts: RequestParts,
    ) -> Result<(T, ApiResponse)> {
        let response = self.execute(ctx, operation, parts).await?;
        let value = self.decode(&response)?;
        Ok((value, response))
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn build_http_client(config: &Configuration) -> Result<Client> {
    let http = &config.http;
    let mut builder = ClientBuilder::new()
        .timeout(http.timeout())
        .user_agent(config.user_agent.as_str())
        .pool_idle_timeout(http.pool_idle_timeout())
        .pool_max_idle_per_host(http.pool_max_idle_per_host)
        .connect_timeout(http.connect_timeout());

    if !http.enable_compression {
        builder = builder.no_gzip();
    }

    if !http.tls_verify {
        warn!("TLS verification disabled - this is insecure!");
        builder = builder.danger_accept_invalid_certs(true);
    }

    if let Some(ca_path) = &http.tls_ca_cert {
        let pem = std::fs::read(ca_path).map_err(|e| {
            Error::ConfigError(format!(
                "Failed to read CA certificate {}: {e}",
                ca_path.display()
            ))
        })?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| Error::ConfigError(format!("Invalid CA certificate: {e}")))?;
        builder = builder.add_root_certificate(cert);
    }

    builder
        .build()
        .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {e}")))
}
