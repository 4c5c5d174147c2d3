//! Configuration for Verity API clients.
//!
//! A [`Configuration`] describes where requests go (the server catalog and
//! its per-operation overrides), what every request carries (default
//! headers, user agent, default credentials) and how the HTTP transport is
//! tuned. It is frozen behind an `Arc` once a client is built.

use crate::auth::{AuthContext, TokenSource};
use crate::context::CallContext;
use crate::error::{Error, Result};
use crate::server::{self, ServerConfiguration, ServerVariable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default user agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("verity-core/", env!("CARGO_PKG_VERSION"));

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout for pooled connections in seconds.
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default cap on a single rate-limit wait in seconds.
pub const DEFAULT_RATE_LIMIT_MAX_WAIT_SECS: u64 = 60;

/// HTTP transport tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[validate(range(min = 1, max = 600))]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[validate(range(min = 1, max = 120))]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Connection pool idle timeout in seconds
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Enable response compression
    #[serde(default = "default_true")]
    pub enable_compression: bool,

    /// Whether to verify TLS certificates
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Optional path to a PEM CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<std::path::PathBuf>,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_pool_idle_timeout_secs() -> u64 {
    DEFAULT_POOL_IDLE_TIMEOUT
}

const fn default_pool_max_idle_per_host() -> usize {
    DEFAULT_POOL_MAX_IDLE_PER_HOST
}

const fn default_true() -> bool {
    true
}

impl HttpConfig {
    /// Create an HTTP configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_idle_timeout_secs: DEFAULT_POOL_IDLE_TIMEOUT,
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_compression: true,
            tls_verify: true,
            tls_ca_cert: None,
        }
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Set connection pool idle timeout in seconds.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, seconds: u64) -> Self {
        self.pool_idle_timeout_secs = seconds;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable response compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: std::path::PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Pool idle timeout as a Duration.
    #[must_use]
    pub const fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Handling of `429 Too Many Requests`.
///
/// When enabled, a 429 carrying `Retry-After` is retried exactly once after
/// the advertised delay, capped at `max_wait_secs` and bounded by the call
/// deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RateLimitPolicy {
    /// Whether the single retry is performed
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Upper bound on the wait in seconds
    #[validate(range(max = 3600))]
    #[serde(default = "default_rate_limit_max_wait_secs")]
    pub max_wait_secs: u64,
}

const fn default_rate_limit_max_wait_secs() -> u64 {
    DEFAULT_RATE_LIMIT_MAX_WAIT_SECS
}

impl RateLimitPolicy {
    /// Retry once, waiting at most the default cap.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: true,
            max_wait_secs: DEFAULT_RATE_LIMIT_MAX_WAIT_SECS,
        }
    }

    /// Never retry; every 429 is surfaced.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            max_wait_secs: 0,
        }
    }

    /// Set the wait cap in seconds.
    #[must_use]
    pub const fn with_max_wait(mut self, seconds: u64) -> Self {
        self.max_wait_secs = seconds;
        self
    }

    /// The wait cap as a Duration.
    #[must_use]
    pub const fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-wide configuration.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct Configuration {
    /// Fixed base URL; when set it replaces server catalog resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Host (and optional port) that replaces the resolved server's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Scheme that replaces the resolved server's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    /// Headers sent with every request
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,

    /// `User-Agent` header value
    #[validate(length(min = 1))]
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Log redacted request and response dumps
    #[serde(default)]
    pub debug: bool,

    /// Global server catalog
    #[serde(default = "default_servers")]
    pub servers: Vec<ServerConfiguration>,

    /// Per-operation server catalogs keyed by operation id
    #[serde(default)]
    pub operation_servers: BTreeMap<String, Vec<ServerConfiguration>>,

    /// HTTP transport tuning
    #[validate(nested)]
    #[serde(default)]
    pub http: HttpConfig,

    /// Rate-limit retry behavior
    #[validate(nested)]
    #[serde(default)]
    pub rate_limit: RateLimitPolicy,

    /// Default credentials, overlaid by per-call auth
    #[serde(skip)]
    pub auth: AuthContext,

    /// Source of the session token sent as the `ivn_api` cookie
    #[serde(skip)]
    pub token_source: Option<Arc<dyn TokenSource>>,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// The default catalog: `{scheme}://{host}/api`.
fn default_servers() -> Vec<ServerConfiguration> {
    vec![ServerConfiguration::new("{scheme}://{host}/api")
        .with_description("Verity API")
        .with_variable(
            "scheme",
            ServerVariable::new("https").with_enum_values(["http", "https"]),
        )
        .with_variable("host", ServerVariable::new("localhost"))]
}

impl Configuration {
    /// Create a configuration with the default catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_path: None,
            host: None,
            scheme: None,
            default_headers: BTreeMap::new(),
            user_agent: default_user_agent(),
            debug: false,
            servers: default_servers(),
            operation_servers: BTreeMap::new(),
            http: HttpConfig::new(),
            rate_limit: RateLimitPolicy::new(),
            auth: AuthContext::new(),
            token_source: None,
        }
    }

    /// Create a configuration targeting `<scheme>://<host>/api` of a Verity
    /// endpoint URI such as `https://verity.example.com`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URI does not parse or has no host.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let parsed = Url::parse(uri.trim_end_matches('/'))
            .map_err(|e| Error::ConfigError(format!("Invalid URI `{uri}`: {e}")))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::ConfigError(format!("URI `{uri}` has no host")))?;
        let authority = match parsed.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut config = Self::new();
        config.servers = vec![ServerConfiguration::new(format!(
            "{}://{authority}/api",
            parsed.scheme()
        ))];
        Ok(config)
    }

    /// Set a fixed base URL.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Override the host of every resolved URL.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Override the scheme of every resolved URL.
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Enable or disable redacted debug dumps.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Replace the global server catalog.
    #[must_use]
    pub fn with_servers(mut self, servers: Vec<ServerConfiguration>) -> Self {
        self.servers = servers;
        self
    }

    /// Register a catalog for one operation.
    #[must_use]
    pub fn with_operation_servers(
        mut self,
        operation_id: impl Into<String>,
        servers: Vec<ServerConfiguration>,
    ) -> Self {
        self.operation_servers.insert(operation_id.into(), servers);
        self
    }

    /// Set the HTTP tuning.
    #[must_use]
    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Set the rate-limit policy.
    #[must_use]
    pub fn with_rate_limit(mut self, policy: RateLimitPolicy) -> Self {
        self.rate_limit = policy;
        self
    }

    /// Set default credentials.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = auth;
        self
    }

    /// Set the session token source.
    #[must_use]
    pub fn with_token_source(mut self, source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(source);
        self
    }

    /// Validate field ranges and every server catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;
        if self.base_path.is_none() && self.servers.is_empty() {
            return Err(Error::ConfigError(
                "no base path and an empty server catalog".to_string(),
            ));
        }
        for server in self.servers.iter().chain(self.operation_servers.values().flatten()) {
            server.validate()?;
        }
        Ok(())
    }

    /// Resolve the base URL for an operation.
    ///
    /// The operation's own catalog is used when one is registered, otherwise
    /// the global one. The index and variable overrides come from the call
    /// context. `host` and `scheme` overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error when the index is out of range, a variable value is
    /// not allowed, or the result is not a valid URL.
    pub fn server_url_with_context(&self, ctx: &CallContext, operation_id: &str) -> Result<String> {
        let resolved = match &self.base_path {
            Some(base_path) => base_path.clone(),
            None => {
                let catalog = self
                    .operation_servers
                    .get(operation_id)
                    .map_or(self.servers.as_slice(), Vec::as_slice);
                let index = ctx.server_index_for(operation_id);
                let mut layers = vec![ctx.server_variables()];
                if let Some(op_vars) = ctx.operation_server_variables(operation_id) {
                    layers.push(op_vars);
                }
                server::resolve(catalog, index, &layers)?
            }
        };

        if self.host.is_none() && self.scheme.is_none() {
            return Ok(resolved);
        }
        self.apply_host_overrides(&resolved)
    }

    fn apply_host_overrides(&self, resolved: &str) -> Result<String> {
        let mut url = Url::parse(resolved)?;
        if let Some(scheme) = &self.scheme {
            url.set_scheme(scheme)
                .map_err(|()| Error::InvalidArgument(format!("cannot use scheme `{scheme}`")))?;
        }
        if let Some(host) = &self.host {
            let (name, port) = match host.rsplit_once(':') {
                Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => {
                    let port = port
                        .parse::<u16>()
                        .map_err(|e| Error::InvalidArgument(format!("invalid port in `{host}`: {e}")))?;
                    (name, Some(port))
                }
                _ => (host.as_str(), None),
            };
            url.set_host(Some(name))?;
            if port.is_some() {
                url.set_port(port)
                    .map_err(|()| Error::InvalidArgument(format!("cannot set port on `{resolved}`")))?;
            }
        }
        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("base_path", &self.base_path)
            .field("host", &self.host)
            .field("scheme", &self.scheme)
            .field("default_headers", &self.default_headers.keys().collect::<Vec<_>>())
            .field("user_agent", &self.user_agent)
            .field("debug", &self.debug)
            .field("servers", &self.servers)
            .field("operation_servers", &self.operation_servers)
            .field("http", &self.http)
            .field("rate_limit", &self.rate_limit)
            .field("auth", &self.auth)
            .field("token_source", &self.token_source.as_ref().map(|_| "TokenSource"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerVariables;

    fn vars(pairs: &[(&str, &str)]) -> ServerVariables {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_default_configuration() {
        let config = Configuration::default();
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(!config.debug);
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert!(config.rate_limit.enabled);
        config.check().unwrap();
    }

    #[test]
    fn test_default_server_url() {
        let config = Configuration::new();
        let url = config
            .server_url_with_context(&CallContext::new(), "TenantsGet")
            .unwrap();
        assert_eq!(url, "https://localhost/api");
    }

    #[test]
    fn test_from_uri() {
        let config = Configuration::from_uri("https://verity.example.com:8443/").unwrap();
        let url = config
            .server_url_with_context(&CallContext::new(), "VersionGet")
            .unwrap();
        assert_eq!(url, "https://verity.example.com:8443/api");

        assert!(Configuration::from_uri("not a uri").is_err());
    }

    #[test]
    fn test_variable_overrides_and_enum_check() {
        let config = Configuration::new();
        let ctx = CallContext::new().with_server_variables(vars(&[("host", "fabric.local")]));
        assert_eq!(
            config.server_url_with_context(&ctx, "TenantsGet").unwrap(),
            "https://fabric.local/api"
        );

        let ctx = CallContext::new().with_server_variables(vars(&[("scheme", "ftp")]));
        let err = config.server_url_with_context(&ctx, "TenantsGet").unwrap_err();
        assert!(matches!(err, Error::VariableNotAllowed { .. }));
    }

    #[test]
    fn test_per_call_variables_beat_per_operation() {
        let config = Configuration::new();
        let ctx = CallContext::new()
            .with_server_variables(vars(&[("host", "call.local")]))
            .with_operation_server_variables("TenantsGet", vars(&[("host", "op.local")]));
        assert_eq!(
            config.server_url_with_context(&ctx, "TenantsGet").unwrap(),
            "https://call.local/api"
        );

        let ctx = CallContext::new()
            .with_operation_server_variables("TenantsGet", vars(&[("host", "op.local")]));
        assert_eq!(
            config.server_url_with_context(&ctx, "TenantsGet").unwrap(),
            "https://op.local/api"
        );
        assert_eq!(
            config.server_url_with_context(&ctx, "BundlesGet").unwrap(),
            "https://localhost/api"
        );
    }

    #[test]
    fn test_operation_servers_override_global() {
        let config = Configuration::new().with_operation_servers(
            "VersionGet",
            vec![
                ServerConfiguration::new("http://primary/api"),
                ServerConfiguration::new("http://secondary/api"),
            ],
        );
        let ctx = CallContext::new().with_operation_server_index("VersionGet", 1);
        assert_eq!(
            config.server_url_with_context(&ctx, "VersionGet").unwrap(),
            "http://secondary/api"
        );
        assert_eq!(
            config
                .server_url_with_context(&CallContext::new(), "VersionGet")
                .unwrap(),
            "http://primary/api"
        );
    }

    #[test]
    fn test_host_and_scheme_overrides() {
        let config = Configuration::new()
            .with_host("10.0.0.5:8080")
            .with_scheme("http");
        assert_eq!(
            config
                .server_url_with_context(&CallContext::new(), "TenantsGet")
                .unwrap(),
            "http://10.0.0.5:8080/api"
        );
    }

    #[test]
    fn test_base_path_replaces_catalog() {
        let config = Configuration::new().with_base_path("http://127.0.0.1:9000/api");
        assert_eq!(
            config
                .server_url_with_context(&CallContext::new().with_server_index(7), "TenantsGet")
                .unwrap(),
            "http://127.0.0.1:9000/api"
        );
    }

    #[test]
    fn test_validation() {
        let mut config = Configuration::new().with_user_agent("");
        assert!(config.check().is_err());

        config.user_agent = "agent".into();
        config.http.timeout_secs = 0;
        assert!(config.check().is_err());

        config.http.timeout_secs = 30;
        config.servers = vec![ServerConfiguration::new("https://{host}/api")];
        assert!(matches!(config.check(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_rate_limit_policy() {
        assert_eq!(RateLimitPolicy::new().max_wait(), Duration::from_secs(60));
        assert!(!RateLimitPolicy::disabled().enabled);
        assert_eq!(
            RateLimitPolicy::new().with_max_wait(5).max_wait(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = Configuration::new()
            .with_debug(true)
            .with_default_header("X-Tenant", "blue");
        let json = serde_json::to_string(&config).unwrap();
        let restored: Configuration = serde_json::from_str(&json).unwrap();
        assert!(restored.debug);
        assert_eq!(restored.default_headers, config.default_headers);
        assert_eq!(restored.servers, config.servers);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let restored: Configuration = serde_json::from_str(r#"{"debug": true}"#).unwrap();
        assert_eq!(restored.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(restored.servers.len(), 1);
        assert_eq!(restored.http, HttpConfig::default());
    }
}
