//! Authentication material and how it is attached to requests.
//!
//! An [`AuthContext`] bundles the credentials for every scheme the Verity
//! API accepts. The client carries a default context; a call may supply an
//! overlay whose entries win per scheme. Session tokens obtained from
//! `POST /auth` are provided through the [`TokenSource`] seam and sent as the
//! `ivn_api` cookie.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "ivn_api";

/// Default lifetime of a session token.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Default margin before expiry at which a token should be renewed.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

fn clone_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_owned())
}

/// HTTP Basic credentials.
pub struct BasicAuth {
    /// User name
    pub user_name: String,
    /// Password
    pub password: SecretString,
}

impl BasicAuth {
    /// Create Basic credentials.
    pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            password: SecretString::from(password.into()),
        }
    }

    fn header_value(&self) -> String {
        let raw = format!("{}:{}", self.user_name, self.password.expose_secret());
        format!("Basic {}", BASE64.encode(raw))
    }
}

impl Clone for BasicAuth {
    fn clone(&self) -> Self {
        Self {
            user_name: self.user_name.clone(),
            password: clone_secret(&self.password),
        }
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// An API key with an optional prefix such as `Token`.
pub struct ApiKey {
    /// Key material
    pub key: SecretString,
    /// Optional prefix, sent as `<prefix> <key>`
    pub prefix: Option<String>,
}

impl ApiKey {
    /// Create an unprefixed key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: SecretString::from(key.into()),
            prefix: None,
        }
    }

    /// Set the prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    fn wire_value(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix} {}", self.key.expose_secret()),
            None => self.key.expose_secret().to_owned(),
        }
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self {
            key: clone_secret(&self.key),
            prefix: self.prefix.clone(),
        }
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &"[REDACTED]")
            .field("prefix", &self.prefix)
            .finish()
    }
}

/// Where an API key travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    /// Request header
    Header,
    /// Query parameter
    Query,
    /// Cookie
    Cookie,
}

/// An API-key scheme accepted by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiKeyScheme {
    /// Scheme name, used to look the key up in an [`AuthContext`]
    pub name: &'static str,
    /// Header, query parameter or cookie name
    pub param_name: &'static str,
    /// Where the key is attached
    pub location: ApiKeyLocation,
}

impl ApiKeyScheme {
    /// Declare a scheme sent in a header.
    #[must_use]
    pub const fn header(name: &'static str, param_name: &'static str) -> Self {
        Self {
            name,
            param_name,
            location: ApiKeyLocation::Header,
        }
    }

    /// Declare a scheme sent as a query parameter.
    #[must_use]
    pub const fn query(name: &'static str, param_name: &'static str) -> Self {
        Self {
            name,
            param_name,
            location: ApiKeyLocation::Query,
        }
    }

    /// Declare a scheme sent as a cookie.
    #[must_use]
    pub const fn cookie(name: &'static str, param_name: &'static str) -> Self {
        Self {
            name,
            param_name,
            location: ApiKeyLocation::Cookie,
        }
    }
}

/// Credentials for every supported scheme.
#[derive(Default)]
pub struct AuthContext {
    basic: Option<BasicAuth>,
    bearer: Option<SecretString>,
    api_keys: BTreeMap<String, ApiKey>,
    access_token: Option<SecretString>,
}

impl AuthContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set Basic credentials.
    #[must_use]
    pub fn with_basic(mut self, basic: BasicAuth) -> Self {
        self.basic = Some(basic);
        self
    }

    /// Set a bearer token.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(SecretString::from(token.into()));
        self
    }

    /// Register an API key under a scheme name.
    #[must_use]
    pub fn with_api_key(mut self, scheme: impl Into<String>, key: ApiKey) -> Self {
        self.api_keys.insert(scheme.into(), key);
        self
    }

    /// Set an OAuth access token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }

    /// True when no credential of any scheme is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.basic.is_none()
            && self.bearer.is_none()
            && self.api_keys.is_empty()
            && self.access_token.is_none()
    }

    fn has_authorization(&self) -> bool {
        self.basic.is_some() || self.bearer.is_some() || self.access_token.is_some()
    }

    /// Layer `overlay` on top of `self`.
    ///
    /// API keys merge per scheme name, overlay keys winning. Basic, bearer
    /// and OAuth credentials all travel in `Authorization`, so they are
    /// taken as one set: when the overlay carries any of them, none of the
    /// defaults' are kept.
    #[must_use]
    pub fn overlay(&self, overlay: &Self) -> Self {
        let mut api_keys = self.api_keys.clone();
        for (name, key) in &overlay.api_keys {
            api_keys.insert(name.clone(), key.clone());
        }
        let identity = if overlay.has_authorization() {
            overlay
        } else {
            self
        };
        Self {
            basic: identity.basic.clone(),
            bearer: identity.bearer.as_ref().map(clone_secret),
            api_keys,
            access_token: identity.access_token.as_ref().map(clone_secret),
        }
    }

    /// Resolve the credentials an operation accepts into wire material.
    ///
    /// Basic is applied first, a bearer token replaces it, API keys follow
    /// for each scheme the operation declares, and the OAuth access token is
    /// used as a bearer token only when no bearer was set. Keys registered
    /// under names the operation does not declare are ignored.
    #[must_use]
    pub fn apply(&self, schemes: &[ApiKeyScheme]) -> AppliedAuth {
        let mut applied = AppliedAuth::default();

        if let Some(basic) = &self.basic {
            applied.authorization = Some(basic.header_value());
        }
        if let Some(bearer) = &self.bearer {
            applied.authorization = Some(format!("Bearer {}", bearer.expose_secret()));
        }
        for scheme in schemes {
            let Some(key) = self.api_keys.get(scheme.name) else {
                continue;
            };
            let pair = (scheme.param_name.to_string(), key.wire_value());
            match scheme.location {
                ApiKeyLocation::Header => applied.headers.push(pair),
                ApiKeyLocation::Query => applied.query.push(pair),
                ApiKeyLocation::Cookie => applied.cookies.push(pair),
            }
        }
        if self.bearer.is_none() {
            if let Some(token) = &self.access_token {
                applied.authorization = Some(format!("Bearer {}", token.expose_secret()));
            }
        }

        applied
    }
}

impl Clone for AuthContext {
    fn clone(&self) -> Self {
        Self {
            basic: self.basic.clone(),
            bearer: self.bearer.as_ref().map(clone_secret),
            api_keys: self.api_keys.clone(),
            access_token: self.access_token.as_ref().map(clone_secret),
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("basic", &self.basic)
            .field("bearer", &self.bearer.as_ref().map(|_| "[REDACTED]"))
            .field("api_keys", &self.api_keys)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Credentials resolved for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedAuth {
    /// `Authorization` header value
    pub authorization: Option<String>,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// Extra query parameters
    pub query: Vec<(String, String)>,
    /// Extra cookies
    pub cookies: Vec<(String, String)>,
}

/// Supplies the current session token, if any.
#[cfg_attr(test, mockall::automock)]
pub trait TokenSource: Send + Sync {
    /// The token to send, or `None` when no valid token is held.
    fn token(&self) -> Option<String>;
}

struct StoredToken {
    value: SecretString,
    // None when the lifetime runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

/// Session token store with expiry tracking.
pub struct SessionTokens {
    inner: RwLock<Option<StoredToken>>,
    refresh_margin: Duration,
}

impl SessionTokens {
    /// Create an empty store with the default refresh margin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(None),
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        }
    }

    /// Set the refresh margin.
    #[must_use]
    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Store a token that expires after `expires_in`.
    pub fn set_token(&self, token: impl Into<String>, expires_in: Duration) {
        let stored = StoredToken {
            value: SecretString::from(token.into()),
            expires_at: Instant::now().checked_add(expires_in),
        };
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(stored);
    }

    /// True when no token is held or it is within the refresh margin of
    /// expiring.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map_or(true, |stored| {
            stored.expires_at.is_some_and(|expires_at| {
                Instant::now()
                    .checked_add(self.refresh_margin)
                    .map_or(true, |horizon| horizon >= expires_at)
            })
        })
    }

    /// Drop the held token.
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Default for SessionTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for SessionTokens {
    fn token(&self) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|stored| stored.expires_at.map_or(true, |at| Instant::now() < at))
            .map(|stored| stored.value.expose_secret().to_owned())
    }
}

impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("refresh_margin", &self.refresh_margin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER_KEY: ApiKeyScheme = ApiKeyScheme::header("ApiKeyAuth", "X-API-Key");
    const QUERY_KEY: ApiKeyScheme = ApiKeyScheme::query("ApiKeyQuery", "api_key");

    #[test]
    fn basic_is_base64_encoded() {
        let auth = AuthContext::new().with_basic(BasicAuth::new("admin", "secret"));
        let applied = auth.apply(&[]);
        assert_eq!(
            applied.authorization.as_deref(),
            Some("Basic YWRtaW46c2VjcmV0")
        );
    }

    #[test]
    fn bearer_overrides_basic() {
        let auth = AuthContext::new()
            .with_basic(BasicAuth::new("admin", "secret"))
            .with_bearer("tok");
        assert_eq!(auth.apply(&[]).authorization.as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn access_token_only_without_bearer() {
        let oauth_only = AuthContext::new().with_access_token("oauth");
        assert_eq!(
            oauth_only.apply(&[]).authorization.as_deref(),
            Some("Bearer oauth")
        );

        let both = AuthContext::new().with_bearer("tok").with_access_token("oauth");
        assert_eq!(both.apply(&[]).authorization.as_deref(), Some("Bearer tok"));
    }

    #[test]
    fn api_keys_follow_declared_location() {
        let auth = AuthContext::new()
            .with_api_key("ApiKeyAuth", ApiKey::new("k1").with_prefix("Token"))
            .with_api_key("ApiKeyQuery", ApiKey::new("k2"))
            .with_api_key("Unknown", ApiKey::new("ignored"));
        let applied = auth.apply(&[HEADER_KEY, QUERY_KEY]);
        assert_eq!(
            applied.headers,
            vec![("X-API-Key".to_string(), "Token k1".to_string())]
        );
        assert_eq!(applied.query, vec![("api_key".to_string(), "k2".to_string())]);
        assert!(applied.cookies.is_empty());
    }

    #[test]
    fn undeclared_scheme_is_not_applied() {
        let auth = AuthContext::new().with_api_key("ApiKeyAuth", ApiKey::new("k1"));
        assert!(auth.apply(&[QUERY_KEY]).headers.is_empty());
    }

    #[test]
    fn overlay_wins_per_scheme() {
        let defaults = AuthContext::new()
            .with_basic(BasicAuth::new("admin", "secret"))
            .with_api_key("ApiKeyAuth", ApiKey::new("default"));
        let overlay = AuthContext::new().with_api_key("ApiKeyAuth", ApiKey::new("tenant"));

        let merged = defaults.overlay(&overlay);
        let applied = merged.apply(&[HEADER_KEY]);
        assert_eq!(applied.headers[0].1, "tenant");
        assert!(applied
            .authorization
            .as_deref()
            .is_some_and(|v| v.starts_with("Basic ")));
    }

    #[test]
    fn overlay_identity_replaces_default_identity() {
        let defaults = AuthContext::new()
            .with_bearer("service-token")
            .with_api_key("ApiKeyAuth", ApiKey::new("default"));
        let overlay = AuthContext::new().with_basic(BasicAuth::new("tenant", "pw"));

        let applied = defaults.overlay(&overlay).apply(&[HEADER_KEY]);
        assert_eq!(applied.authorization.as_deref(), Some("Basic dGVuYW50OnB3"));
        assert_eq!(applied.headers[0].1, "default");

        let keys_only = AuthContext::new().with_api_key("ApiKeyAuth", ApiKey::new("tenant"));
        let applied = defaults.overlay(&keys_only).apply(&[HEADER_KEY]);
        assert_eq!(applied.authorization.as_deref(), Some("Bearer service-token"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let auth = AuthContext::new()
            .with_basic(BasicAuth::new("admin", "hunter2"))
            .with_bearer("tok-123")
            .with_api_key("ApiKeyAuth", ApiKey::new("key-456"));
        let rendered = format!("{auth:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("tok-123"));
        assert!(!rendered.contains("key-456"));
    }

    #[test]
    fn session_tokens_expire() {
        let tokens = SessionTokens::new();
        assert!(tokens.token().is_none());
        assert!(tokens.needs_refresh());

        tokens.set_token("abc", DEFAULT_TOKEN_LIFETIME);
        assert_eq!(tokens.token().as_deref(), Some("abc"));
        assert!(!tokens.needs_refresh());

        tokens.set_token("short", Duration::from_secs(60));
        assert_eq!(tokens.token().as_deref(), Some("short"));
        assert!(tokens.needs_refresh());

        tokens.set_token("gone", Duration::ZERO);
        assert!(tokens.token().is_none());

        tokens.set_token("abc", DEFAULT_TOKEN_LIFETIME);
        tokens.clear();
        assert!(tokens.token().is_none());
    }

    #[test]
    fn unbounded_lifetime_does_not_overflow() {
        let tokens = SessionTokens::new().with_refresh_margin(Duration::MAX);
        tokens.set_token("forever", Duration::MAX);
        assert_eq!(tokens.token().as_deref(), Some("forever"));
        assert!(!tokens.needs_refresh());

        tokens.set_token("short", Duration::from_secs(60));
        assert!(tokens.needs_refresh());
    }

    #[test]
    fn mock_token_source() {
        let mut source = MockTokenSource::new();
        source
            .expect_token()
            .times(1)
            .returning(|| Some("mocked".to_string()));
        assert_eq!(source.token().as_deref(), Some("mocked"));
    }
}
