//! Session login through `POST /auth`.
//!
//! A successful login stores the returned token in a shared
//! [`SessionTokens`] store. The store is installed as the configuration's
//! token source, so every later request carries the `ivn_api` cookie until
//! the token expires.

use crate::Result;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use verity_core::auth::DEFAULT_TOKEN_LIFETIME;
use verity_core::content::APPLICATION_JSON;
use verity_core::{
    one_of, report_error, strict_model, ApiClient, ApiResponse, CallContext, Error,
    GenericApiError, Operation, RequestBody, RequestParts, SessionTokens,
};

const LOGIN_OPERATION: &str = "AuthPost";
const LOGIN_PATH: &str = "/auth";

/// User name and password sent to `POST /auth`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", deny_unknown_fields)]
pub struct AuthCredentials {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

strict_model!(AuthCredentials, ["username", "password"]);

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Body of `POST /auth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", deny_unknown_fields)]
pub struct AuthRequest {
    /// Credentials
    pub auth: AuthCredentials,
}

strict_model!(AuthRequest, ["auth"]);

/// A granted session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", deny_unknown_fields)]
pub struct AuthToken {
    /// Token value, sent back as the `ivn_api` cookie
    pub token: String,
}

strict_model!(AuthToken, ["token"]);

/// A refused login reported with a success status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", deny_unknown_fields)]
pub struct AuthFailure {
    /// Server's reason
    pub error: String,
}

strict_model!(AuthFailure, ["error"]);

one_of! {
    /// Reply of `POST /auth`.
    pub enum AuthResponse {
        /// Login succeeded
        Token(AuthToken),
        /// Login refused
        Failure(AuthFailure),
    }
}

/// Login material kept by the client for renewing its session.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: Arc<SecretString>,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Arc::new(SecretString::from(password.into())),
        }
    }

    /// User name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    fn to_request(&self) -> AuthRequest {
        AuthRequest {
            auth: AuthCredentials {
                username: self.username.clone(),
                password: self.password.expose_secret().to_owned(),
            },
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// `POST /auth`, storing the granted token.
#[must_use = "requests do nothing until executed"]
pub struct LoginRequest<'a> {
    client: &'a ApiClient,
    tokens: &'a SessionTokens,
    ctx: CallContext,
    credentials: Option<Credentials>,
    lifetime: Duration,
}

impl<'a> LoginRequest<'a> {
    pub(crate) fn new(
        client: &'a ApiClient,
        tokens: &'a SessionTokens,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            client,
            tokens,
            ctx: CallContext::new(),
            credentials,
            lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }

    /// Use a call context.
    pub fn with_context(mut self, ctx: CallContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Log in with these credentials instead of the client's.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// How long the granted token is considered valid.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Send the request and store the token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no credentials are known, an
    /// HTTP error when the server refuses the login, or a decoding error
    /// when the reply carries no token.
    pub async fn execute(self) -> Result<ApiResponse> {
        let credentials = self
            .credentials
            .ok_or_else(|| report_error("auth credentials are required and must be specified"))?;

        let operation = Operation::new(LOGIN_OPERATION, Method::POST, LOGIN_PATH)
            .with_consumes(&[APPLICATION_JSON])
            .with_produces(&[APPLICATION_JSON]);
        let parts = RequestParts::new().with_body(RequestBody::json(&credentials.to_request())?);

        debug!(username = %credentials.username, "Logging in");
        let response = self.client.execute(&self.ctx, &operation, parts).await?;

        let value: serde_json::Value = self.client.decode(&response)?;
        match AuthResponse::from_value(&value)? {
            AuthResponse::Token(AuthToken { token }) if token.is_empty() => {
                Err(Error::Decoding("no token found in response".to_string()))
            }
            AuthResponse::Token(AuthToken { token }) => {
                self.tokens.set_token(token, self.lifetime);
                info!(username = %credentials.username, "Session established");
                Ok(response)
            }
            AuthResponse::Failure(AuthFailure { error }) => Err(Error::Api(
                GenericApiError::new(format!("authentication failed: {error}")),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verity_core::codec;

    #[test]
    fn test_auth_request_shape() {
        let body = Credentials::new("admin", "secret").to_request();
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"auth": {"username": "admin", "password": "secret"}})
        );
    }

    #[test]
    fn test_auth_request_missing_password() {
        let err = codec::decode::<AuthRequest>(br#"{"auth":{"username":"admin"}}"#, None)
            .unwrap_err();
        assert_eq!(err, Error::MissingRequired("password".into()));
    }

    #[test]
    fn test_auth_response_dispatch() {
        assert_eq!(
            AuthResponse::from_value(&json!({"token": "abc"})).unwrap(),
            AuthResponse::Token(AuthToken {
                token: "abc".into()
            })
        );
        assert!(matches!(
            AuthResponse::from_value(&json!({"error": "bad password"})).unwrap(),
            AuthResponse::Failure(_)
        ));
        assert_eq!(
            AuthResponse::from_value(&json!({"other": 1})).unwrap_err(),
            Error::NoMatchingVariant("AuthResponse".into())
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let shown = format!("{:?}", Credentials::new("admin", "hunter2"));
        assert!(!shown.contains("hunter2"));
        let shown = format!("{:?}", Credentials::new("admin", "hunter2").to_request());
        assert!(!shown.contains("hunter2"));
    }
}
