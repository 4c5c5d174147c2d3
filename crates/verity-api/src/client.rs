//! The Verity API client with one handle per resource group.

use crate::models::{
    AuthenticatedEthPort, Bundle, DeviceController, EthPortSettings, StaticConnections,
    Switchpoint, SwitchpointUpgrade, Tenant,
};
use crate::resource::ResourceService;
use crate::session::{Credentials, LoginRequest};
use crate::system::{UpgradeRequest, VersionRequest};
use crate::Result;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use verity_core::{ApiClient, CallContext, Configuration, SessionTokens};

/// Typed client for the Verity fabric API.
///
/// Owns an [`ApiClient`] and the session token store. Clones share both.
#[derive(Clone)]
pub struct VerityClient {
    api: ApiClient,
    tokens: Arc<SessionTokens>,
    credentials: Option<Credentials>,
}

impl VerityClient {
    /// Build a client from a configuration.
    ///
    /// The session token store replaces any token source set on `config`.
    ///
    /// # Errors
    ///
    /// Returns [`verity_core::Error::ConfigError`] when the configuration is
    /// invalid.
    pub fn new(config: Configuration) -> Result<Self> {
        let tokens = Arc::new(SessionTokens::new());
        let api = ApiClient::new(config.with_token_source(tokens.clone()))?;
        Ok(Self {
            api,
            tokens,
            credentials: None,
        })
    }

    /// Wrap an existing [`ApiClient`] and the token store its configuration
    /// reads from.
    #[must_use]
    pub fn from_parts(api: ApiClient, tokens: Arc<SessionTokens>) -> Self {
        Self {
            api,
            tokens,
            credentials: None,
        }
    }

    /// Remember login credentials for [`login`](Self::login) and
    /// [`ensure_session`](Self::ensure_session).
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// The underlying runtime client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The session token store.
    #[must_use]
    pub fn session(&self) -> &SessionTokens {
        &self.tokens
    }

    /// `POST /auth` with the remembered credentials.
    pub fn login(&self) -> LoginRequest<'_> {
        LoginRequest::new(&self.api, &self.tokens, self.credentials.clone())
    }

    /// Log in unless a token that is not about to expire is held.
    ///
    /// # Errors
    ///
    /// As for [`LoginRequest::execute`].
    pub async fn ensure_session(&self, ctx: CallContext) -> Result<()> {
        if !self.tokens.needs_refresh() {
            return Ok(());
        }
        debug!("Session token missing or expiring, logging in");
        self.login().with_context(ctx).execute().await.map(|_| ())
    }

    /// `GET /version`.
    pub fn version(&self) -> VersionRequest<'_> {
        VersionRequest::new(&self.api)
    }

    /// `PATCH /switchpoints/upgrade`.
    pub fn upgrade_switchpoints(&self, upgrade: SwitchpointUpgrade) -> UpgradeRequest<'_> {
        UpgradeRequest::new(&self.api, upgrade)
    }

    /// Authenticated Ethernet ports.
    #[must_use]
    pub fn authenticated_eth_ports(&self) -> ResourceService<'_, AuthenticatedEthPort> {
        ResourceService::new(&self.api)
    }

    /// Endpoint bundles.
    #[must_use]
    pub fn bundles(&self) -> ResourceService<'_, Bundle> {
        ResourceService::new(&self.api)
    }

    /// Device controllers.
    #[must_use]
    pub fn device_controllers(&self) -> ResourceService<'_, DeviceController> {
        ResourceService::new(&self.api)
    }

    /// Ethernet port settings.
    #[must_use]
    pub fn eth_port_settings(&self) -> ResourceService<'_, EthPortSettings> {
        ResourceService::new(&self.api)
    }

    /// Static connections.
    #[must_use]
    pub fn static_connections(&self) -> ResourceService<'_, StaticConnections> {
        ResourceService::new(&self.api)
    }

    /// Switchpoints.
    #[must_use]
    pub fn switchpoints(&self) -> ResourceService<'_, Switchpoint> {
        ResourceService::new(&self.api)
    }

    /// Tenants.
    #[must_use]
    pub fn tenants(&self) -> ResourceService<'_, Tenant> {
        ResourceService::new(&self.api)
    }
}

impl fmt::Debug for VerityClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerityClient")
            .field("api", &self.api)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
