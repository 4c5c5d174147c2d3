//! System level operations: the version check and switch upgrades.

use crate::models::SwitchpointUpgrade;
use crate::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};
use verity_core::content::APPLICATION_JSON;
use verity_core::{
    ApiClient, ApiResponse, CallContext, Error, Operation, RequestBody, RequestParts,
};

/// Kind of fabric a Verity system manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemMode {
    /// Datacenter fabric
    Datacenter,
    /// Campus network
    Campus,
}

impl SystemMode {
    /// Wire and display form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Datacenter => "datacenter",
            Self::Campus => "campus",
        }
    }
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reply of `GET /version`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionInfo {
    /// API version string
    pub version: String,
    /// True on datacenter systems, false on campus systems
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datacenter: Option<bool>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

impl VersionInfo {
    /// Mode the system reports, when it reports one.
    #[must_use]
    pub fn mode(&self) -> Option<SystemMode> {
        self.datacenter.map(|datacenter| {
            if datacenter {
                SystemMode::Datacenter
            } else {
                SystemMode::Campus
            }
        })
    }

    /// Fail when the system reports a mode other than `expected`.
    ///
    /// A system that does not report its mode passes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] on a mode mismatch.
    pub fn check_mode(&self, expected: SystemMode) -> Result<()> {
        match self.mode() {
            Some(actual) if actual != expected => Err(Error::ConfigError(format!(
                "Mode mismatch: client is configured for '{expected}' mode but the system is running in '{actual}' mode"
            ))),
            Some(_) => Ok(()),
            None => {
                debug!("No datacenter field in version response, skipping mode validation");
                Ok(())
            }
        }
    }
}

/// `GET /version`.
#[must_use = "requests do nothing until executed"]
pub struct VersionRequest<'a> {
    client: &'a ApiClient,
    ctx: CallContext,
    expected_mode: Option<SystemMode>,
}

impl<'a> VersionRequest<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            ctx: CallContext::new(),
            expected_mode: None,
        }
    }

    /// Use a call context.
    pub fn with_context(mut self, ctx: CallContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Verify the system runs in this mode.
    pub fn with_expected_mode(mut self, mode: SystemMode) -> Self {
        self.expected_mode = Some(mode);
        self
    }

    /// Send the request.
    ///
    /// # Errors
    ///
    /// Returns transport, HTTP, cancellation or decoding errors, a decoding
    /// error for an empty version and a configuration error on a mode
    /// mismatch.
    pub async fn execute(self) -> Result<(VersionInfo, ApiResponse)> {
        let operation = Operation::new("VersionGet", Method::GET, "/version")
            .with_produces(&[APPLICATION_JSON]);
        let (info, response): (VersionInfo, _) = self
            .client
            .execute_json(&self.ctx, &operation, RequestParts::new())
            .await?;

        if info.version.is_empty() {
            return Err(Error::Decoding("API version response is empty".to_string()));
        }
        if let Some(expected) = self.expected_mode {
            info.check_mode(expected)?;
        }
        info!(version = %info.version, "Fetched API version");
        Ok((info, response))
    }
}

/// `PATCH /switchpoints/upgrade`.
#[must_use = "requests do nothing until executed"]
pub struct UpgradeRequest<'a> {
    client: &'a ApiClient,
    ctx: CallContext,
    upgrade: SwitchpointUpgrade,
}

impl<'a> UpgradeRequest<'a> {
    pub(crate) fn new(client: &'a ApiClient, upgrade: SwitchpointUpgrade) -> Self {
        Self {
            client,
            ctx: CallContext::new(),
            upgrade,
        }
    }

    /// Use a call context.
    pub fn with_context(mut self, ctx: CallContext) -> Self {
        self.ctx = ctx;
        self
    }

    /// Send the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when no device is named, otherwise
    /// transport, HTTP or cancellation errors.
    pub async fn execute(self) -> Result<ApiResponse> {
        if self.upgrade.device_names.is_empty() {
            return Err(verity_core::report_error(
                "device_names is required and must be specified",
            ));
        }

        let operation = Operation::new(
            "SwitchpointsUpgradePatch",
            Method::PATCH,
            "/switchpoints/upgrade",
        )
        .with_consumes(&[APPLICATION_JSON])
        .with_produces(&[APPLICATION_JSON]);
        let parts = RequestParts::new().with_body(RequestBody::json(&self.upgrade)?);
        info!(
            package_version = %self.upgrade.package_version,
            devices = self.upgrade.device_names.len(),
            "Requesting switch upgrade"
        );
        self.client.execute(&self.ctx, &operation, parts).await
    }
}
