//! Authenticated Ethernet ports (802.1X / MAC authentication).

use crate::resource::declare_resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use verity_core::reference_field;

/// An authenticated Ethernet port profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatedEthPort {
    /// Object name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Enable object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// `SingleClient`, `MultipleClient` and similar
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_mode: Option<String>,
    /// Seconds between re-authentications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reauthorization_period_sec: Option<i32>,
    /// Fall back to MAC based authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_mac_based_authentication: Option<bool>,
    /// Seconds to wait before trying MAC authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_authentication_holdoff_sec: Option<i32>,
    /// Skip authentication on this port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trusted_port: Option<bool>,
    /// Port profiles assigned after authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_ports: Option<Vec<AuthenticatedEthPortProfile>>,
    /// UI grouping and monitoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_properties: Option<AuthenticatedEthPortProperties>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

declare_resource!(
    AuthenticatedEthPort,
    service = "Authenticatedethports",
    path = "/authenticatedethports",
    key = "authenticated_eth_port",
    name_param = "authenticated_eth_port_name",
);

/// One row of [`AuthenticatedEthPort::eth_ports`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatedEthPortProfile {
    /// Enable the row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_port_profile_num_enable: Option<bool>,
    /// Port profile applied on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_port_profile_num_eth_port: Option<String>,
    /// Type of `eth_port_profile_num_eth_port`
    #[serde(
        rename = "eth_port_profile_num_eth_port_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub eth_port_profile_num_eth_port_ref_type: Option<String>,
    /// Walled garden set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_port_profile_num_walled_garden_set: Option<bool>,
    /// RADIUS filter id selecting this row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_port_profile_num_radius_filter_id: Option<String>,
    /// Row position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

reference_field!(AuthenticatedEthPortProfile {
    eth_port_ref, set_eth_port_ref => eth_port_profile_num_eth_port, eth_port_profile_num_eth_port_ref_type
});

/// `object_properties` of an [`AuthenticatedEthPort`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticatedEthPortProperties {
    /// UI group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Port monitoring level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_monitoring: Option<String>,
}
