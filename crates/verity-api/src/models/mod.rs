//! Data transfer objects for the supported fabric resources.
//!
//! Resource objects are permissive: every field is optional, absent fields
//! are omitted when sending, and properties this client does not model are
//! kept in `additional_properties` so a read-modify-write cycle loses
//! nothing. Request bodies of fixed-form operations are strict instead.

mod authenticated_eth_port;
mod bundle;
mod device_controller;
mod eth_port_settings;
mod static_connections;
mod switchpoint;
mod tenant;

pub use authenticated_eth_port::{
    AuthenticatedEthPort, AuthenticatedEthPortProfile, AuthenticatedEthPortProperties,
};
pub use bundle::{Bundle, BundleProperties, EthPortPath, UserService};
pub use device_controller::DeviceController;
pub use eth_port_settings::{EthPortSettings, LldpMedRow};
pub use static_connections::{StaticConnection, StaticConnections};
pub use switchpoint::{BadgeRef, Switchpoint, SwitchpointProperties, SwitchpointUpgrade};
pub use tenant::{RouteTenant, Tenant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `object_properties` of resources that only carry a UI group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupProperties {
    /// UI group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}
