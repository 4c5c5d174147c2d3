//! Device controllers: out-of-band managers for switches and endpoints.

use crate::resource::declare_resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use verity_core::reference_field;

/// A device controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceController {
    /// Object name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Enable object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// `dhcp` or `static`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_source: Option<String>,
    /// Controller address and mask
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_ip_and_mask: Option<String>,
    /// Controller gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    /// Managed switch address and mask
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_ip_and_mask: Option<String>,
    /// Managed switch gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_gateway: Option<String>,
    /// Communication type, e.g. `snmpv2`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comm_type: Option<String>,
    /// SNMP community string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snmp_community_string: Option<String>,
    /// Uplink port of the controller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uplink_port: Option<String>,
    /// String matched against LLDP to locate the device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_search_string: Option<String>,
    /// Zero-touch provisioning identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ztp_identification: Option<String>,
    /// How the device was located
    #[serde(skip_serializing_if = "Option::is_none")]
    pub located_by: Option<String>,
    /// Power state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_state: Option<String>,
    /// Communication mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub communication_mode: Option<String>,
    /// CLI access mode, e.g. `SSH`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_access_mode: Option<String>,
    /// Login user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Login password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Privileged mode password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_password: Option<String>,
    /// Manage over the native VLAN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_on_native_vlan: Option<bool>,
    /// SDLC settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdlc: Option<String>,
    /// Managed switchpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switchpoint: Option<String>,
    /// Type of `switchpoint`
    #[serde(
        rename = "switchpoint_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub switchpoint_ref_type: Option<String>,
    /// Security type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_type: Option<String>,
    /// Service the management traffic uses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_service: Option<String>,
    /// Type of `connection_service`
    #[serde(
        rename = "connection_service_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub connection_service_ref_type: Option<String>,
    /// Port the controller is attached to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// `switch` or `endpoint`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_managed_as: Option<String>,
    /// Managed switch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<String>,
    /// Type of `switch`
    #[serde(rename = "switch_ref_type_", skip_serializing_if = "Option::is_none")]
    pub switch_ref_type: Option<String>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

declare_resource!(
    DeviceController,
    service = "Devicecontrollers",
    path = "/devicecontrollers",
    key = "device_controller",
    name_param = "device_controller_name",
);

reference_field!(DeviceController { switchpoint_ref, set_switchpoint_ref => switchpoint, switchpoint_ref_type });
reference_field!(DeviceController { connection_service_ref, set_connection_service_ref => connection_service, connection_service_ref_type });
reference_field!(DeviceController { switch_ref, set_switch_ref => switch, switch_ref_type });

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verity_core::{Reference, ResourceType};

    #[test]
    fn test_nested_runtime_data_is_preserved() {
        let dc: DeviceController = serde_json::from_value(json!({
            "name": "dc1",
            "enable": true,
            "switchpoint": "leaf1",
            "switchpoint_ref_type_": "switchpoint",
            "state": {"online": true, "ports": [1, 2]}
        }))
        .unwrap();

        assert_eq!(
            dc.switchpoint_ref(),
            Some(Reference::new(ResourceType::Switchpoint, "leaf1"))
        );
        assert_eq!(dc.additional_properties["state"]["ports"], json!([1, 2]));
        assert_eq!(
            serde_json::to_value(&dc).unwrap()["state"],
            json!({"online": true, "ports": [1, 2]})
        );
    }
}
