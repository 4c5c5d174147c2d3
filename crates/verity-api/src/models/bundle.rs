//! Endpoint bundles: device settings plus per-port profiles and services.

use crate::resource::declare_resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use verity_core::reference_field;

/// An endpoint bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bundle {
    /// Object name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Device settings applied to the endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_settings: Option<String>,
    /// Type of `device_settings`
    #[serde(
        rename = "device_settings_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_settings_ref_type: Option<String>,
    /// Extra CLI commands pushed to the device
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_commands: Option<String>,
    /// Per-port profile assignments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_port_paths: Option<Vec<EthPortPath>>,
    /// Services attached to the endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_services: Option<Vec<UserService>>,
    /// UI properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_properties: Option<BundleProperties>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

declare_resource!(
    Bundle,
    service = "Bundles",
    path = "/bundles",
    key = "endpoint_bundle",
    name_param = "bundle_name",
);

reference_field!(Bundle { device_settings_ref, set_device_settings_ref => device_settings, device_settings_ref_type });

/// Profiles applied to one port of a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthPortPath {
    /// Port profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_port_num_eth_port_profile: Option<String>,
    /// Type of `eth_port_num_eth_port_profile`
    #[serde(
        rename = "eth_port_num_eth_port_profile_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub eth_port_num_eth_port_profile_ref_type: Option<String>,
    /// Port settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_port_num_eth_port_settings: Option<String>,
    /// Type of `eth_port_num_eth_port_settings`
    #[serde(
        rename = "eth_port_num_eth_port_settings_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub eth_port_num_eth_port_settings_ref_type: Option<String>,
    /// Gateway profile
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_port_num_gateway_profile: Option<String>,
    /// Type of `eth_port_num_gateway_profile`
    #[serde(
        rename = "eth_port_num_gateway_profile_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub eth_port_num_gateway_profile_ref_type: Option<String>,
    /// Row position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    /// Port the row applies to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_name: Option<String>,
}

reference_field!(EthPortPath { eth_port_profile_ref, set_eth_port_profile_ref => eth_port_num_eth_port_profile, eth_port_num_eth_port_profile_ref_type });
reference_field!(EthPortPath { eth_port_settings_ref, set_eth_port_settings_ref => eth_port_num_eth_port_settings, eth_port_num_eth_port_settings_ref_type });
reference_field!(EthPortPath { gateway_profile_ref, set_gateway_profile_ref => eth_port_num_gateway_profile, eth_port_num_gateway_profile_ref_type });

/// A service attached to a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserService {
    /// Enable the row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_app_enable: Option<bool>,
    /// Connected service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_app_connected_service: Option<String>,
    /// Type of `row_app_connected_service`
    #[serde(
        rename = "row_app_connected_service_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub row_app_connected_service_ref_type: Option<String>,
    /// CLI commands for the service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_app_cli_commands: Option<String>,
    /// Address and mask
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_ip_mask: Option<String>,
    /// Row position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

reference_field!(UserService { connected_service_ref, set_connected_service_ref => row_app_connected_service, row_app_connected_service_ref_type });

/// `object_properties` of a [`Bundle`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleProperties {
    /// UI group
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Bundle targets switches rather than endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_for_switch: Option<bool>,
    /// Visible to all tenants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verity_core::{Reference, ResourceType};

    #[test]
    fn test_port_paths_round_trip() {
        let payload = json!({
            "name": "leaf-bundle",
            "device_settings": "default",
            "device_settings_ref_type_": "device_settings",
            "eth_port_paths": [{
                "eth_port_num_eth_port_profile": "Uplink",
                "eth_port_num_eth_port_profile_ref_type_": "eth_port_profile_",
                "eth_port_num_eth_port_settings": "10G",
                "eth_port_num_eth_port_settings_ref_type_": "eth_port_settings",
                "index": 1,
                "port_name": "Ethernet1"
            }],
            "object_properties": {"is_for_switch": true}
        });
        let bundle: Bundle = serde_json::from_value(payload.clone()).unwrap();

        assert_eq!(
            bundle.device_settings_ref(),
            Some(Reference::new(ResourceType::DeviceSettings, "default"))
        );
        let path = &bundle.eth_port_paths.as_ref().unwrap()[0];
        assert_eq!(
            path.eth_port_settings_ref(),
            Some(Reference::new(ResourceType::EthPortSettings, "10G"))
        );
        assert_eq!(path.gateway_profile_ref(), None);
        assert_eq!(serde_json::to_value(&bundle).unwrap(), payload);
    }

    #[test]
    fn test_clearing_reference_drops_both_fields() {
        let mut service = UserService {
            row_app_connected_service: Some("web".into()),
            row_app_connected_service_ref_type: Some("service".into()),
            ..UserService::default()
        };
        service.set_connected_service_ref(None);
        assert_eq!(serde_json::to_value(&service).unwrap(), json!({}));
    }
}
