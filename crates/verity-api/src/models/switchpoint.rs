//! Switchpoints and the switch upgrade request.

use crate::resource::declare_resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use verity_core::{auto_assigned_field, reference_field, strict_model, Nullable};

/// A managed switch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Switchpoint {
    /// Object name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Serial number of the hardware
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_serial_number: Option<String>,
    /// Bundle applied to the switch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_bundle: Option<String>,
    /// Type of `connected_bundle`
    #[serde(
        rename = "connected_bundle_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub connected_bundle_ref_type: Option<String>,
    /// Do not push configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_mode: Option<bool>,
    /// Prevent edits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// Managed out of band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_of_band_management: Option<bool>,
    /// Super pod
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_pod: Option<String>,
    /// Pod
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    /// Rack
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack: Option<String>,
    /// Router id address and mask
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub switch_router_id_ip_mask: Nullable<String>,
    /// Whether the server picks `switch_router_id_ip_mask`
    #[serde(
        rename = "switch_router_id_ip_mask_auto_assigned_",
        skip_serializing_if = "Option::is_none"
    )]
    pub switch_router_id_ip_mask_auto_assigned: Option<bool>,
    /// VTEP address and mask
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub switch_vtep_id_ip_mask: Nullable<String>,
    /// Whether the server picks `switch_vtep_id_ip_mask`
    #[serde(
        rename = "switch_vtep_id_ip_mask_auto_assigned_",
        skip_serializing_if = "Option::is_none"
    )]
    pub switch_vtep_id_ip_mask_auto_assigned: Option<bool>,
    /// BGP autonomous system number
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub bgp_as_number: Nullable<i32>,
    /// Whether the server picks `bgp_as_number`
    #[serde(
        rename = "bgp_as_number_auto_assigned_",
        skip_serializing_if = "Option::is_none"
    )]
    pub bgp_as_number_auto_assigned: Option<bool>,
    /// Badges shown in the UI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badges: Option<Vec<BadgeRef>>,
    /// UI properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_properties: Option<SwitchpointProperties>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

declare_resource!(
    Switchpoint,
    service = "Switchpoints",
    path = "/switchpoints",
    key = "switchpoint",
    name_param = "switchpoint_name",
);

reference_field!(Switchpoint { connected_bundle_ref, set_connected_bundle_ref => connected_bundle, connected_bundle_ref_type });
auto_assigned_field!(Switchpoint { router_id_assignment, set_router_id_assignment => switch_router_id_ip_mask: String, switch_router_id_ip_mask_auto_assigned });
auto_assigned_field!(Switchpoint { vtep_id_assignment, set_vtep_id_assignment => switch_vtep_id_ip_mask: String, switch_vtep_id_ip_mask_auto_assigned });
auto_assigned_field!(Switchpoint { bgp_as_number_assignment, set_bgp_as_number_assignment => bgp_as_number: i32, bgp_as_number_auto_assigned });

/// A badge attached to a switchpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeRef {
    /// Badge name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    /// Type of `badge`
    #[serde(rename = "badge_ref_type_", skip_serializing_if = "Option::is_none")]
    pub badge_ref_type: Option<String>,
    /// Row position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

reference_field!(BadgeRef { badge_ref, set_badge_ref => badge, badge_ref_type });

/// `object_properties` of a [`Switchpoint`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchpointProperties {
    /// Free text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_notes: Option<String>,
    /// Endpoint this switch is expected under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_parent_endpoint: Option<String>,
    /// Type of `expected_parent_endpoint`
    #[serde(
        rename = "expected_parent_endpoint_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_parent_endpoint_ref_type: Option<String>,
    /// Multipoint count
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub number_of_multipoints: Nullable<i32>,
    /// Aggregate switch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<bool>,
    /// Treat as a host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_host: Option<bool>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

reference_field!(SwitchpointProperties { expected_parent_endpoint_ref, set_expected_parent_endpoint_ref => expected_parent_endpoint, expected_parent_endpoint_ref_type });

/// Body of `PATCH /switchpoints/upgrade`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(remote = "Self", deny_unknown_fields)]
pub struct SwitchpointUpgrade {
    /// Firmware package to install
    pub package_version: String,
    /// Switches to upgrade
    pub device_names: Vec<String>,
}

strict_model!(SwitchpointUpgrade, ["package_version", "device_names"]);

impl SwitchpointUpgrade {
    /// Upgrade `device_names` to `package_version`.
    pub fn new<I, S>(package_version: impl Into<String>, device_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            package_version: package_version.into(),
            device_names: device_names.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verity_core::{codec, Assignment, Error, Reference, ResourceType};

    #[test]
    fn test_auto_assigned_addresses() {
        let sw: Switchpoint = serde_json::from_value(json!({
            "name": "leaf1",
            "switch_router_id_ip_mask": "10.0.0.1/32",
            "switch_router_id_ip_mask_auto_assigned_": false,
            "switch_vtep_id_ip_mask": null,
            "switch_vtep_id_ip_mask_auto_assigned_": true,
            "bgp_as_number": 65001,
            "badges": [{"badge": "spine", "badge_ref_type_": "badge", "index": 1}],
            "object_properties": {"number_of_multipoints": null, "is_host": false}
        }))
        .unwrap();

        assert_eq!(
            sw.router_id_assignment(),
            Some(Assignment::Explicit("10.0.0.1/32".to_string()))
        );
        assert_eq!(sw.vtep_id_assignment(), Some(Assignment::Auto));
        assert_eq!(sw.bgp_as_number_assignment(), Some(Assignment::Explicit(65001)));
        assert_eq!(
            sw.badges.as_ref().unwrap()[0].badge_ref(),
            Some(Reference::new(ResourceType::Badge, "spine"))
        );
        assert!(sw.object_properties.as_ref().unwrap().number_of_multipoints.is_null());
    }

    #[test]
    fn test_upgrade_body_is_strict() {
        let upgrade = SwitchpointUpgrade::new("4.2.1", ["leaf1", "leaf2"]);
        assert_eq!(
            serde_json::to_value(&upgrade).unwrap(),
            json!({"package_version": "4.2.1", "device_names": ["leaf1", "leaf2"]})
        );

        let err = codec::decode::<SwitchpointUpgrade>(br#"{"package_version":"4.2.1"}"#, None)
            .unwrap_err();
        assert_eq!(err, Error::MissingRequired("device_names".into()));
    }
}
