//! Tenants: layer-3 VRFs with their route targets and route maps.

use super::GroupProperties;
use crate::resource::declare_resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use verity_core::{auto_assigned_field, reference_field, Nullable};

/// A tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tenant {
    /// Object name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Enable object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// VNI of the layer-3 VRF
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub layer_3_vni: Nullable<i32>,
    /// Whether the server picks `layer_3_vni`
    #[serde(
        rename = "layer_3_vni_auto_assigned_",
        skip_serializing_if = "Option::is_none"
    )]
    pub layer_3_vni_auto_assigned: Option<bool>,
    /// VLAN of the layer-3 VRF
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub layer_3_vlan: Nullable<i32>,
    /// Whether the server picks `layer_3_vlan`
    #[serde(
        rename = "layer_3_vlan_auto_assigned_",
        skip_serializing_if = "Option::is_none"
    )]
    pub layer_3_vlan_auto_assigned: Option<bool>,
    /// Source subnet for IPv4 DHCP relay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_relay_source_ipv4s_subnet: Option<String>,
    /// Source subnet for IPv6 DHCP relay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_relay_source_ipv6s_subnet: Option<String>,
    /// BGP route distinguisher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_distinguisher: Option<String>,
    /// Imported route targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_target_import: Option<String>,
    /// Exported route targets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_target_export: Option<String>,
    /// Route map applied on import
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_route_map: Option<String>,
    /// Type of `import_route_map`
    #[serde(
        rename = "import_route_map_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub import_route_map_ref_type: Option<String>,
    /// Route map applied on export
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_route_map: Option<String>,
    /// Type of `export_route_map`
    #[serde(
        rename = "export_route_map_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub export_route_map_ref_type: Option<String>,
    /// VRF name on the switches
    #[serde(skip_serializing_if = "Nullable::is_absent")]
    pub vrf_name: Nullable<String>,
    /// Whether the server picks `vrf_name`
    #[serde(
        rename = "vrf_name_auto_assigned_",
        skip_serializing_if = "Option::is_none"
    )]
    pub vrf_name_auto_assigned: Option<bool>,
    /// Tenants whose routes are leaked into this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_tenants: Option<Vec<RouteTenant>>,
    /// UI grouping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_properties: Option<GroupProperties>,
    /// Originate a default route
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_originate: Option<bool>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

declare_resource!(
    Tenant,
    service = "Tenants",
    path = "/tenants",
    key = "tenant",
    name_param = "tenant_name",
);

auto_assigned_field!(Tenant { layer_3_vni_assignment, set_layer_3_vni_assignment => layer_3_vni: i32, layer_3_vni_auto_assigned });
auto_assigned_field!(Tenant { layer_3_vlan_assignment, set_layer_3_vlan_assignment => layer_3_vlan: i32, layer_3_vlan_auto_assigned });
auto_assigned_field!(Tenant { vrf_name_assignment, set_vrf_name_assignment => vrf_name: String, vrf_name_auto_assigned });
reference_field!(Tenant { import_route_map_ref, set_import_route_map_ref => import_route_map, import_route_map_ref_type });
reference_field!(Tenant { export_route_map_ref, set_export_route_map_ref => export_route_map, export_route_map_ref_type });

impl Tenant {
    /// A named tenant with nothing else set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// One row of a tenant's route leaking table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTenant {
    /// Enable the row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// Leaked tenant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    /// Row position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verity_core::{Assignment, Reference, ResourceType};

    #[test]
    fn test_explicit_null_is_kept_on_the_wire() {
        let mut tenant = Tenant::named("T1");
        tenant.enable = Some(true);
        tenant.layer_3_vni = Nullable::Null;
        tenant.layer_3_vni_auto_assigned = Some(false);

        assert_eq!(
            serde_json::to_value(&tenant).unwrap(),
            json!({
                "name": "T1",
                "enable": true,
                "layer_3_vni": null,
                "layer_3_vni_auto_assigned_": false
            })
        );
    }

    #[test]
    fn test_decode_keeps_unknown_properties() {
        let tenant: Tenant = serde_json::from_value(json!({
            "name": "T1",
            "layer_3_vni": 10001,
            "layer_3_vni_auto_assigned_": false,
            "vrf_name": null,
            "vrf_name_auto_assigned_": true,
            "import_route_map": "RM-IN",
            "import_route_map_ref_type_": "route_map",
            "future_field": {"a": 1}
        }))
        .unwrap();

        assert_eq!(tenant.layer_3_vni_assignment(), Some(Assignment::Explicit(10001)));
        assert_eq!(tenant.vrf_name_assignment(), Some(Assignment::Auto));
        assert_eq!(tenant.layer_3_vlan_assignment(), None);
        assert_eq!(
            tenant.import_route_map_ref(),
            Some(Reference::new(ResourceType::RouteMap, "RM-IN"))
        );
        assert_eq!(tenant.additional_properties["future_field"], json!({"a": 1}));

        let round_trip = serde_json::to_value(&tenant).unwrap();
        assert_eq!(round_trip["future_field"], json!({"a": 1}));
        assert_eq!(round_trip["vrf_name"], Value::Null);
        assert!(round_trip.get("layer_3_vlan").is_none());
    }

    #[test]
    fn test_auto_assignment_setter() {
        let mut tenant = Tenant::named("T2");
        tenant.set_layer_3_vlan_assignment(Assignment::Auto);
        tenant.set_export_route_map_ref(Some(Reference::new(ResourceType::RouteMap, "RM-OUT")));

        let wire = serde_json::to_value(&tenant).unwrap();
        assert_eq!(wire["layer_3_vlan"], Value::Null);
        assert_eq!(wire["layer_3_vlan_auto_assigned_"], true);
        assert_eq!(wire["export_route_map"], "RM-OUT");
        assert_eq!(wire["export_route_map_ref_type_"], "route_map");
    }
}
