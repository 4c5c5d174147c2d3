//! Ethernet port settings, including LLDP-MED network policies.

use super::GroupProperties;
use crate::resource::declare_resource;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use verity_core::reference_field;

/// Physical and layer-2 settings of an Ethernet port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthPortSettings {
    /// Object name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Enable object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// Negotiate speed and duplex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_negotiation: Option<bool>,
    /// Maximum bit rate, e.g. `10G`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bit_rate: Option<String>,
    /// `Auto`, `Full` or `Half`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplex_mode: Option<String>,
    /// Run spanning tree
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp_enable: Option<bool>,
    /// Skip the listening and learning states
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fast_learning_mode: Option<bool>,
    /// Shut the port on BPDU reception
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpdu_guard: Option<bool>,
    /// Drop BPDUs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpdu_filter: Option<bool>,
    /// Loop guard
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard_loop: Option<bool>,
    /// Power over Ethernet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poe_enable: Option<bool>,
    /// PoE priority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// PoE power budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated_power: Option<String>,
    /// Forward error correction mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fec: Option<String>,
    /// Single link mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_link: Option<bool>,
    /// Run LLDP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_enable: Option<bool>,
    /// Advertise LLDP-MED network policies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_med_enable: Option<bool>,
    /// LLDP-MED network policies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_med: Option<Vec<LldpMedRow>>,
    /// UI grouping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_properties: Option<GroupProperties>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

declare_resource!(
    EthPortSettings,
    service = "Ethportsettings",
    path = "/ethportsettings",
    key = "eth_port_settings",
    name_param = "port_name",
);

/// One LLDP-MED network policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LldpMedRow {
    /// Enable the row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_med_row_num_enable: Option<bool>,
    /// Advertised application, e.g. `Voice`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_med_row_num_advertised_applicatio: Option<String>,
    /// DSCP mark
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_med_row_num_dscp_mark: Option<i32>,
    /// 802.1p priority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_med_row_num_priority: Option<i32>,
    /// Service whose VLAN is advertised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lldp_med_row_num_service: Option<String>,
    /// Type of `lldp_med_row_num_service`
    #[serde(
        rename = "lldp_med_row_num_service_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub lldp_med_row_num_service_ref_type: Option<String>,
    /// Row position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

reference_field!(LldpMedRow { service_ref, set_service_ref => lldp_med_row_num_service, lldp_med_row_num_service_ref_type });

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verity_core::{Reference, ResourceType};

    #[test]
    fn test_lldp_med_rows() {
        let settings: EthPortSettings = serde_json::from_value(json!({
            "name": "voice-port",
            "lldp_med_enable": true,
            "lldp_med": [{
                "lldp_med_row_num_enable": true,
                "lldp_med_row_num_advertised_applicatio": "Voice",
                "lldp_med_row_num_dscp_mark": 46,
                "lldp_med_row_num_priority": 5,
                "lldp_med_row_num_service": "voice",
                "lldp_med_row_num_service_ref_type_": "service",
                "index": 1
            }],
            "isdefault": false
        }))
        .unwrap();

        let row = &settings.lldp_med.as_ref().unwrap()[0];
        assert_eq!(row.lldp_med_row_num_dscp_mark, Some(46));
        assert_eq!(
            row.service_ref(),
            Some(Reference::new(ResourceType::Service, "voice"))
        );
        assert_eq!(settings.additional_properties["isdefault"], json!(false));
    }

    #[test]
    fn test_new_row_with_reference() {
        let mut row = LldpMedRow {
            lldp_med_row_num_enable: Some(true),
            index: Some(2),
            ..LldpMedRow::default()
        };
        row.set_service_ref(Some(Reference::new(ResourceType::Service, "video")));
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({
                "lldp_med_row_num_enable": true,
                "lldp_med_row_num_service": "video",
                "lldp_med_row_num_service_ref_type_": "service",
                "index": 2
            })
        );
    }
}
