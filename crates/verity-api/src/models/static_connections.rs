//! Static connections between endpoint ports.

use crate::resource::declare_resource;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use verity_core::reference_field;

/// A named set of static links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConnections {
    /// Enable object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// The links
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<StaticConnection>>,
    /// Free-form UI properties
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_properties: Option<Map<String, Value>>,
    /// Properties this client does not model
    #[serde(flatten)]
    pub additional_properties: BTreeMap<String, Value>,
}

declare_resource!(
    StaticConnections,
    service = "Staticconnections",
    path = "/staticconnections",
    key = "static_connections",
    name_param = "static_connections_name",
);

/// One link between two endpoint ports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConnection {
    /// First endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint1_for_a_static_connection: Option<String>,
    /// Type of `endpoint1_for_a_static_connection`
    #[serde(
        rename = "endpoint1_for_a_static_connection_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub endpoint1_for_a_static_connection_ref_type: Option<String>,
    /// Port on the first endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port1_for_a_static_connection: Option<String>,
    /// Type of `port1_for_a_static_connection`
    #[serde(
        rename = "port1_for_a_static_connection_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub port1_for_a_static_connection_ref_type: Option<String>,
    /// Second endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint2_for_a_static_connection: Option<String>,
    /// Type of `endpoint2_for_a_static_connection`
    #[serde(
        rename = "endpoint2_for_a_static_connection_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub endpoint2_for_a_static_connection_ref_type: Option<String>,
    /// Port on the second endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port2_for_a_static_connection: Option<String>,
    /// Type of `port2_for_a_static_connection`
    #[serde(
        rename = "port2_for_a_static_connection_ref_type_",
        skip_serializing_if = "Option::is_none"
    )]
    pub port2_for_a_static_connection_ref_type: Option<String>,
    /// Row position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

reference_field!(StaticConnection { endpoint1_ref, set_endpoint1_ref => endpoint1_for_a_static_connection, endpoint1_for_a_static_connection_ref_type });
reference_field!(StaticConnection { port1_ref, set_port1_ref => port1_for_a_static_connection, port1_for_a_static_connection_ref_type });
reference_field!(StaticConnection { endpoint2_ref, set_endpoint2_ref => endpoint2_for_a_static_connection, endpoint2_for_a_static_connection_ref_type });
reference_field!(StaticConnection { port2_ref, set_port2_ref => port2_for_a_static_connection, port2_for_a_static_connection_ref_type });

impl StaticConnection {
    /// A link from `(endpoint1, port1)` to `(endpoint2, port2)`.
    #[must_use]
    pub fn between(
        endpoint1: verity_core::Reference,
        port1: verity_core::Reference,
        endpoint2: verity_core::Reference,
        port2: verity_core::Reference,
    ) -> Self {
        let mut conn = Self::default();
        conn.set_endpoint1_ref(Some(endpoint1));
        conn.set_port1_ref(Some(port1));
        conn.set_endpoint2_ref(Some(endpoint2));
        conn.set_port2_ref(Some(port2));
        conn
    }
}
