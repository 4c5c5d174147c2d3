//! Integration tests for parsing Verity listing payloads.
//!
//! These tests validate that the verity-api models decode captured listing
//! responses and write them back without losing data.

use std::fs;
use std::path::PathBuf;
use verity_api::models::{DeviceController, Tenant};
use verity_api::ResourceMap;
use verity_core::{Assignment, Reference, ResourceType};

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a fixture from disk as JSON.
fn load_fixture(name: &str) -> serde_json::Value {
    let fixture_path = fixtures_dir().join(name);
    let raw = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("Fixture {name} is not JSON: {e}"))
}

#[test]
fn test_deserialize_device_controller_listing() {
    let payload = load_fixture("devicecontrollers_include_data.json");
    let controllers = ResourceMap::<DeviceController>::from_response(payload)
        .unwrap_or_else(|e| panic!("Failed to decode device controllers: {e}"));

    assert_eq!(controllers.names().collect::<Vec<_>>(), ["dc-leaf1", "dc-leaf2"]);

    let leaf1 = controllers.get("dc-leaf1").unwrap();
    assert_eq!(leaf1.enable, Some(true));
    assert_eq!(
        leaf1.connection_service_ref(),
        Some(Reference::new(ResourceType::Service, "mgmt"))
    );
    let ports = &leaf1.additional_properties["object_properties"]["ports"];
    assert_eq!(ports["Ethernet2"]["speed"], "25G");

    let leaf2 = controllers.get("dc-leaf2").unwrap();
    assert_eq!(
        leaf2.switch_ref(),
        Some(Reference::new(ResourceType::Switchpoint, "leaf2"))
    );
    assert_eq!(leaf2.switchpoint_ref(), None);
}

#[test]
fn test_device_controller_listing_round_trips() {
    let payload = load_fixture("devicecontrollers_include_data.json");
    let controllers = ResourceMap::<DeviceController>::from_response(payload.clone()).unwrap();

    let verity_core::RequestBody::Value(body) = controllers.to_body().unwrap() else {
        panic!("expected a structured body");
    };
    assert_eq!(body, payload);
}

#[test]
fn test_deserialize_tenant_listing() {
    let payload = load_fixture("tenants.json");
    let tenants = ResourceMap::<Tenant>::from_response(payload).unwrap();

    assert_eq!(tenants.len(), 2, "Expected 2 tenants in test data");

    let t1 = tenants.get("T1").unwrap();
    assert_eq!(t1.layer_3_vni_assignment(), Some(Assignment::Explicit(10001)));
    assert_eq!(t1.layer_3_vlan_assignment(), Some(Assignment::Auto));
    assert_eq!(
        t1.vrf_name_assignment(),
        Some(Assignment::Explicit("vrf-t1".to_string()))
    );
    assert_eq!(t1.import_route_map_ref(), None, "empty reference reads as unset");
    assert_eq!(t1.route_tenants.as_ref().map(Vec::len), Some(1));

    let t2 = tenants.get("T2").unwrap();
    assert!(t2.layer_3_vni.is_null());
    assert_eq!(t2.layer_3_vni_assignment(), Some(Assignment::Auto));
}
