//! End-to-end tests of the typed resources against a mock Verity server.

use reqwest::StatusCode;
use serde_json::json;
use std::time::Duration;
use verity_api::models::{SwitchpointUpgrade, Tenant};
use verity_api::{SystemMode, VerityClient};
use verity_core::{CallContext, Configuration, Error, ErrorKind, Nullable};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn start() -> (MockServer, VerityClient) {
    let server = MockServer::start().await;
    let config = Configuration::new().with_base_path(format!("{}/api", server.uri()));
    let client = VerityClient::new(config)
        .unwrap()
        .with_credentials("admin", "secret");
    (server, client)
}

fn fixture(name: &str) -> Vec<u8> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}

#[tokio::test]
async fn test_delete_many_in_changeset() {
    let (server, client) = start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/authenticatedethports"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .authenticated_eth_ports()
        .delete()
        .with_names(["portA", "portB"])
        .with_changeset("cs1")
        .execute()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let received = server.received_requests().await.unwrap();
    assert_eq!(
        received[0].url.query(),
        Some("authenticated_eth_port_name=portA&authenticated_eth_port_name=portB&changeset_name=cs1")
    );
}

#[tokio::test]
async fn test_delete_without_names_is_rejected_locally() {
    let (server, client) = start().await;

    let err = client.tenants().delete().execute().await.unwrap_err();

    assert_eq!(
        err,
        Error::InvalidArgument("tenant_name is required and must be specified".into())
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_with_data_keeps_nested_maps() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/devicecontrollers"))
        .and(query_param("include_data", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(fixture("devicecontrollers_include_data.json"), "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (controllers, response) = client
        .device_controllers()
        .list()
        .with_include_data(true)
        .execute()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let leaf1 = controllers.get("dc-leaf1").unwrap();
    assert_eq!(
        leaf1.additional_properties["object_properties"]["ports"]["Ethernet1"]["admin_up"],
        json!(true)
    );
}

#[tokio::test]
async fn test_put_sends_explicit_null() {
    let (server, client) = start().await;
    Mock::given(method("PUT"))
        .and(path("/api/tenants"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "tenant": {
                "T1": {
                    "name": "T1",
                    "enable": true,
                    "layer_3_vni": null,
                    "layer_3_vni_auto_assigned_": false
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut tenant = Tenant::named("T1");
    tenant.enable = Some(true);
    tenant.layer_3_vni = Nullable::Null;
    tenant.layer_3_vni_auto_assigned = Some(false);

    let response = client
        .tenants()
        .put()
        .with_item("T1", tenant)
        .execute()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_put_without_body_is_rejected_locally() {
    let (server, client) = start().await;

    let err = client.bundles().put().execute().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(err.to_string().contains("endpoint_bundle body is required"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_patch_in_changeset() {
    let (server, client) = start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/switchpoints"))
        .and(query_param("changeset_name", "cs2"))
        .and(body_json(json!({"switchpoint": {"leaf1": {"locked": true}}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let patch = verity_api::models::Switchpoint {
        locked: Some(true),
        ..Default::default()
    };
    client
        .switchpoints()
        .patch()
        .with_item("leaf1", patch)
        .with_changeset("cs2")
        .execute()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_login_then_cookie_is_sent() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .and(body_json(json!({"auth": {"username": "admin", "password": "secret"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "tok123"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tenants"))
        .and(header("cookie", "ivn_api=tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tenant": {}})))
        .expect(1)
        .mount(&server)
        .await;

    client.ensure_session(CallContext::new()).await.unwrap();
    client.ensure_session(CallContext::new()).await.unwrap();
    let (tenants, _) = client.tenants().list().execute().await.unwrap();

    assert!(tenants.is_empty());
    assert!(!client.session().needs_refresh());
}

#[tokio::test]
async fn test_cleared_session_sends_no_cookie() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "ivn_api=tok123; Path=/")
                .set_body_json(json!({"token": "tok123"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tenants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tenant": {}})))
        .expect(1)
        .mount(&server)
        .await;

    client.ensure_session(CallContext::new()).await.unwrap();
    client.session().clear();
    assert!(client.session().needs_refresh());
    client.tenants().list().execute().await.unwrap();

    let received = server.received_requests().await.unwrap();
    let list = received
        .iter()
        .find(|request| request.url.path() == "/api/tenants")
        .unwrap();
    assert!(list.headers.get("cookie").is_none());
}

#[tokio::test]
async fn test_login_failure_surfaces_http_error() {
    let (server, client) = start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad credentials"})))
        .mount(&server)
        .await;

    let err = client.login().execute().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Http(401));
    assert_eq!(
        err.as_api_error().and_then(|e| e.model()).cloned(),
        Some(json!({"error": "bad credentials"}))
    );
    assert!(client.session().needs_refresh());
}

#[tokio::test]
async fn test_auth_body_missing_password_is_reported() {
    let err = verity_core::codec::decode::<verity_api::session::AuthRequest>(
        br#"{"auth":{"username":"admin"}}"#,
        Some("application/json"),
    )
    .unwrap_err();

    assert_eq!(err, Error::MissingRequired("password".into()));
    assert_eq!(err.kind(), ErrorKind::Decoding);
}

#[tokio::test]
async fn test_rate_limited_list_is_retried_once() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/bundles"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/bundles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "endpoint_bundle": {"b1": {"name": "b1"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (bundles, response) = client.bundles().list().execute().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(bundles.get("b1").and_then(|b| b.name.as_deref()), Some("b1"));
}

#[tokio::test]
async fn test_canceled_call_is_never_sent() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/tenants"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tenant": {}})))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = CallContext::new();
    ctx.cancel();
    let err = client
        .tenants()
        .list()
        .with_context(ctx)
        .execute()
        .await
        .unwrap_err();

    assert_eq!(err, Error::Canceled);
}

#[tokio::test]
async fn test_call_exceeding_deadline_is_aborted() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/tenants"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"tenant": {}}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let ctx = CallContext::new().with_timeout(Duration::from_millis(100));
    let err = client
        .tenants()
        .list()
        .with_context(ctx)
        .execute()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Canceled);
}

#[tokio::test]
async fn test_version_mode_check() {
    let (server, client) = start().await;
    Mock::given(method("GET"))
        .and(path("/api/version"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"version": "6.4.2", "datacenter": true})),
        )
        .mount(&server)
        .await;

    let (info, _) = client
        .version()
        .with_expected_mode(SystemMode::Datacenter)
        .execute()
        .await
        .unwrap();
    assert_eq!(info.version, "6.4.2");

    let err = client
        .version()
        .with_expected_mode(SystemMode::Campus)
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("Mode mismatch")));
}

#[tokio::test]
async fn test_switchpoint_upgrade() {
    let (server, client) = start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/switchpoints/upgrade"))
        .and(body_json(json!({"package_version": "4.2.1", "device_names": ["leaf1"]})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let response = client
        .upgrade_switchpoints(SwitchpointUpgrade::new("4.2.1", ["leaf1"]))
        .execute()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}
