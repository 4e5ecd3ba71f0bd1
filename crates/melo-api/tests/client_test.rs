#![allow(clippy::unwrap_used)]
// Integration tests for `DeviceClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use melo_api::{DeviceClient, Error};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, DeviceClient) {
    let server = MockServer::start().await;
    let client = DeviceClient::with_client(reqwest::Client::new(), &server.uri()).unwrap();
    (server, client)
}

// ── List tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    let body = json!([
        {
            "serial": "MELO-0001",
            "name": "Living room",
            "description": "Amplifier",
            "icon": "living",
            "http_port": 80,
            "https_port": 443,
            "online": true,
            "last_update": 1_700_000_100,
            "ifaces": [
                { "mac": "aa:bb:cc:dd:ee:01", "name": "eth0", "type": "ethernet", "ipv4": "10.0.0.5" }
            ]
        },
        {
            "serial": "MELO-0002",
            "name": "Bedroom",
            "description": "Speaker",
            "icon": "bed",
            "http_port": 8080,
            "online": false,
            "last_update": 1_700_000_000,
            "ifaces": []
        }
    ]);

    Mock::given(method("GET"))
        .and(path("/device/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].serial, "MELO-0001");
    assert_eq!(devices[0].ifaces[0].ipv4.as_deref(), Some("10.0.0.5"));
    assert_eq!(devices[1].https_port, None);
    assert!(!devices[1].online);
}

#[tokio::test]
async fn test_list_devices_fractional_timestamp() {
    let (server, client) = setup().await;

    let body = r#"[
        {"serial": "MELO-0001", "online": true, "last_update": 1700000000.5, "ifaces": []},
        {"serial": "MELO-0002", "online": true, "last_update": 1700000001, "ifaces": []}
    ]"#;

    Mock::given(method("GET"))
        .and(path("/device/list"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].last_update, 1_700_000_000);
    assert_eq!(devices[1].last_update, 1_700_000_001);
}

#[tokio::test]
async fn test_list_devices_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/device/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_list_devices_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/device/list"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.list_devices().await.unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_devices_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/device/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_devices().await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "<html>oops</html>"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

// ── Delete tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_delete_device_ok() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/device/MELO-0001"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_device("MELO-0001").await.unwrap();
}

#[tokio::test]
async fn test_delete_device_no_content_is_failure() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/device/MELO-0001"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let result = client.delete_device("MELO-0001").await;
    assert!(
        matches!(result, Err(Error::Api { status: 204, .. })),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_delete_device_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/device/MELO-9999"))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown device"))
        .mount(&server)
        .await;

    let err = client.delete_device("MELO-9999").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on port 1.
    let client = DeviceClient::with_client(reqwest::Client::new(), "http://127.0.0.1:1").unwrap();
    let err = client.list_devices().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got: {err:?}");
    assert!(err.is_transient());
}
