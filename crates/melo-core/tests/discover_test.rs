#![allow(clippy::unwrap_used)]
// End-to-end tests for `Discover` over HTTP, using wiremock.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use melo_core::{Discover, DiscoverConfig, UrlStyle, ViewState, interface_url};

async fn setup() -> (MockServer, Discover) {
    let server = MockServer::start().await;
    let config = DiscoverConfig {
        api_url: server.uri(),
        ..DiscoverConfig::default()
    };
    let discover = Discover::from_config(&config).unwrap();
    (server, discover)
}

async fn mount_list(server: &MockServer) {
    let body = json!([
        {
            "serial": "MELO-0002",
            "name": "Bedroom",
            "icon": "bed",
            "http_port": 8080,
            "online": true,
            "last_update": 1_700_000_000,
            "ifaces": [{ "mac": "aa:bb:cc:dd:ee:02", "name": "wlan0", "type": "wifi", "ipv6": "fe80::1" }]
        },
        {
            "serial": "MELO-0001",
            "name": "Living room",
            "icon": "living",
            "http_port": 80,
            "https_port": 443,
            "online": true,
            "last_update": 1_700_000_100,
            "ifaces": [{ "mac": "aa:bb:cc:dd:ee:01", "name": "eth0", "type": "ethernet", "ipv4": "10.0.0.5", "ipv6": "" }]
        }
    ]);
    Mock::given(method("GET"))
        .and(path("/device/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn loads_and_orders_devices() {
    let (server, discover) = setup().await;
    mount_list(&server).await;

    let devices = discover.load().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].serial, "MELO-0001");
    assert_eq!(devices[0].interfaces[0].ipv6, None);

    let living = &devices[0];
    let bedroom = &devices[1];
    assert_eq!(
        interface_url(living, &living.interfaces[0], UrlStyle::WithPort).as_deref(),
        Some("http://10.0.0.5:443")
    );
    assert_eq!(
        interface_url(bedroom, &bedroom.interfaces[0], UrlStyle::WithPort).as_deref(),
        Some("http://fe80::1:8080")
    );
}

#[tokio::test]
async fn delete_ok_removes_device() {
    let (server, discover) = setup().await;
    mount_list(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/device/MELO-0002"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    discover.load().await.unwrap();
    discover.delete("MELO-0002").await.unwrap();

    let state = discover.state();
    let serials: Vec<_> = state.devices().unwrap().iter().map(|d| d.serial.as_str()).collect();
    assert_eq!(serials, ["MELO-0001"]);
}

#[tokio::test]
async fn delete_rejected_keeps_device() {
    let (server, discover) = setup().await;
    mount_list(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/device/MELO-0002"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    discover.load().await.unwrap();
    let err = discover.delete("MELO-0002").await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(discover.state().devices().unwrap().len(), 2);
}

#[tokio::test]
async fn server_error_is_failed_state() {
    let (server, discover) = setup().await;
    Mock::given(method("GET"))
        .and(path("/device/list"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(discover.load().await.is_err());
    assert!(matches!(discover.state(), ViewState::Failed(_)));
}
