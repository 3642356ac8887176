mod common;

use common::FakeServerBuilder;
use monstack_client::{AlertRouterApi, AlertRouterClient};
use monstack_core::Endpoint;

#[test]
fn healthy_endpoint_is_probed() {
    let server = FakeServerBuilder::default()
        .route("GET", "/-/healthy", 200, "OK")
        .start();

    let client = AlertRouterClient::new(Endpoint::new(format!("{}/", server.url))).unwrap();
    client.health().unwrap();
    assert_eq!(server.requests_to("GET", "/-/healthy").len(), 1);
}

#[test]
fn unhealthy_router_reports_status() {
    let server = FakeServerBuilder::default()
        .route("GET", "/-/healthy", 503, "not ready")
        .start();

    let client = AlertRouterClient::new(Endpoint::new(server.url.clone())).unwrap();
    let err = client.health().unwrap_err();
    assert_eq!(err.status(), Some(503));
}
