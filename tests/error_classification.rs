//! Transport-boundary classification: HTTP and body failures map to the
//! documented error kinds, and classified errors are never cached.

use testflowx_client::{ErrorKind, TestFlowClient};

fn client_for(server: &mockito::ServerGuard) -> TestFlowClient {
    TestFlowClient::builder()
        .base_url_override(server.url())
        .token("tfx_test_token")
        .build()
        .expect("client should build against mock server")
}

#[tokio::test]
async fn http_statuses_map_to_kinds() {
    let cases = [
        (401, ErrorKind::Auth),
        (403, ErrorKind::Permission),
        (404, ErrorKind::NotFound),
        (422, ErrorKind::Validation),
        (500, ErrorKind::Server),
        (503, ErrorKind::Server),
    ];

    for (status, expected) in cases {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/projects/p1")
            .with_status(status)
            .with_body(r#"{"success":false,"error":"nope"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .projects()
            .fetch_project("p1")
            .await
            .expect_err("request should fail");
        assert_eq!(err.kind, expected, "status {status}");
        assert_eq!(err.status, Some(status as u16));
        // The backend's own message survives classification.
        assert!(err.message.contains("nope"), "got: {}", err.message);
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn malformed_body_surfaces_as_validation() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/projects/p1")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.projects().fetch_project("p1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    mock.assert_async().await;
}

#[tokio::test]
async fn wrong_shape_surfaces_as_validation() {
    let mut server = mockito::Server::new_async().await;
    // Valid JSON, valid envelope flag, wrong payload shape.
    let mock = server
        .mock("GET", "/projects/p1")
        .with_status(200)
        .with_body(r#"{"success":true,"project":{"name":42}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.projects().fetch_project("p1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    mock.assert_async().await;
}

#[tokio::test]
async fn envelope_failure_on_200_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api-keys")
        .with_status(200)
        .with_body(r#"{"success":false,"error":"quota exceeded"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.api_keys().all_api_keys().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Server);
    assert!(err.message.contains("quota exceeded"));
    mock.assert_async().await;
}

#[tokio::test]
async fn auth_failures_are_not_cached() {
    let mut server = mockito::Server::new_async().await;
    // Two requests must both reach the network: error results are never
    // served from cache.
    let mock = server
        .mock("GET", "/projects/p1")
        .with_status(401)
        .with_body(r#"{"success":false,"error":"expired"}"#)
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    let first = client.projects().fetch_project("p1").await.unwrap_err();
    let second = client.projects().fetch_project("p1").await.unwrap_err();
    assert!(first.is_auth_failure());
    assert_eq!(first, second);
    mock.assert_async().await;
}

#[tokio::test]
async fn bearer_token_is_attached() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/projects/p1")
        .match_header("authorization", "Bearer tfx_test_token")
        .with_status(200)
        .with_body(r#"{"success":true,"project":{"_id":"p1","name":"Checkout"}}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let project = client.projects().fetch_project("p1").await.unwrap();
    assert_eq!(project.name, "Checkout");
    mock.assert_async().await;
}
