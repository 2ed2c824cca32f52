use photosync_core::{ArchiveClient, ClientOptions, DEFAULT_USER_AGENT, FetchError};
use tempfile::tempdir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetch_text_sends_browser_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/folders"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ArchiveClient::new().unwrap();
    let body = client
        .fetch_text(&format!("{}/folders", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn fetch_text_uses_configured_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/folders"))
        .and(header("user-agent", "archive-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ArchiveClient::with_options(&ClientOptions {
        user_agent: "archive-test/1.0".into(),
        accept_invalid_certs: false,
    })
    .unwrap();
    client
        .fetch_text(&format!("{}/folders", server.uri()))
        .await
        .unwrap();
}

#[tokio::test]
async fn client_without_cert_verification_still_fetches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/folders"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ArchiveClient::with_options(&ClientOptions {
        accept_invalid_certs: true,
        ..ClientOptions::default()
    })
    .unwrap();
    let body = client
        .fetch_text(&format!("{}/folders", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn fetch_text_follows_redirects() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":"1"}]"#))
        .mount(&server)
        .await;

    let client = ArchiveClient::new().unwrap();
    let body = client
        .fetch_text(&format!("{}/old", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, br#"[{"id":"1"}]"#);
}

#[tokio::test]
async fn fetch_text_reports_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/folders"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = ArchiveClient::new().unwrap();
    let err = client
        .fetch_text(&format!("{}/folders", server.uri()))
        .await
        .unwrap_err();

    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn fetch_text_rejects_unparseable_url() {
    let client = ArchiveClient::new().unwrap();
    let err = client.fetch_text("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::Url { .. }));
}

#[tokio::test]
async fn fetch_text_reports_transport_failure() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = ArchiveClient::new().unwrap();
    let err = client
        .fetch_text(&format!("{uri}/folders"))
        .await
        .unwrap_err();

    assert!(err.is_transport());
}

#[tokio::test]
async fn fetch_to_file_overwrites_existing_file() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("x.jpg");
    std::fs::write(&dest, b"previous much longer content").unwrap();

    let client = ArchiveClient::new().unwrap();
    let written = client
        .fetch_to_file(&format!("{}/x.jpg", server.uri()), &dest)
        .await
        .unwrap();

    assert_eq!(written, 3);
    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
}

#[tokio::test]
async fn fetch_to_file_does_not_create_file_on_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("gone.jpg");

    let client = ArchiveClient::new().unwrap();
    let err = client
        .fetch_to_file(&format!("{}/gone.jpg", server.uri()), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { .. }));
    assert!(!dest.exists());
}

#[tokio::test]
async fn fetch_to_file_reports_missing_parent_as_io_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let dest = dir.path().join("missing").join("x.jpg");

    let client = ArchiveClient::new().unwrap();
    let err = client
        .fetch_to_file(&format!("{}/x.jpg", server.uri()), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Io(_)));
}
