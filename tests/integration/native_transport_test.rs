//! Tests for the reqwest transport against a local mock server.

use rest_pipeline::models::{HttpMethod, MultipartPart, RequestOptions};
use rest_pipeline::transport::{ErrorKind, ReqwestTransport, Transport, TransportRequest};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(id: &str, method: HttpMethod, url: String) -> TransportRequest {
    TransportRequest {
        request_id: id.to_string(),
        url,
        method,
        headers: Vec::new(),
        body: None,
        body_file_path: None,
        multipart_parts: None,
        options: RequestOptions::default(),
        preview_max_bytes: 1024 * 1024,
    }
}

#[tokio::test]
async fn test_status_headers_and_body() {
    super::init_test_env();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("x-trace", "abc"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("content-type", "application/json")
                .set_body_string(r#"{"id":7}"#),
        )
        .mount(&server)
        .await;

    let mut req = request("t1", HttpMethod::POST, format!("{}/echo", server.uri()));
    req.headers.push(("X-Trace".to_string(), "abc".to_string()));
    req.body = Some(b"{}".to_vec());

    let transport = ReqwestTransport::new();
    let response = transport.send(req).await.unwrap();
    assert_eq!(response.request_id, "t1");
    assert_eq!(response.status, 201);
    assert_eq!(response.status_text, "Created");
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(response.body, br#"{"id":7}"#.to_vec());
    assert_eq!(response.size, 8);
    assert_eq!(response.file_path, None);
    assert_eq!(transport.active_count(), 0);
}

#[tokio::test]
async fn test_set_cookie_headers_are_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "sid=abc; Path=/; HttpOnly")
                .append_header("set-cookie", "theme=dark; Max-Age=60"),
        )
        .mount(&server)
        .await;

    let response = ReqwestTransport::new()
        .send(request("t2", HttpMethod::GET, server.uri()))
        .await
        .unwrap();
    assert_eq!(response.cookies.len(), 2);
    assert_eq!(response.cookies[0].name, "sid");
    assert_eq!(response.cookies[0].http_only, Some(true));
    assert_eq!(response.cookies[1].max_age, Some(60));
}

#[tokio::test]
async fn test_large_body_is_spilled_to_file() {
    let server = MockServer::start().await;
    let payload = vec![b'x'; 4096];
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/octet-stream")
                .set_body_bytes(payload.clone()),
        )
        .mount(&server)
        .await;

    let mut req = request("t3", HttpMethod::GET, server.uri());
    req.preview_max_bytes = 1000;
    let response = ReqwestTransport::new().send(req).await.unwrap();

    assert!(response.body.is_empty());
    assert_eq!(response.size, 4096);
    let path = response.file_path.expect("body should be on disk");
    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, payload);
    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn test_redirects_disabled_returns_redirect() {
    let server = MockServer::start().await;
    Mock::given(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
        .mount(&server)
        .await;
    Mock::given(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut req = request("t4", HttpMethod::GET, format!("{}/old", server.uri()));
    req.options.max_redirects = Some(0);
    let response = ReqwestTransport::new().send(req).await.unwrap();
    assert_eq!(response.status, 302);
    assert_eq!(response.header("Location"), Some("/new"));

    let followed = ReqwestTransport::new()
        .send(request("t5", HttpMethod::GET, format!("{}/old", server.uri())))
        .await
        .unwrap();
    assert_eq!(followed.status, 200);
}

#[tokio::test]
async fn test_timeout_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut req = request("t6", HttpMethod::GET, server.uri());
    req.options.timeout_secs = Some(1);
    let err = ReqwestTransport::new().send(req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
}

#[tokio::test]
async fn test_cancel_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let sender = transport.clone();
    let url = server.uri();
    let task = tokio::spawn(async move { sender.send(request("t7", HttpMethod::GET, url)).await });

    for _ in 0..100 {
        if transport.active_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    transport.cancel("t7").await.unwrap();

    let err = task.await.unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
    assert_eq!(transport.active_count(), 0);
    assert!(transport.cancel("t7").await.is_err());
}

#[tokio::test]
async fn test_connection_refused() {
    let mut req = request("t8", HttpMethod::GET, "http://127.0.0.1:9/".to_string());
    req.options.timeout_secs = Some(5);
    let err = ReqwestTransport::new().send(req).await.unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::ConnectionRefused | ErrorKind::Connection
    ));
}

#[tokio::test]
async fn test_multipart_upload_reads_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("hello.txt");
    std::fs::write(&file, "hello world").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("filename=\"hello.txt\""))
        .and(body_string_contains("hello world"))
        .and(body_string_contains("name=\"title\""))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = request("t9", HttpMethod::POST, server.uri());
    req.multipart_parts = Some(vec![
        MultipartPart::Text {
            name: "title".to_string(),
            value: "greeting".to_string(),
        },
        MultipartPart::File {
            name: "upload".to_string(),
            file_path: file.to_string_lossy().into_owned(),
            file_name: None,
            content_type: Some("text/plain".to_string()),
        },
    ]);

    let response = ReqwestTransport::new().send(req).await.unwrap();
    assert_eq!(response.status, 204);
}

#[tokio::test]
async fn test_missing_body_file_is_io_error() {
    let mut req = request("t10", HttpMethod::PUT, "http://127.0.0.1:9/".to_string());
    req.body_file_path = Some("/nonexistent/rest-pipeline/body.bin".to_string());
    let err = ReqwestTransport::new().send(req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
}
