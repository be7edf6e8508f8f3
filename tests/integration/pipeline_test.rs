//! End-to-end pipeline tests against a scripted transport.
//!
//! These cover the full execute path: variable resolution, credentials,
//! assembly, transport hand-off and classification.

use super::{init_test_env, MockTransport};
use rest_pipeline::auth::{AuthError, DefaultAuthProvider};
use rest_pipeline::cache::{generate_collection_cache_key, CredentialsCache};
use rest_pipeline::config::PipelineConfig;
use rest_pipeline::environment::{Environment, Variable};
use rest_pipeline::models::{
    AuthConfig, AuthPlacement, ClientAuth, FormEncoding, FormField, HttpMethod, MultipartPart,
    OrderedMap, Param, RawResponse, RequestBody, RequestDefinition, TextLanguage,
};
use rest_pipeline::transport::{ErrorKind, TransportError};
use rest_pipeline::{CollectionContext, ExecutionContext, PipelineError, RequestPipeline};
use std::sync::Arc;

fn pipeline_with(transport: Arc<MockTransport>, config: PipelineConfig) -> RequestPipeline {
    init_test_env();
    let auth = DefaultAuthProvider::new(transport.clone());
    RequestPipeline::new(
        transport,
        Arc::new(auth),
        Arc::new(CredentialsCache::new()),
        config,
    )
}

fn pipeline(transport: Arc<MockTransport>) -> RequestPipeline {
    pipeline_with(transport, PipelineConfig::default())
}

fn dev_environment() -> Environment {
    Environment::new("dev")
        .with_variable(Variable::new("baseUrl", "https://api.example.com"))
        .with_variable(Variable::new("apiKey", "k-123"))
        .with_variable(Variable::new("user", "alice"))
        .with_variable(Variable::new("clientId", "cid"))
        .with_variable(Variable::new("clientSecret", "csecret"))
}

fn client_credentials() -> AuthConfig {
    AuthConfig::Oauth2 {
        grant_type: "client_credentials".to_string(),
        auth_url: None,
        token_url: Some("{{baseUrl}}/oauth/token".to_string()),
        client_id: Some("{{clientId}}".to_string()),
        client_secret: Some("{{clientSecret}}".to_string()),
        scope: Some("read write".to_string()),
        refresh_token: None,
        token_caching: None,
        client_auth: Some(ClientAuth::Basic),
        token_extra_params: None,
    }
}

const TOKEN: &str = r#"{"access_token":"tok-1","token_type":"Bearer","expires_in":3600}"#;

#[tokio::test]
async fn test_form_request_with_api_key_in_query() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_json(201, r#"{"created":true}"#);
    let pipeline = pipeline(transport.clone());

    let mut fields = OrderedMap::new();
    fields.insert("f1", FormField::text("name", "{{user}}"));
    fields.insert("f2", FormField::text("note", "a b&c"));

    let mut request = RequestDefinition::new("r1", HttpMethod::POST, "{{baseUrl}}/users?page=1");
    request.body = RequestBody::Form {
        encoding: FormEncoding::Url,
        fields,
    };
    request.authentication = AuthConfig::ApiKey {
        key: Some("api_key".to_string()),
        value: Some("{{apiKey}}".to_string()),
        placement: Some(AuthPlacement::Query { name: None }),
    };

    let context = ExecutionContext {
        environment: Some(dev_environment()),
        ..Default::default()
    };
    let response = pipeline.execute(&request, &context).await.unwrap();
    assert_eq!(response.status, 201);
    assert!(response.is_success());

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, HttpMethod::POST);
    assert_eq!(sent[0].url, "https://api.example.com/users?page=1&api_key=k-123");
    assert_eq!(
        sent[0].header("Content-Type"),
        Some("application/x-www-form-urlencoded")
    );
    let body = String::from_utf8(sent[0].body.clone().unwrap()).unwrap();
    assert_eq!(body, "name=alice&note=a+b%26c");
}

#[tokio::test]
async fn test_collection_token_is_shared_between_requests() {
    let transport = Arc::new(MockTransport::new());
    transport
        .respond_json(200, TOKEN)
        .respond_json(200, "[]")
        .respond_json(200, "[]");
    let pipeline = pipeline(transport.clone());

    let context = ExecutionContext {
        environment: Some(dev_environment()),
        collection: Some(CollectionContext {
            id: "col-1".to_string(),
            authentication: client_credentials(),
        }),
        ..Default::default()
    };

    let mut first = RequestDefinition::new("r1", HttpMethod::GET, "{{baseUrl}}/a");
    first.authentication = AuthConfig::Inherit;
    let mut second = RequestDefinition::new("r2", HttpMethod::GET, "{{baseUrl}}/b");
    second.authentication = AuthConfig::Inherit;

    pipeline.execute(&first, &context).await.unwrap();
    pipeline.execute(&second, &context).await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 3);

    let token_request = &sent[0];
    assert_eq!(token_request.url, "https://api.example.com/oauth/token");
    assert_eq!(token_request.header("Authorization"), Some("Basic Y2lkOmNzZWNyZXQ="));
    let token_body = String::from_utf8(token_request.body.clone().unwrap()).unwrap();
    assert!(token_body.contains("grant_type=client_credentials"));
    assert!(token_body.contains("scope=read+write"));
    assert!(!token_body.contains("client_secret"));

    assert_eq!(sent[1].header("Authorization"), Some("Bearer tok-1"));
    assert_eq!(sent[2].header("Authorization"), Some("Bearer tok-1"));

    let cached = pipeline
        .cache()
        .get(&generate_collection_cache_key("col-1"))
        .unwrap()
        .unwrap();
    assert!(cached.expires_at.is_some());
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_json(404, r#"{"error":"missing"}"#);
    let pipeline = pipeline(transport);

    let request = RequestDefinition::new("r1", HttpMethod::DELETE, "https://api.example.com/x");
    let response = pipeline
        .execute(&request, &ExecutionContext::default())
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
    assert_eq!(response.text.as_deref(), Some(r#"{"error":"missing"}"#));
}

#[tokio::test]
async fn test_token_endpoint_error_fails_before_request() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_json(
        400,
        r#"{"error":"invalid_client","error_description":"bad secret"}"#,
    );
    let pipeline = pipeline(transport.clone());

    let mut request = RequestDefinition::new("r1", HttpMethod::GET, "{{baseUrl}}/me");
    request.authentication = client_credentials();
    let context = ExecutionContext {
        environment: Some(dev_environment()),
        ..Default::default()
    };

    let err = pipeline.execute(&request, &context).await.unwrap_err();
    match err {
        PipelineError::Auth(AuthError::TokenEndpoint { error, description }) => {
            assert_eq!(error, "invalid_client");
            assert_eq!(description, "bad secret");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(transport.sent().len(), 1, "only the token request was sent");
    assert!(pipeline.cache().is_empty());
}

#[tokio::test]
async fn test_binary_response_gets_preview() {
    let transport = Arc::new(MockTransport::new());
    let png = RawResponse::new("", 200, "OK").with_body("image/png", vec![0x89, b'P', b'N', b'G']);
    transport.respond(Ok(png));
    let pipeline = pipeline(transport);

    let request = RequestDefinition::new("r1", HttpMethod::GET, "https://cdn.example.com/logo.png");
    let response = pipeline
        .execute(&request, &ExecutionContext::default())
        .await
        .unwrap();
    assert!(response.is_binary);
    assert_eq!(response.text, None);
    assert_eq!(response.preview_base64.as_deref(), Some("iVBORw=="));
    assert_eq!(response.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_binary_response_over_threshold_has_no_preview() {
    let transport = Arc::new(MockTransport::new());
    let mut large = RawResponse::new("", 200, "OK").with_body("application/octet-stream", vec![0u8; 64]);
    large.file_path = Some("/tmp/rest-pipeline-spill".to_string());
    transport.respond(Ok(large));
    let config = PipelineConfig {
        preview_max_bytes: 16,
        ..Default::default()
    };
    let pipeline = pipeline_with(transport.clone(), config);

    let request = RequestDefinition::new("r1", HttpMethod::GET, "https://cdn.example.com/blob");
    let response = pipeline
        .execute(&request, &ExecutionContext::default())
        .await
        .unwrap();
    assert_eq!(response.preview_base64, None);
    assert_eq!(response.file_path.as_deref(), Some("/tmp/rest-pipeline-spill"));
    assert_eq!(transport.sent()[0].preview_max_bytes, 16);
}

#[tokio::test]
async fn test_multipart_body_with_bearer_body_placement() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_json(200, "{}");
    let pipeline = pipeline(transport.clone());

    let mut fields = OrderedMap::new();
    fields.insert("f1", FormField::text("title", "report"));
    fields.insert(
        "f2",
        FormField::file("upload", Some("/data/report.pdf".to_string())),
    );

    let mut request = RequestDefinition::new("r1", HttpMethod::POST, "https://api.example.com/upload");
    request.body = RequestBody::Form {
        encoding: FormEncoding::Multipart,
        fields,
    };
    request.authentication = AuthConfig::Bearer {
        token: Some("t0k".to_string()),
        scheme: None,
        placement: Some(AuthPlacement::Body { field_name: None }),
    };

    pipeline
        .execute(&request, &ExecutionContext::default())
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].body, None);
    let parts = sent[0].multipart_parts.clone().unwrap();
    assert_eq!(parts.len(), 3);
    assert_eq!(
        parts[0],
        MultipartPart::Text {
            name: "title".to_string(),
            value: "report".to_string()
        }
    );
    assert!(matches!(&parts[1], MultipartPart::File { name, file_path, .. }
        if name == "upload" && file_path == "/data/report.pdf"));
    assert_eq!(
        parts[2],
        MultipartPart::Text {
            name: "access_token".to_string(),
            value: "t0k".to_string()
        }
    );
    assert!(sent[0].header("Authorization").is_none());
}

#[tokio::test]
async fn test_auth_body_on_text_request_is_rejected() {
    let transport = Arc::new(MockTransport::new());
    let pipeline = pipeline(transport.clone());

    let mut request = RequestDefinition::new("r1", HttpMethod::POST, "https://api.example.com/");
    request.body = RequestBody::Text {
        content: "{}".to_string(),
        language: TextLanguage::Json,
    };
    request.authentication = AuthConfig::ApiKey {
        key: Some("key".to_string()),
        value: Some("v".to_string()),
        placement: Some(AuthPlacement::Body { field_name: None }),
    };

    let err = pipeline
        .execute(&request, &ExecutionContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Assemble(_)));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn test_disabled_params_are_skipped() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_json(200, "{}");
    let pipeline = pipeline(transport.clone());

    let mut request = RequestDefinition::new("r1", HttpMethod::GET, "https://api.example.com/search");
    request.query_params.insert("q1", Param::new("q", "rust"));
    request.query_params.insert("q2", Param::new("debug", "1").disabled());
    request.headers.insert("h1", Param::new("X-Off", "1").disabled());
    request.cookie_params.insert("c1", Param::new("session", "abc"));

    pipeline
        .execute(&request, &ExecutionContext::default())
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].url, "https://api.example.com/search?q=rust");
    assert!(sent[0].header("X-Off").is_none());
    assert_eq!(sent[0].header("Cookie"), Some("session=abc"));
}

#[tokio::test]
async fn test_request_options_override_config() {
    let transport = Arc::new(MockTransport::new());
    transport.respond_json(200, "{}");
    let config = PipelineConfig {
        follow_redirects: false,
        ..Default::default()
    };
    let pipeline = pipeline_with(transport.clone(), config);

    let mut request = RequestDefinition::new("r1", HttpMethod::GET, "https://api.example.com/");
    request.options.timeout_secs = Some(5);

    pipeline
        .execute(&request, &ExecutionContext::default())
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].options.timeout_secs, Some(5));
    assert_eq!(sent[0].options.max_redirects, Some(0));
    assert_eq!(sent[0].options.disable_ssl, Some(false));
}

#[tokio::test]
async fn test_transport_failure_is_not_wrapped() {
    let transport = Arc::new(MockTransport::new());
    transport.respond(Err(TransportError::new(
        ErrorKind::ConnectionRefused,
        "Connection refused",
    )));
    let pipeline = pipeline(transport);

    let request = RequestDefinition::new("r1", HttpMethod::GET, "http://localhost:1/");
    let err = pipeline
        .execute(&request, &ExecutionContext::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "[connectionRefused] Connection refused");
}
