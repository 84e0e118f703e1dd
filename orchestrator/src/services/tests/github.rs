//! Tests for the GitHub publisher

use serde_json::json;
use shared::BotError;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::services::github::RealGithubPublisher;
use crate::traits::Publisher;

const CONTENTS_PATH: &str = "/repos/acme/site/contents/blog/plazos.html";

fn publisher_for(server: &MockServer, token: Option<&str>) -> RealGithubPublisher {
    RealGithubPublisher::with_base_url(token.map(str::to_string), server.uri()).unwrap()
}

#[tokio::test]
async fn test_creates_new_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(header("authorization", "token gh-test"))
        .and(header("accept", "application/vnd.github.v3+json"))
        .and(body_partial_json(json!({
            "message": "Publish blog: Plazos",
            "content": "PGgxPkhvbGE8L2gxPg==",
            "branch": "main"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"content": {}})))
        .expect(1)
        .mount(&server)
        .await;

    publisher_for(&server, Some("gh-test"))
        .publish("acme/site", "blog/plazos.html", "<h1>Hola</h1>", "Publish blog: Plazos")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_updates_existing_file_with_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sha": "abc123"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .and(body_partial_json(json!({"sha": "abc123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": {}})))
        .expect(1)
        .mount(&server)
        .await;

    publisher_for(&server, Some("gh-test"))
        .publish("acme/site", "blog/plazos.html", "x", "update")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_missing_token_is_a_publish_error() {
    let server = MockServer::start().await;

    let err = publisher_for(&server, None)
        .publish("acme/site", "blog/plazos.html", "x", "msg")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BotError::Publish {
            message: "GITHUB_TOKEN not configured".to_string()
        }
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_put_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_string("sha mismatch"))
        .mount(&server)
        .await;

    let err = publisher_for(&server, Some("gh-test"))
        .publish("acme/site", "blog/plazos.html", "x", "msg")
        .await
        .unwrap_err();

    match err {
        BotError::Publish { message } => assert!(message.contains("HTTP 422"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_decodes_wrapped_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/site/contents/blog/index.json"))
        .and(header("authorization", "token gh-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sha": "abc123",
            "encoding": "base64",
            "content": "eyJhcnRpY2xlcyI6\nIFtdfQ==\n"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = publisher_for(&server, Some("gh-test"))
        .fetch("acme/site", "blog/index.json")
        .await
        .unwrap();

    assert_eq!(text.as_deref(), Some(r#"{"articles": []}"#));
}

#[tokio::test]
async fn test_fetch_missing_file_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/site/contents/update_state.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let text = publisher_for(&server, Some("gh-test"))
        .fetch("acme/site", "update_state.json")
        .await
        .unwrap();

    assert_eq!(text, None);
}

#[tokio::test]
async fn test_fetch_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = publisher_for(&server, Some("gh-test"))
        .fetch("acme/site", "index.html")
        .await
        .unwrap_err();

    assert!(matches!(err, BotError::Publish { ref message } if message.contains("HTTP 500")));
}
