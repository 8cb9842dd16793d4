//! Integration tests for the forum API client.

use discourse_embeds::forum::ForumClient;
use discourse_embeds::{Config, EmbedError};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> ForumClient {
    ForumClient::new(&Config::for_forum(&server.uri())).expect("client")
}

#[tokio::test]
async fn test_fetch_groups_sends_credentials_and_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groups.json"))
        .and(header("api-key", "test-key"))
        .and(header("api-username", "system"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [
                { "name": "staff", "automatic": true },
                { "name": "writers", "automatic": false }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let groups = client(&server).fetch_groups().await.expect("groups");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "writers");
}

#[tokio::test]
async fn test_server_error_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(500)))
        .mount(&server)
        .await;

    let err = client(&server).fetch_topics("/latest.json").await.unwrap_err();
    match err {
        EmbedError::Network { url, message } => {
            assert!(url.ends_with("/latest.json"));
            assert!(message.contains("500"));
            assert!(message.len() < 300);
        }
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client(&server).fetch_topics("/latest.json").await.unwrap_err();
    assert!(matches!(err, EmbedError::Parse { .. }));
}

#[tokio::test]
async fn test_unreachable_forum_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = ForumClient::new(&Config::for_forum(&uri)).expect("client");
    let err = client.fetch_groups().await.unwrap_err();
    assert!(matches!(err, EmbedError::Network { .. }));
}

#[tokio::test]
async fn test_missing_api_key_is_configuration_error() {
    let config = Config {
        api_key: None,
        ..Config::for_forum("https://forum.example.com")
    };
    let client = ForumClient::new(&config).expect("client");
    let err = client.fetch_groups().await.unwrap_err();
    assert!(matches!(err, EmbedError::Configuration(_)));
}
