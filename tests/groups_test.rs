//! Integration tests for the groups embed against a mock forum.

use std::collections::HashMap;
use std::sync::Arc;

use discourse_embeds::cache::MemorySnapshot;
use discourse_embeds::hooks::GroupPoint;
use discourse_embeds::{Config, GroupArgs, Hooks, Renderer};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn groups_body() -> serde_json::Value {
    json!({
        "groups": [
            {
                "name": "admins",
                "full_name": null,
                "user_count": 2,
                "automatic": true,
                "allow_membership_requests": false
            },
            {
                "name": "dev-team",
                "full_name": null,
                "user_count": 3,
                "flair_url": "/uploads/flair.png",
                "automatic": false,
                "allow_membership_requests": true,
                "bio_raw": "We build things."
            },
            {
                "name": "ops",
                "full_name": "Operations",
                "user_count": 1,
                "automatic": false,
                "allow_membership_requests": false,
                "bio_raw": "Keeping the lights on."
            }
        ]
    })
}

async fn mount_groups(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/groups.json"))
        .and(header("api-key", "test-key"))
        .and(header("api-username", "system"))
        .respond_with(ResponseTemplate::new(200).set_body_json(groups_body()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn renderer(server: &MockServer, hooks: Hooks) -> Renderer {
    let config = Config::for_forum(&server.uri());
    Renderer::with_snapshot(&config, hooks, Arc::new(MemorySnapshot::new())).expect("renderer")
}

fn attrs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[tokio::test]
async fn test_allow_listed_group_card() {
    let server = MockServer::start().await;
    mount_groups(&server, 1).await;

    let html = renderer(&server, Hooks::new())
        .render_groups_placeholder(&attrs(&[("group_list", "dev-team")]))
        .await;

    assert!(html.contains(r#"<div class="wpds-groups wpds-tile-wrapper">"#));
    assert!(html.contains(&format!(
        r#"<a class="wpds-group-title-link" href="{}/groups/dev-team">dev team</a>"#,
        server.uri()
    )));
    assert!(html.contains(r#"<span class="wpds-member-number">3 members</span>"#));
    assert!(html.contains(r#"<div class="wpds-group-description">We build things.</div>"#));
    assert!(html.contains(&format!(
        r#"<a class="wpds-join-group wpds-button" href="{}/groups/dev-team">Join the dev team</a>"#,
        server.uri()
    )));
    assert!(!html.contains("Operations"));
    assert!(!html.contains("admins"));
}

#[tokio::test]
async fn test_automatic_groups_are_never_rendered() {
    let server = MockServer::start().await;
    mount_groups(&server, 1).await;

    let html = renderer(&server, Hooks::new()).render_groups(&GroupArgs::default()).await;

    assert_eq!(html.matches(r#"<div class="wpds-group">"#).count(), 2);
    assert!(html.contains("Operations"));
    assert!(!html.contains("/groups/admins"));
    // ops does not accept membership requests
    assert!(!html.contains("Join the Operations"));
}

#[tokio::test]
async fn test_sso_links() {
    let server = MockServer::start().await;
    mount_groups(&server, 1).await;

    let args = GroupArgs {
        sso: true,
        group_list: "dev-team".to_string(),
        ..GroupArgs::default()
    };
    let html = renderer(&server, Hooks::new()).render_groups(&args).await;

    assert!(html.contains(&format!(
        "{}/session/sso?return_path=%2Fgroups%2Fdev-team",
        server.uri()
    )));
}

#[tokio::test]
async fn test_repeated_render_is_cached_and_identical() {
    let server = MockServer::start().await;
    mount_groups(&server, 1).await;

    let renderer = renderer(&server, Hooks::new());
    let args = GroupArgs::default();
    let first = renderer.render_groups(&args).await;
    let second = renderer.render_groups(&args).await;

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_clear_cache_refetches() {
    let server = MockServer::start().await;
    mount_groups(&server, 2).await;

    let renderer = renderer(&server, Hooks::new());
    let args = GroupArgs::default();
    let first = renderer.render_groups(&args).await;
    renderer.clear_cache().await;
    let second = renderer.render_groups(&args).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_no_matching_group_renders_empty() {
    let server = MockServer::start().await;
    mount_groups(&server, 1).await;

    let html = renderer(&server, Hooks::new())
        .render_groups_placeholder(&attrs(&[("group_list", "nobody")]))
        .await;
    assert_eq!(html, "");
}

#[tokio::test]
async fn test_server_error_renders_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/groups.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let html = renderer(&server, Hooks::new()).render_groups(&GroupArgs::default()).await;
    assert_eq!(html, "");
}

#[tokio::test]
async fn test_unconfigured_forum_renders_empty() {
    let renderer = Renderer::new(&Config::default(), Hooks::new()).expect("renderer");
    assert_eq!(renderer.render_groups(&GroupArgs::default()).await, "");
}

#[tokio::test]
async fn test_hooks_receive_each_group() {
    let server = MockServer::start().await;
    mount_groups(&server, 1).await;

    let mut hooks = Hooks::new();
    hooks
        .on_group(GroupPoint::AboveFooter, |markup, group, _| {
            format!("{markup}<p class=\"slug\">{}</p>", group.name)
        })
        .on_formatted_groups(|markup, groups, _| {
            format!("<section class=\"count-{}\">{markup}</section>", groups.len())
        });
    let html = renderer(&server, hooks).render_groups(&GroupArgs::default()).await;

    assert!(html.starts_with(r#"<section class="count-2">"#));
    assert!(html.contains(r#"<p class="slug">dev-team</p>"#));
    assert!(html.contains(r#"<p class="slug">ops</p>"#));
}

#[tokio::test]
async fn test_snapshot_file_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let snapshot_path = temp_dir.path().join("groups.json");

    let server = MockServer::start().await;
    mount_groups(&server, 1).await;

    let config = Config {
        group_snapshot_path: Some(snapshot_path.clone()),
        ..Config::for_forum(&server.uri())
    };

    let first = Renderer::new(&config, Hooks::new())
        .expect("renderer")
        .render_groups(&GroupArgs::default())
        .await;
    assert!(snapshot_path.exists());

    // A fresh renderer has empty in-memory caches but reads the snapshot
    let second = Renderer::new(&config, Hooks::new())
        .expect("renderer")
        .render_groups(&GroupArgs::default())
        .await;

    assert_eq!(first, second);
}
