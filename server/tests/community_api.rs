mod support;

use std::sync::Arc;

use server::memory::MemoryStore;
use server::players::PlayerEntry;

use support::{cookie, get, post_json, session, spawn_app, status_of};

async fn store_with_sessions() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_session("tok-a", session("user-a", "An")).await;
    store
}

fn roster() -> Vec<PlayerEntry> {
    serde_yaml::from_str(
        r#"
- name: ACCM
  country: vn
  id: 1
  twitch:
    - https://twitch.tv/theaccm
- name: TheViper
  country: "no"
  twitch:
    - https://twitch.tv/theviper
- name: Hoang
  country: vn
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn chat_post_requires_session_and_content() {
    let store = store_with_sessions().await;
    let addr = spawn_app(store, Vec::new()).await;
    let auth = cookie("tok-a");

    let response = post_json(addr, "/api/messages", &[], r#"{"content":"hello"}"#).await;
    assert_eq!(status_of(&response), 401);

    for body in [r#"{"content":""}"#, r#"{"content":"   "}"#, r#"{}"#] {
        let response =
            post_json(addr, "/api/messages", &[(auth.0, auth.1.as_str())], body).await;
        assert_eq!(status_of(&response), 400, "body {body} should be rejected");
    }

    let response = post_json(
        addr,
        "/api/messages",
        &[(auth.0, auth.1.as_str())],
        r#"{"content":"hello everyone"}"#,
    )
    .await;
    assert_eq!(status_of(&response), 200);
    assert!(response.contains(r#""id":1"#));
}

#[tokio::test]
async fn chat_listing_is_public_and_carries_sender_names() {
    let store = store_with_sessions().await;
    let addr = spawn_app(store, Vec::new()).await;
    let auth = cookie("tok-a");

    post_json(
        addr,
        "/api/messages",
        &[(auth.0, auth.1.as_str())],
        r#"{"content":"first"}"#,
    )
    .await;
    post_json(
        addr,
        "/api/messages",
        &[(auth.0, auth.1.as_str())],
        r#"{"content":"second"}"#,
    )
    .await;

    let response = get(addr, "/api/messages", &[]).await;
    assert_eq!(status_of(&response), 200);
    assert!(response.contains(r#""content":"first""#));
    assert!(response.contains(r#""content":"second""#));
    assert!(response.contains(r#""sender_name":"An""#));

    // Ascending order.
    let first = response.find(r#""content":"first""#).unwrap();
    let second = response.find(r#""content":"second""#).unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn chat_check_reports_new_messages() {
    let store = store_with_sessions().await;
    let addr = spawn_app(store, Vec::new()).await;
    let auth = cookie("tok-a");

    // No lastMessageId means the client has nothing yet.
    let response = get(addr, "/api/messages/check", &[]).await;
    assert!(response.contains(r#""hasNew":true"#));

    post_json(
        addr,
        "/api/messages",
        &[(auth.0, auth.1.as_str())],
        r#"{"content":"hello"}"#,
    )
    .await;

    let response = get(addr, "/api/messages/check?lastMessageId=1", &[]).await;
    assert!(response.contains(r#""hasNew":false"#));

    post_json(
        addr,
        "/api/messages",
        &[(auth.0, auth.1.as_str())],
        r#"{"content":"one more"}"#,
    )
    .await;

    let response = get(addr, "/api/messages/check?lastMessageId=1", &[]).await;
    assert!(response.contains(r#""hasNew":true"#));
}

#[tokio::test]
async fn roster_endpoint_filters_players() {
    let store = store_with_sessions().await;
    let addr = spawn_app(store, roster()).await;

    let response = get(addr, "/api/vietnam-players", &[]).await;
    assert_eq!(status_of(&response), 200);
    assert!(response.contains(r#""name":"ACCM""#));
    assert!(response.contains(r#""twitchChannels":["theaccm"]"#));
    assert!(!response.contains("TheViper"));
    // Hoang has no channels.
    assert!(!response.contains(r#""name":"Hoang""#));
    assert!(response.contains(r#""count":1"#));
}

#[tokio::test]
async fn live_status_requires_all_parameters() {
    let store = store_with_sessions().await;
    let addr = spawn_app(store, Vec::new()).await;

    let response = get(addr, "/api/player-live-status?playerId=1", &[]).await;
    assert_eq!(status_of(&response), 400);
}

#[tokio::test]
async fn live_status_is_cached_between_polls() {
    let store = store_with_sessions().await;
    let addr = spawn_app(store, Vec::new()).await;

    // No Twitch credentials configured: the probe reports offline without
    // calling out.
    let path = "/api/player-live-status?playerId=1&source=twitch&identifier=theaccm";
    let response = get(addr, path, &[]).await;
    assert_eq!(status_of(&response), 200);
    assert!(response.contains(r#""isLive":false"#));
    assert!(response.contains(r#""cached":false"#));

    // Within the offline TTL the second poll is served from the cache.
    let response = get(addr, path, &[]).await;
    assert!(response.contains(r#""isLive":false"#));
    assert!(response.contains(r#""cached":true"#));
}

#[tokio::test]
async fn twitch_status_resolves_shorthands_without_credentials() {
    let store = store_with_sessions().await;
    let addr = spawn_app(store, Vec::new()).await;

    let response = get(addr, "/api/twitch-status?channel=mixi", &[]).await;
    assert_eq!(status_of(&response), 200);
    assert!(response.contains(r#""channelName":"mixigaming""#));
    assert!(response.contains(r#""isLive":false"#));
    assert!(response.contains("https://twitch.tv/mixigaming"));
    assert!(response.contains(r#""success":false"#));
}
