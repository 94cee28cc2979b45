#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use server::build_router;
use server::config::Config;
use server::memory::MemoryStore;
use server::players::PlayerEntry;
use server::state::AppState;
use server::store::Session;

pub fn test_config() -> Config {
    Config {
        port: 0,
        redis_url: "redis://127.0.0.1:6379".to_string(),
        sepay_secret: "test-secret".to_string(),
        bank_id: "970422".to_string(),
        account_no: "0123456789".to_string(),
        donation_prefix: "shuneo".to_string(),
        players_path: "players.yaml".to_string(),
        twitch_client_id: None,
        twitch_secret: None,
        youtube_api_key: None,
        upstream_timeout_ms: 1000,
    }
}

pub fn session(user_id: &str, name: &str) -> Session {
    Session {
        user_id: user_id.to_string(),
        name: name.to_string(),
        role: "user".to_string(),
    }
}

/// Serve the real router over an ephemeral port, backed by the given store.
pub async fn spawn_app(store: Arc<MemoryStore>, players: Vec<PlayerEntry>) -> SocketAddr {
    let state = AppState::with_store(test_config(), store, players);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });

    addr
}

async fn send(addr: SocketAddr, request: String) -> String {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    response
}

pub async fn get(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> String {
    let mut extra = String::new();
    for (name, value) in headers {
        extra.push_str(&format!("{name}: {value}\r\n"));
    }
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n{extra}\r\n"
    );
    send(addr, request).await
}

pub async fn post_json(
    addr: SocketAddr,
    path: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> String {
    let mut extra = String::new();
    for (name, value) in headers {
        extra.push_str(&format!("{name}: {value}\r\n"));
    }
    let request = format!(
        "POST {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n{extra}\r\n{body}",
        body.len()
    );
    send(addr, request).await
}

pub fn status_of(response: &str) -> u16 {
    response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status line")
}

pub fn cookie(token: &str) -> (&'static str, String) {
    ("Cookie", format!("session_token={token}"))
}

pub fn sepay_payload(content: &str, amount: i64) -> String {
    format!(
        r#"{{"gateway":"MBBank","transactionDate":"2026-01-05 13:37:00","accountNumber":"0123456789","subAccount":null,"transferType":"in","transferAmount":{amount},"accumulated":{amount},"content":"{content}","referenceCode":"FT26005123456","description":"BankAPINotify"}}"#
    )
}
