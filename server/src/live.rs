//! Live-streamer status lookups against Twitch and YouTube, with an
//! in-process cache so the dashboard's refresh loop does not hammer the
//! platform APIs. TTL depends on the last observed state: an offline channel
//! is re-checked after 5 minutes, a live one only after 30.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::config::Config;

pub const OFFLINE_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const ONLINE_CHECK_INTERVAL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Default)]
pub struct LiveCheck {
    pub is_live: bool,
    pub data: Option<Value>,
}

#[derive(Clone)]
pub struct CacheEntry {
    pub is_live: bool,
    pub data: Option<Value>,
    pub checked_at: Instant,
    pub checked_wall: DateTime<Utc>,
}

/// Process-scoped status cache, owned by the application state so deployments
/// can swap it out without touching call sites.
pub struct StatusCache {
    offline_ttl: Duration,
    live_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl StatusCache {
    pub fn new(offline_ttl: Duration, live_ttl: Duration) -> Self {
        Self {
            offline_ttl,
            live_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn ttl_for(&self, is_live: bool) -> Duration {
        if is_live { self.live_ttl } else { self.offline_ttl }
    }

    /// Entry for `key` if it is still within its TTL.
    pub fn fresh(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.lock().expect("status cache poisoned");
        entries
            .get(key)
            .filter(|entry| entry.checked_at.elapsed() < self.ttl_for(entry.is_live))
            .cloned()
    }

    pub fn store(&self, key: String, check: &LiveCheck, wall: DateTime<Utc>) {
        let mut entries = self.entries.lock().expect("status cache poisoned");
        entries.insert(
            key,
            CacheEntry {
                is_live: check.is_live,
                data: check.data.clone(),
                checked_at: Instant::now(),
                checked_wall: wall,
            },
        );
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamInfo {
    pub game_name: String,
    pub viewer_count: u64,
    pub title: String,
    pub user_name: String,
    pub started_at: String,
}

#[derive(Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    data: Vec<StreamInfo>,
}

#[derive(Deserialize)]
struct YoutubeSearchResponse {
    #[serde(default)]
    items: Vec<YoutubeSearchItem>,
}

#[derive(Deserialize)]
struct YoutubeSearchItem {
    snippet: Option<YoutubeSnippet>,
}

#[derive(Deserialize)]
struct YoutubeSnippet {
    title: Option<String>,
}

/// Community shorthands for channel names.
pub fn resolve_channel(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "mixi" => "mixigaming".to_string(),
        "baset" => "baset_cs".to_string(),
        "pt" => "phantom0811".to_string(),
        "accm" | "aoe2de" => "theaccm".to_string(),
        _ => name.to_string(),
    }
}

pub async fn twitch_access_token(
    http: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
) -> anyhow::Result<String> {
    let response = http
        .post("https://id.twitch.tv/oauth2/token")
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("grant_type", "client_credentials"),
        ])
        .send()
        .await?
        .error_for_status()?;

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}

pub async fn check_twitch_live(
    http: &reqwest::Client,
    client_id: &str,
    token: &str,
    channel: &str,
) -> anyhow::Result<Option<StreamInfo>> {
    let response = http
        .get("https://api.twitch.tv/helix/streams")
        .query(&[("user_login", channel)])
        .header("Client-ID", client_id)
        .bearer_auth(token)
        .send()
        .await?
        .error_for_status()?;

    let streams: StreamsResponse = response.json().await?;
    Ok(streams.data.into_iter().next())
}

pub async fn check_youtube_live(
    http: &reqwest::Client,
    api_key: &str,
    channel_id: &str,
) -> anyhow::Result<LiveCheck> {
    let response = http
        .get("https://www.googleapis.com/youtube/v3/search")
        .query(&[
            ("part", "snippet"),
            ("channelId", channel_id),
            ("type", "video"),
            ("eventType", "live"),
            ("key", api_key),
        ])
        .send()
        .await?
        .error_for_status()?;

    let results: YoutubeSearchResponse = response.json().await?;
    match results.items.into_iter().next() {
        Some(item) => {
            let title = item.snippet.and_then(|snippet| snippet.title);
            Ok(LiveCheck {
                is_live: true,
                data: Some(json!({
                    "isLive": true,
                    "title": title,
                    "channelId": channel_id,
                })),
            })
        }
        None => Ok(LiveCheck::default()),
    }
}

/// One status probe. Missing credentials, upstream errors and timeouts all
/// degrade to "not live" so the dashboard never breaks on platform hiccups.
pub async fn probe(http: &reqwest::Client, config: &Config, source: &str, identifier: &str) -> LiveCheck {
    match source {
        "twitch" => {
            let (Some(client_id), Some(client_secret)) =
                (&config.twitch_client_id, &config.twitch_secret)
            else {
                warn!("Twitch credentials not configured, reporting {identifier} offline");
                return LiveCheck::default();
            };

            let lookup = async {
                let token = twitch_access_token(http, client_id, client_secret).await?;
                check_twitch_live(http, client_id, &token, identifier).await
            };
            match lookup.await {
                Ok(Some(info)) => LiveCheck {
                    is_live: true,
                    data: serde_json::to_value(&info).ok(),
                },
                Ok(None) => LiveCheck::default(),
                Err(err) => {
                    warn!("Twitch lookup for {identifier} failed: {err}");
                    LiveCheck::default()
                }
            }
        }
        "youtube" => {
            let Some(api_key) = &config.youtube_api_key else {
                warn!("YouTube API key not configured, reporting {identifier} offline");
                return LiveCheck::default();
            };
            match check_youtube_live(http, api_key, identifier).await {
                Ok(check) => check,
                Err(err) => {
                    warn!("YouTube lookup for {identifier} failed: {err}");
                    LiveCheck::default()
                }
            }
        }
        other => {
            warn!("Unknown live-status source: {other}");
            LiveCheck::default()
        }
    }
}
