use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub sepay_secret: String,
    pub bank_id: String,
    pub account_no: String,
    pub donation_prefix: String,
    pub players_path: String,
    pub twitch_client_id: Option<String>,
    pub twitch_secret: Option<String>,
    pub youtube_api_key: Option<String>,
    pub upstream_timeout_ms: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            redis_url: try_load("REDIS_URL", "redis://127.0.0.1:6379"),
            sepay_secret: read_secret("SEPAY_SECRET_KEY"),
            bank_id: try_load("BANK_ID", "970422"),
            account_no: read_secret("BANK_ACCOUNT_NO"),
            donation_prefix: try_load("DONATION_PREFIX", "shuneo"),
            players_path: try_load("PLAYERS_PATH", "players.yaml"),
            twitch_client_id: load_optional("TWITCH_CLIENT_ID"),
            twitch_secret: load_optional("TWITCH_SECRET_KEY"),
            youtube_api_key: load_optional("YOUTUBE_API_KEY"),
            upstream_timeout_ms: try_load("UPSTREAM_TIMEOUT_MS", "4000"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn load_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .expect("Secrets misconfigured!")
}
