use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tracing::warn;

use crate::config::Config;
use crate::database::{RedisStore, init_redis};
use crate::donation::code_pattern;
use crate::live::{OFFLINE_CHECK_INTERVAL, ONLINE_CHECK_INTERVAL, StatusCache};
use crate::players::{PlayerEntry, load_players};
use crate::store::Store;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub http: reqwest::Client,
    pub live_cache: StatusCache,
    pub players: Vec<PlayerEntry>,
    pub code_pattern: Regex,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let connection = init_redis(&config.redis_url).await;
        let store = Arc::new(RedisStore::new(connection));

        let players = load_players(&config.players_path).unwrap_or_else(|err| {
            warn!("Failed to load player roster: {err}");
            Vec::new()
        });

        Self::with_store(config, store, players)
    }

    /// Assemble state around any store; tests inject the in-memory one.
    pub fn with_store(
        config: Config,
        store: Arc<dyn Store>,
        players: Vec<PlayerEntry>,
    ) -> Arc<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.upstream_timeout_ms))
            .build()
            .expect("failed to build http client");

        let code_pattern = code_pattern(&config.donation_prefix);

        Arc::new(Self {
            config,
            store,
            http,
            live_cache: StatusCache::new(OFFLINE_CHECK_INTERVAL, ONLINE_CHECK_INTERVAL),
            players,
            code_pattern,
        })
    }
}
