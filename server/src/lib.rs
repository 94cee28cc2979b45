//! Community platform backend.
//!
//! One axum process serves the whole fan site API: the group chat, the
//! live-streamer dashboard, the player roster, and the bank-transfer donation
//! flow.
//!
//! # General Infrastructure
//! - Frontend talks to this backend over JSON; all state lives in Redis
//! - Auth is external: the auth service writes `session:{token}` hashes and
//!   the frontend carries the token in a cookie, we only read them
//! - SePay posts a webhook here for every incoming bank transfer; matching a
//!   donation code in the free-text description is what marks a donation paid
//! - Donation codes are pre-provisioned by hand into the Redis pool, a code
//!   is never minted by this process
//!
//! # Donation flow
//! 1. Signed-in user posts an amount and a message
//! 2. We pop one unclaimed code from the pool and attach the claim to it
//! 3. The user scans the VietQR image that carries the code as the transfer
//!    description and pays in their own banking app
//! 4. SePay sees the incoming transfer and posts the webhook
//! 5. The browser polls `/api/check-payment` every 5 seconds until the code
//!    flips to confirmed
//!
//! There is deliberately no push channel; polling keeps the whole thing
//! stateless on our side.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod donation;
pub mod error;
pub mod live;
pub mod memory;
pub mod models;
pub mod players;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use routes::{
    check_messages_handler, check_payment_handler, donate_handler, messages_handler,
    my_donations_handler, player_live_status_handler, post_message_handler,
    sepay_webhook_handler, twitch_status_handler, vietnam_players_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/donate", post(donate_handler))
        .route("/api/check-payment", get(check_payment_handler))
        .route("/api/my-donations", get(my_donations_handler))
        .route("/api/hooks/sepay-payment", post(sepay_webhook_handler))
        .route(
            "/api/messages",
            get(messages_handler).post(post_message_handler),
        )
        .route("/api/messages/check", get(check_messages_handler))
        .route("/api/player-live-status", get(player_live_status_handler))
        .route("/api/twitch-status", get(twitch_status_handler))
        .route("/api/vietnam-players", get(vietnam_players_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
