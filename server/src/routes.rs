use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use chrono::Utc;
use tracing::{info, warn};

use crate::auth::{authorize_webhook, require_session};
use crate::donation::{extract_code, qr_image_url};
use crate::error::AppError;
use crate::live::{check_twitch_live, probe, resolve_channel, twitch_access_token};
use crate::models::{
    Ack, CheckMessagesParams, CheckMessagesResponse, CheckPaymentParams, DonateRequest,
    DonateResponse, DonationHistory, LiveStatusParams, LiveStatusResponse, PaymentStatus,
    PlayersResponse, PostMessageRequest, PostMessageResponse, SepayWebhook, TwitchStatusParams,
    TwitchStatusResponse,
};
use crate::players::vietnam_players;
use crate::state::AppState;
use crate::store::{ChatMessage, ConfirmOutcome};
use crate::utils::parse_amount;

/// Claim one pooled donation code for the signed-in user and hand back the
/// QR image URL encoding it as the transfer description.
pub async fn donate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<DonateRequest>,
) -> Result<Json<DonateResponse>, AppError> {
    let session = require_session(&state, &headers).await?;
    let amount = parse_amount(payload.amount.as_ref())?;
    let message = payload.message.unwrap_or_default();

    let code = state
        .store
        .claim_code(&session.user_id, amount, &message)
        .await?
        .ok_or(AppError::PoolExhausted)?;

    info!("Donation code {code} claimed by {} for {amount}", session.user_id);

    let qr_url = qr_image_url(&state.config.bank_id, &state.config.account_no, amount, &code);
    Ok(Json(DonateResponse {
        success: true,
        code,
        qr_url,
    }))
}

/// Payment polling loop target. Only the claimant ever observes `paid: true`.
pub async fn check_payment_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CheckPaymentParams>,
) -> Result<Json<PaymentStatus>, AppError> {
    let session = require_session(&state, &headers).await?;
    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Missing donation code".to_string()))?;

    let paid = state
        .store
        .payment_confirmed(&code, &session.user_id)
        .await?;
    Ok(Json(PaymentStatus { paid }))
}

pub async fn my_donations_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<DonationHistory>, AppError> {
    let session = require_session(&state, &headers).await?;
    let donations = state.store.confirmed_donations(&session.user_id).await?;
    Ok(Json(DonationHistory {
        success: true,
        donations,
    }))
}

/// SePay posts here after every incoming transfer. The response is an ack in
/// every parsed case, including non-matches, so the gateway never retries
/// forever; anything that did not promote a code is logged for the operator.
pub async fn sepay_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SepayWebhook>,
) -> Result<Json<Ack>, AppError> {
    authorize_webhook(&headers, &state.config.sepay_secret)?;

    let Some(code) = extract_code(&state.code_pattern, &payload.content) else {
        warn!(
            "Webhook description carries no donation code: {:?}",
            payload.content
        );
        return Ok(Json(Ack { success: true }));
    };

    match state
        .store
        .confirm_code(code, payload.transfer_amount)
        .await?
    {
        ConfirmOutcome::Confirmed { sender, amount } => {
            info!("Donation {code} confirmed: {amount} from {sender}");
        }
        ConfirmOutcome::AlreadyConfirmed => {
            info!("Webhook re-delivered for already-confirmed code {code}");
        }
        ConfirmOutcome::UnknownCode => {
            warn!("Webhook matched unknown code {code}");
        }
        ConfirmOutcome::NotClaimed => {
            warn!("Webhook matched unclaimed code {code}, holding for manual reconciliation");
        }
        ConfirmOutcome::AmountMismatch {
            claimed,
            transferred,
        } => {
            warn!(
                "Webhook for {code} transferred {transferred} but {claimed} was claimed, holding for manual reconciliation"
            );
        }
    }

    Ok(Json(Ack { success: true }))
}

pub async fn messages_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    Ok(Json(state.store.messages().await?))
}

pub async fn post_message_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<PostMessageRequest>,
) -> Result<Json<PostMessageResponse>, AppError> {
    let session = require_session(&state, &headers).await?;

    let content = payload.content.unwrap_or_default();
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput("Content is required".to_string()));
    }

    let id = state
        .store
        .append_message(&session.user_id, &session.name, content)
        .await?;
    Ok(Json(PostMessageResponse { success: true, id }))
}

pub async fn check_messages_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CheckMessagesParams>,
) -> Result<Json<CheckMessagesResponse>, AppError> {
    let has_new = match params.last_message_id {
        None => true,
        Some(last_id) => state.store.has_messages_after(last_id).await?,
    };
    Ok(Json(CheckMessagesResponse { has_new }))
}

/// Cached-or-fresh live status for one dashboard tile.
pub async fn player_live_status_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LiveStatusParams>,
) -> Result<Json<LiveStatusResponse>, AppError> {
    let (Some(player_id), Some(source), Some(identifier)) =
        (params.player_id, params.source, params.identifier)
    else {
        return Err(AppError::InvalidInput(
            "Missing required parameters: playerId, source, identifier".to_string(),
        ));
    };

    let cache_key = format!("{player_id}-{source}-{identifier}");
    if let Some(entry) = state.live_cache.fresh(&cache_key) {
        return Ok(Json(LiveStatusResponse {
            success: true,
            is_live: entry.is_live,
            data: entry.data,
            cached: true,
            last_checked: entry.checked_wall.to_rfc3339(),
        }));
    }

    let check = probe(&state.http, &state.config, &source, &identifier).await;
    let now = Utc::now();
    state.live_cache.store(cache_key, &check, now);

    Ok(Json(LiveStatusResponse {
        success: true,
        is_live: check.is_live,
        data: check.data,
        cached: false,
        last_checked: now.to_rfc3339(),
    }))
}

fn offline_status(success: bool, message: Option<String>, channel: &str) -> TwitchStatusResponse {
    TwitchStatusResponse {
        success,
        message,
        channel_name: channel.to_string(),
        is_live: false,
        game_name: None,
        viewer_count: None,
        title: None,
        started_at: None,
        channel_url: format!("https://twitch.tv/{channel}"),
    }
}

pub async fn twitch_status_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TwitchStatusParams>,
) -> Json<TwitchStatusResponse> {
    let channel = resolve_channel(params.channel.as_deref().unwrap_or("theaccm"));

    let (Some(client_id), Some(client_secret)) = (
        state.config.twitch_client_id.as_deref(),
        state.config.twitch_secret.as_deref(),
    ) else {
        return Json(offline_status(
            false,
            Some("Twitch credentials are not configured".to_string()),
            &channel,
        ));
    };

    let token = match twitch_access_token(&state.http, client_id, client_secret).await {
        Ok(token) => token,
        Err(err) => {
            warn!("Could not get Twitch access token: {err}");
            return Json(offline_status(
                false,
                Some("Could not get Twitch access token".to_string()),
                &channel,
            ));
        }
    };

    match check_twitch_live(&state.http, client_id, &token, &channel).await {
        Ok(Some(stream)) => Json(TwitchStatusResponse {
            success: true,
            message: None,
            channel_name: channel.clone(),
            is_live: true,
            game_name: Some(stream.game_name),
            viewer_count: Some(stream.viewer_count),
            title: Some(stream.title),
            started_at: Some(stream.started_at),
            channel_url: format!("https://twitch.tv/{channel}"),
        }),
        Ok(None) => Json(offline_status(true, None, &channel)),
        Err(err) => {
            warn!("Error checking channel {channel}: {err}");
            Json(offline_status(true, None, &channel))
        }
    }
}

pub async fn vietnam_players_handler(
    State(state): State<Arc<AppState>>,
) -> Json<PlayersResponse> {
    let players = vietnam_players(&state.players);
    let count = players.len();
    Json(PlayersResponse {
        success: true,
        players,
        count,
    })
}
