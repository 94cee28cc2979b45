//! Request and response payloads for the HTTP surface, plus the gateway's
//! webhook schema. Wire casing follows what the clients and SePay send.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::players::PlayerView;
use crate::store::Donation;

#[derive(Deserialize)]
pub struct DonateRequest {
    /// The donate form posts the amount as a string; other clients send a
    /// number. Validated in one place either way.
    pub amount: Option<Value>,
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonateResponse {
    pub success: bool,
    pub code: String,
    pub qr_url: String,
}

#[derive(Deserialize)]
pub struct CheckPaymentParams {
    pub code: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentStatus {
    pub paid: bool,
}

#[derive(Serialize)]
pub struct DonationHistory {
    pub success: bool,
    pub donations: Vec<Donation>,
}

/// SePay webhook payload. Only `content` and `transferAmount` drive the
/// reconciliation; the rest is carried through for the operator log.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SepayWebhook {
    pub gateway: Option<String>,
    pub transaction_date: Option<String>,
    pub account_number: Option<String>,
    pub sub_account: Option<String>,
    pub transfer_type: Option<String>,
    pub transfer_amount: i64,
    pub accumulated: Option<i64>,
    pub content: String,
    pub reference_code: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct Ack {
    pub success: bool,
}

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub content: Option<String>,
}

#[derive(Serialize)]
pub struct PostMessageResponse {
    pub success: bool,
    pub id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckMessagesParams {
    pub last_message_id: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckMessagesResponse {
    pub has_new: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusParams {
    pub player_id: Option<String>,
    pub source: Option<String>,
    pub identifier: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusResponse {
    pub success: bool,
    pub is_live: bool,
    pub data: Option<Value>,
    pub cached: bool,
    pub last_checked: String,
}

#[derive(Deserialize)]
pub struct TwitchStatusParams {
    pub channel: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitchStatusResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub channel_name: String,
    pub is_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    pub channel_url: String,
}

#[derive(Serialize)]
pub struct PlayersResponse {
    pub success: bool,
    pub players: Vec<PlayerView>,
    pub count: usize,
}
