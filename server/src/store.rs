use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// A confirmed donation as shown in the claimant's history.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub code: String,
    pub amount: i64,
    pub message: String,
    pub confirmed_at: DateTime<Utc>,
}

/// One chat message. Field names mirror the wire format the clients read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: u64,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Session resolved from an opaque token. Sessions are issued by the external
/// auth collaborator; this service only reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub role: String,
}

/// What happened to a code when a gateway webhook tried to confirm it.
/// Everything except `Confirmed` is a no-op on stored state.
#[derive(Debug, PartialEq)]
pub enum ConfirmOutcome {
    Confirmed { sender: String, amount: i64 },
    AlreadyConfirmed,
    UnknownCode,
    NotClaimed,
    AmountMismatch { claimed: i64, transferred: i64 },
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically take one unclaimed code from the pool and attach the
    /// claimant. Returns `None` when the pool is exhausted.
    async fn claim_code(
        &self,
        sender: &str,
        amount: i64,
        message: &str,
    ) -> Result<Option<String>, StoreError>;

    /// Apply a gateway confirmation to `code`. Only a claimed-pending code
    /// whose claimed amount equals `transfer_amount` is promoted.
    async fn confirm_code(
        &self,
        code: &str,
        transfer_amount: i64,
    ) -> Result<ConfirmOutcome, StoreError>;

    /// True only when `code` is confirmed and was claimed by `sender`.
    async fn payment_confirmed(&self, code: &str, sender: &str) -> Result<bool, StoreError>;

    /// The sender's confirmed donations, newest first.
    async fn confirmed_donations(&self, sender: &str) -> Result<Vec<Donation>, StoreError>;

    async fn append_message(
        &self,
        sender_id: &str,
        sender_name: &str,
        content: &str,
    ) -> Result<u64, StoreError>;

    async fn messages(&self) -> Result<Vec<ChatMessage>, StoreError>;

    async fn has_messages_after(&self, last_id: u64) -> Result<bool, StoreError>;

    async fn session(&self, token: &str) -> Result<Option<Session>, StoreError>;
}
