//! # Redis
//!
//! RAM database. Holds the donation code pool, per-code claim state, chat
//! messages, and the sessions provisioned by the auth service.
//!
//! ## Requirements
//!
//! - Atomic single-step pool removal (two concurrent claims must never get
//!   the same code)
//! - Fast lookups for the 5-second payment polling loop
//! - Small dataset: a few hundred pre-provisioned codes, low-thousands of
//!   chat messages
//!
//! ## Schema
//!
//! - `donation:codes` (**set**): every provisioned code. Operators refill out
//!   of band: `SADD donation:codes shuneoNNNNNN` + `SADD donation:pool ...`.
//! - `donation:pool` (**set**): codes still unclaimed. `SPOP` is the
//!   serialization point for the claim race.
//! - `donation:code:{code}` (**hash**): claim/confirm fields. Absent while
//!   the code is unclaimed.
//! - `donation:history:{userId}` (**zset**): confirmed codes scored by
//!   confirmation time, for newest-first history.
//! - `chat:seq` (**int**): monotonic message id counter.
//! - `chat:messages` (**zset**): message JSON scored by id, so "anything
//!   newer than id N" is one `ZCOUNT`.
//! - `session:{token}` (**hash**): `user_id`, `name`, `role`. Written by the
//!   auth service, only read here.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use crate::donation::{CodeState, TransitionError};
use crate::store::{ChatMessage, ConfirmOutcome, Donation, Session, Store, StoreError};

const CODES_KEY: &str = "donation:codes";
const POOL_KEY: &str = "donation:pool";
const CHAT_SEQ_KEY: &str = "chat:seq";
const CHAT_LOG_KEY: &str = "chat:messages";

fn code_key(code: &str) -> String {
    format!("donation:code:{code}")
}

fn history_key(sender: &str) -> String {
    format!("donation:history:{sender}")
}

fn session_key(token: &str) -> String {
    format!("session:{token}")
}

pub async fn init_redis(redis_url: &str) -> ConnectionManager {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url).unwrap();
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .unwrap();

    connection_manager
}

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    async fn code_state(&self, code: &str) -> Result<Option<CodeState>, StoreError> {
        let mut con = self.connection.clone();
        let fields: HashMap<String, String> = con.hgetall(code_key(code)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        CodeState::from_fields(&fields)
            .map(Some)
            .map_err(StoreError::Corrupt)
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn claim_code(
        &self,
        sender: &str,
        amount: i64,
        message: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut con = self.connection.clone();

        // SPOP is atomic: concurrent claims each take a distinct code, and
        // the loser of the last code sees an empty pool.
        let Some(code): Option<String> = con.spop(POOL_KEY).await? else {
            return Ok(None);
        };

        let claimed = CodeState::Unclaimed
            .claim(sender, amount, message, Utc::now())
            .map_err(|err| StoreError::Corrupt(format!("pooled code {code}: {err}")))?;
        let _: () = con.hset_multiple(code_key(&code), &claimed.to_fields()).await?;

        Ok(Some(code))
    }

    async fn confirm_code(
        &self,
        code: &str,
        transfer_amount: i64,
    ) -> Result<ConfirmOutcome, StoreError> {
        let mut con = self.connection.clone();

        let provisioned: bool = con.sismember(CODES_KEY, code).await?;
        if !provisioned {
            return Ok(ConfirmOutcome::UnknownCode);
        }

        let Some(current) = self.code_state(code).await? else {
            // Provisioned but never claimed: the hash does not exist yet.
            return Ok(ConfirmOutcome::NotClaimed);
        };

        let now = Utc::now();
        match current.confirm(transfer_amount, now) {
            Ok(Some(next)) => {
                let sender = next.sender().unwrap_or_default().to_string();
                let amount = next.amount().unwrap_or_default();
                let _: () = con.hset_multiple(code_key(code), &next.to_fields()).await?;
                let _: () = con
                    .zadd(history_key(&sender), code, now.timestamp_millis())
                    .await?;
                Ok(ConfirmOutcome::Confirmed { sender, amount })
            }
            Ok(None) => Ok(ConfirmOutcome::AlreadyConfirmed),
            Err(TransitionError::NotClaimed) => Ok(ConfirmOutcome::NotClaimed),
            Err(TransitionError::AmountMismatch {
                claimed,
                transferred,
            }) => Ok(ConfirmOutcome::AmountMismatch {
                claimed,
                transferred,
            }),
            Err(other) => Err(StoreError::Corrupt(format!("code {code}: {other}"))),
        }
    }

    async fn payment_confirmed(&self, code: &str, sender: &str) -> Result<bool, StoreError> {
        Ok(matches!(
            self.code_state(code).await?,
            Some(CodeState::Confirmed { sender: claimant, .. }) if claimant == sender
        ))
    }

    async fn confirmed_donations(&self, sender: &str) -> Result<Vec<Donation>, StoreError> {
        let mut con = self.connection.clone();
        let codes: Vec<String> = con.zrevrange(history_key(sender), 0, -1).await?;

        let mut donations = Vec::with_capacity(codes.len());
        for code in codes {
            if let Some(CodeState::Confirmed {
                sender: claimant,
                amount,
                message,
                confirmed_at,
                ..
            }) = self.code_state(&code).await?
            {
                if claimant == sender {
                    donations.push(Donation {
                        code,
                        amount,
                        message,
                        confirmed_at,
                    });
                }
            }
        }
        Ok(donations)
    }

    async fn append_message(
        &self,
        sender_id: &str,
        sender_name: &str,
        content: &str,
    ) -> Result<u64, StoreError> {
        let mut con = self.connection.clone();
        let id: u64 = con.incr(CHAT_SEQ_KEY, 1).await?;

        let message = ChatMessage {
            id,
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        let encoded = serde_json::to_string(&message)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let _: () = con.zadd(CHAT_LOG_KEY, encoded, id).await?;

        Ok(id)
    }

    async fn messages(&self) -> Result<Vec<ChatMessage>, StoreError> {
        let mut con = self.connection.clone();
        let entries: Vec<String> = con.zrange(CHAT_LOG_KEY, 0, -1).await?;

        entries
            .iter()
            .map(|entry| {
                serde_json::from_str(entry).map_err(|err| StoreError::Corrupt(err.to_string()))
            })
            .collect()
    }

    async fn has_messages_after(&self, last_id: u64) -> Result<bool, StoreError> {
        let mut con = self.connection.clone();
        let newer: u64 = con
            .zcount(CHAT_LOG_KEY, format!("({last_id}"), "+inf")
            .await?;
        Ok(newer > 0)
    }

    async fn session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let mut con = self.connection.clone();
        let fields: HashMap<String, String> = con.hgetall(session_key(token)).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        let user_id = fields
            .get("user_id")
            .cloned()
            .ok_or_else(|| StoreError::Corrupt("session without user_id".into()))?;
        Ok(Some(Session {
            user_id,
            name: fields.get("name").cloned().unwrap_or_default(),
            role: fields.get("role").cloned().unwrap_or_else(|| "user".into()),
        }))
    }
}
