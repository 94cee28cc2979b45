//! In-memory [`Store`] used by the integration tests and for secretless local
//! runs. One mutex over the whole state keeps the claim path serialized the
//! same way Redis serializes `SPOP`.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::donation::{CodeState, TransitionError};
use crate::store::{ChatMessage, ConfirmOutcome, Donation, Session, Store, StoreError};

#[derive(Default)]
struct Inner {
    pool: BTreeSet<String>,
    codes: HashMap<String, CodeState>,
    confirm_log: Vec<String>,
    messages: Vec<ChatMessage>,
    next_message_id: u64,
    sessions: HashMap<String, Session>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed pre-provisioned codes, the way an operator fills the Redis pool.
    pub async fn provision_codes(&self, codes: &[&str]) {
        let mut inner = self.inner.lock().await;
        for code in codes {
            inner.pool.insert(code.to_string());
            inner.codes.insert(code.to_string(), CodeState::Unclaimed);
        }
    }

    /// Seed a session, standing in for the external auth provider.
    pub async fn add_session(&self, token: &str, session: Session) {
        self.inner
            .lock()
            .await
            .sessions
            .insert(token.to_string(), session);
    }

    pub async fn code_state(&self, code: &str) -> Option<CodeState> {
        self.inner.lock().await.codes.get(code).cloned()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn claim_code(
        &self,
        sender: &str,
        amount: i64,
        message: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(code) = inner.pool.pop_first() else {
            return Ok(None);
        };
        let current = inner
            .codes
            .get(&code)
            .cloned()
            .unwrap_or(CodeState::Unclaimed);
        let next = current
            .claim(sender, amount, message, Utc::now())
            .map_err(|err| StoreError::Corrupt(format!("pooled code {code}: {err}")))?;
        inner.codes.insert(code.clone(), next);
        Ok(Some(code))
    }

    async fn confirm_code(
        &self,
        code: &str,
        transfer_amount: i64,
    ) -> Result<ConfirmOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(current) = inner.codes.get(code).cloned() else {
            return Ok(ConfirmOutcome::UnknownCode);
        };
        match current.confirm(transfer_amount, Utc::now()) {
            Ok(Some(next)) => {
                let sender = next.sender().unwrap_or_default().to_string();
                let amount = next.amount().unwrap_or_default();
                inner.codes.insert(code.to_string(), next);
                inner.confirm_log.push(code.to_string());
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
        let inner = self.inner.lock().await;
        Ok(matches!(
            inner.codes.get(code),
            Some(CodeState::Confirmed { sender: claimant, .. }) if claimant == sender
        ))
    }

    async fn confirmed_donations(&self, sender: &str) -> Result<Vec<Donation>, StoreError> {
        let inner = self.inner.lock().await;
        let mut donations = Vec::new();
        for code in inner.confirm_log.iter().rev() {
            if let Some(CodeState::Confirmed {
                sender: claimant,
                amount,
                message,
                confirmed_at,
                ..
            }) = inner.codes.get(code)
            {
                if claimant == sender {
                    donations.push(Donation {
                        code: code.clone(),
                        amount: *amount,
                        message: message.clone(),
                        confirmed_at: *confirmed_at,
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
        let mut inner = self.inner.lock().await;
        inner.next_message_id += 1;
        let id = inner.next_message_id;
        inner.messages.push(ChatMessage {
            id,
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn messages(&self) -> Result<Vec<ChatMessage>, StoreError> {
        Ok(self.inner.lock().await.messages.clone())
    }

    async fn has_messages_after(&self, last_id: u64) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.messages.iter().any(|message| message.id > last_id))
    }

    async fn session(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.lock().await.sessions.get(token).cloned())
    }
}
