//! Donation code lifecycle.
//!
//! Codes are pre-provisioned payment slots. A code is `Unclaimed` until a
//! donation request attaches a sender, then `ClaimedPending` until the bank
//! gateway confirms the transfer, then `Confirmed` forever. All state changes
//! go through [`CodeState::claim`] and [`CodeState::confirm`]; there is no
//! other way to move a code, so a code without a claimant can never end up
//! confirmed.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum CodeState {
    Unclaimed,
    ClaimedPending {
        sender: String,
        amount: i64,
        message: String,
        claimed_at: DateTime<Utc>,
    },
    Confirmed {
        sender: String,
        amount: i64,
        message: String,
        claimed_at: DateTime<Utc>,
        confirmed_at: DateTime<Utc>,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum TransitionError {
    #[error("code is already claimed")]
    AlreadyClaimed,

    #[error("code has no claimant")]
    NotClaimed,

    #[error("transfer of {transferred} does not match claimed amount {claimed}")]
    AmountMismatch { claimed: i64, transferred: i64 },
}

impl CodeState {
    /// Attach a claimant to an unclaimed code.
    pub fn claim(
        &self,
        sender: &str,
        amount: i64,
        message: &str,
        at: DateTime<Utc>,
    ) -> Result<CodeState, TransitionError> {
        match self {
            CodeState::Unclaimed => Ok(CodeState::ClaimedPending {
                sender: sender.to_string(),
                amount,
                message: message.to_string(),
                claimed_at: at,
            }),
            _ => Err(TransitionError::AlreadyClaimed),
        }
    }

    /// Promote a claimed-pending code once the gateway reports a matching
    /// transfer. `Ok(None)` means the code was already confirmed and the
    /// delivery is a re-send; the stored state must not change.
    pub fn confirm(
        &self,
        transfer_amount: i64,
        at: DateTime<Utc>,
    ) -> Result<Option<CodeState>, TransitionError> {
        match self {
            CodeState::Unclaimed => Err(TransitionError::NotClaimed),
            CodeState::ClaimedPending {
                sender,
                amount,
                message,
                claimed_at,
            } => {
                if *amount != transfer_amount {
                    return Err(TransitionError::AmountMismatch {
                        claimed: *amount,
                        transferred: transfer_amount,
                    });
                }
                Ok(Some(CodeState::Confirmed {
                    sender: sender.clone(),
                    amount: *amount,
                    message: message.clone(),
                    claimed_at: *claimed_at,
                    confirmed_at: at,
                }))
            }
            CodeState::Confirmed { .. } => Ok(None),
        }
    }

    pub fn sender(&self) -> Option<&str> {
        match self {
            CodeState::Unclaimed => None,
            CodeState::ClaimedPending { sender, .. } | CodeState::Confirmed { sender, .. } => {
                Some(sender)
            }
        }
    }

    pub fn amount(&self) -> Option<i64> {
        match self {
            CodeState::Unclaimed => None,
            CodeState::ClaimedPending { amount, .. } | CodeState::Confirmed { amount, .. } => {
                Some(*amount)
            }
        }
    }

    /// Flat field representation for the per-code Redis hash.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        match self {
            CodeState::Unclaimed => vec![("state".into(), "unclaimed".into())],
            CodeState::ClaimedPending {
                sender,
                amount,
                message,
                claimed_at,
            } => vec![
                ("state".into(), "pending".into()),
                ("sender".into(), sender.clone()),
                ("amount".into(), amount.to_string()),
                ("message".into(), message.clone()),
                ("claimed_at".into(), claimed_at.timestamp_millis().to_string()),
            ],
            CodeState::Confirmed {
                sender,
                amount,
                message,
                claimed_at,
                confirmed_at,
            } => vec![
                ("state".into(), "confirmed".into()),
                ("sender".into(), sender.clone()),
                ("amount".into(), amount.to_string()),
                ("message".into(), message.clone()),
                ("claimed_at".into(), claimed_at.timestamp_millis().to_string()),
                (
                    "confirmed_at".into(),
                    confirmed_at.timestamp_millis().to_string(),
                ),
            ],
        }
    }

    pub fn from_fields(fields: &HashMap<String, String>) -> Result<CodeState, String> {
        let state = fields.get("state").map(String::as_str).unwrap_or_default();
        match state {
            "unclaimed" => Ok(CodeState::Unclaimed),
            "pending" => Ok(CodeState::ClaimedPending {
                sender: required(fields, "sender")?,
                amount: parse_int(fields, "amount")?,
                message: fields.get("message").cloned().unwrap_or_default(),
                claimed_at: parse_millis(fields, "claimed_at")?,
            }),
            "confirmed" => Ok(CodeState::Confirmed {
                sender: required(fields, "sender")?,
                amount: parse_int(fields, "amount")?,
                message: fields.get("message").cloned().unwrap_or_default(),
                claimed_at: parse_millis(fields, "claimed_at")?,
                confirmed_at: parse_millis(fields, "confirmed_at")?,
            }),
            other => Err(format!("unknown code state '{other}'")),
        }
    }
}

fn required(fields: &HashMap<String, String>, key: &str) -> Result<String, String> {
    fields
        .get(key)
        .cloned()
        .ok_or_else(|| format!("missing field '{key}'"))
}

fn parse_int(fields: &HashMap<String, String>, key: &str) -> Result<i64, String> {
    required(fields, key)?
        .parse()
        .map_err(|_| format!("non-numeric field '{key}'"))
}

fn parse_millis(fields: &HashMap<String, String>, key: &str) -> Result<DateTime<Utc>, String> {
    Utc.timestamp_millis_opt(parse_int(fields, key)?)
        .single()
        .ok_or_else(|| format!("out-of-range timestamp in '{key}'"))
}

/// Matcher for donation codes in free-text transfer descriptions: the
/// configured prefix followed by exactly six digits.
pub fn code_pattern(prefix: &str) -> Regex {
    Regex::new(&format!(r"{}\d{{6}}", regex::escape(prefix))).unwrap()
}

/// First code-shaped token in a transfer description, if any. Banks mangle
/// the description around the code, so this scans rather than parses.
pub fn extract_code<'a>(pattern: &Regex, content: &'a str) -> Option<&'a str> {
    pattern.find(content).map(|found| found.as_str())
}

/// VietQR image URL the banking apps scan. The parameterization is fixed by
/// the image host; do not reorder or re-encode it.
pub fn qr_image_url(bank_id: &str, account_no: &str, amount: i64, code: &str) -> String {
    format!("https://img.vietqr.io/image/{bank_id}-{account_no}-print.png?amount={amount}&addInfo={code}")
}
