//! Callback payload posted by Waave once a payment changes state.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Payment status reported by Waave.
///
/// Statuses this integration does not act on are kept verbatim in
/// [`PaymentStatus::Other`] so newer provider states parse cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Cancelled,
    Other(String),
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "completed" => PaymentStatus::Completed,
            "pending" => PaymentStatus::Pending,
            "cancelled" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Other(value),
        }
    }
}

impl From<PaymentStatus> for String {
    fn from(value: PaymentStatus) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
            PaymentStatus::Other(status) => write!(f, "{status}"),
        }
    }
}

/// Typed callback body.
///
/// Unknown extra fields are tolerated; missing or wrongly typed required
/// fields are not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub reference_id: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
}

/// Reasons a callback body is refused before authentication.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty required field: {0}")]
    EmptyField(&'static str),
}

impl WebhookPayload {
    /// Parse raw callback bytes, failing closed on anything incomplete.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        let payload: WebhookPayload = serde_json::from_slice(body)?;
        if payload.reference_id.trim().is_empty() {
            return Err(PayloadError::EmptyField("reference_id"));
        }
        if payload.currency.trim().is_empty() {
            return Err(PayloadError::EmptyField("currency"));
        }
        Ok(payload)
    }
}

/// Waave sends amounts either as JSON strings or as JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Number(serde_json::Number),
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match RawAmount::deserialize(deserializer)? {
        RawAmount::Text(text) => text,
        RawAmount::Number(number) => number.to_string(),
    };
    Decimal::from_str(text.trim())
        .map_err(|e| serde::de::Error::custom(format!("invalid amount {text:?}: {e}")))
}
