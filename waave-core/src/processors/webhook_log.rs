//! Diagnostic log for processed callbacks.
//!
//! The [`WebhookProcessor`](super::WebhookProcessor) writes one
//! [`WebhookLogEntry`] per delivery through an injected [`WebhookLog`].
//! Entries carry what an operator needs to tell a forged callback from a
//! misconfigured key: the raw payload and both signatures. The private key
//! itself is never part of an entry.

use super::webhook_processor::{InboundWebhook, WebhookOutcome};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;
use waave_sdk::signature;

/// Everything recorded about one callback delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookLogEntry {
    /// `reference_id` from the payload, once it parsed.
    pub reference_id: Option<String>,
    /// Resolved order, once found.
    pub order_id: Option<Uuid>,
    /// Raw body as received (lossy UTF-8).
    pub payload: String,
    /// `X-Api-Signature` header as received.
    pub received_signature: Option<String>,
    /// Signature computed locally; absent when no private key is configured.
    pub computed_signature: Option<String>,
    /// Final decision.
    pub outcome: Option<WebhookOutcome>,
}

impl WebhookLogEntry {
    pub(crate) fn for_webhook(webhook: &InboundWebhook) -> Self {
        let secret = webhook.config.secret_bytes();
        let computed_signature = (!secret.is_empty()).then(|| {
            signature::compute_signature(
                secret,
                webhook.config.callback_url.as_str(),
                &webhook.body,
            )
        });
        Self {
            reference_id: None,
            order_id: None,
            payload: String::from_utf8_lossy(&webhook.body).into_owned(),
            received_signature: webhook.signature.clone(),
            computed_signature,
            outcome: None,
        }
    }
}

/// Sink for processed-callback entries.
pub trait WebhookLog: Send + Sync {
    fn record(&self, entry: &WebhookLogEntry);
}

/// Emits entries as `tracing` events under the `waave` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingWebhookLog;

impl WebhookLog for TracingWebhookLog {
    fn record(&self, entry: &WebhookLogEntry) {
        let reference_id = entry.reference_id.as_deref().unwrap_or("-");
        match &entry.outcome {
            Some(WebhookOutcome::Applied {
                order_id,
                transition,
            }) => {
                tracing::info!(
                    target: "waave",
                    reference_id,
                    %order_id,
                    ?transition,
                    "Waave callback applied"
                );
            }
            Some(WebhookOutcome::Ignored { order_id, status }) => {
                tracing::info!(
                    target: "waave",
                    reference_id,
                    %order_id,
                    status = %status,
                    payload = %entry.payload,
                    "Waave callback status needs no transition"
                );
            }
            Some(WebhookOutcome::Rejected(reason)) => {
                tracing::warn!(
                    target: "waave",
                    reference_id,
                    order_id = ?entry.order_id,
                    %reason,
                    payload = %entry.payload,
                    received_signature = ?entry.received_signature,
                    computed_signature = ?entry.computed_signature,
                    "Waave callback rejected"
                );
            }
            None => {
                tracing::debug!(target: "waave", reference_id, "Waave callback without outcome");
            }
        }
    }
}

/// Keeps entries in memory; used by tests and embedders that inspect
/// decisions directly.
#[derive(Debug, Default)]
pub struct MemoryWebhookLog {
    entries: Mutex<Vec<WebhookLogEntry>>,
}

impl MemoryWebhookLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<WebhookLogEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl WebhookLog for MemoryWebhookLog {
    fn record(&self, entry: &WebhookLogEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
    }
}
