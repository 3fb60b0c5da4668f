//! WebhookProcessor.
//!
//! Handles one Waave callback end to end:
//! - Parses the raw body into a typed [`WebhookPayload`]
//! - Verifies the `X-Api-Signature` digest over the same raw bytes
//! - Resolves the order by `reference_id` inside its per-order lock
//! - Checks amount, currency and that the order is not already completed
//! - Applies exactly one transition for the reported payment status
//! - Records the decision through the injected [`WebhookLog`]
//!
//! Every failure is absorbed into a [`WebhookOutcome`]; the caller always
//! acknowledges the delivery.

use crate::config::GatewayConfig;
use crate::entities::{Order, OrderStatus};
use crate::processors::order_locks::OrderLocks;
use crate::processors::webhook_log::{WebhookLog, WebhookLogEntry};
use crate::store::{OrderStore, StoreError};
use bytes::Bytes;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use std::convert::Infallible;
use std::sync::Arc;
use uuid::Uuid;
use waave_sdk::objects::{PaymentStatus, WebhookPayload, round_amount};
use waave_sdk::signature::{self, SignatureError};

pub const PAYMENT_COMPLETED_NOTE: &str = "Waave payment completed";
pub const PAYMENT_PENDING_NOTE: &str = "This payment is pending via Waave.";
pub const PAYMENT_CANCELLED_NOTE: &str = "This payment has cancelled via Waave.";

/// A callback exactly as it arrived.
#[derive(Debug, Clone)]
pub struct InboundWebhook {
    /// Gateway settings snapshot taken when the request arrived.
    pub config: Arc<GatewayConfig>,
    /// Raw request body.
    pub body: Bytes,
    /// Value of the `X-Api-Signature` header, if any.
    pub signature: Option<String>,
}

/// Order transitions a callback can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Payment captured; the order becomes `completed`.
    PaymentCompleted,
    /// Payment awaiting confirmation; the order goes `on-hold`.
    OnHold,
    /// Payment abandoned; the order is `cancelled`.
    Cancelled,
}

impl Transition {
    pub fn target_status(self) -> OrderStatus {
        match self {
            Transition::PaymentCompleted => OrderStatus::Completed,
            Transition::OnHold => OrderStatus::OnHold,
            Transition::Cancelled => OrderStatus::Cancelled,
        }
    }

    pub fn note(self) -> &'static str {
        match self {
            Transition::PaymentCompleted => PAYMENT_COMPLETED_NOTE,
            Transition::OnHold => PAYMENT_PENDING_NOTE,
            Transition::Cancelled => PAYMENT_CANCELLED_NOTE,
        }
    }

    /// Transition for a reported status; `None` for statuses left alone.
    pub fn for_status(status: &PaymentStatus) -> Option<Self> {
        match status {
            PaymentStatus::Completed => Some(Transition::PaymentCompleted),
            PaymentStatus::Pending => Some(Transition::OnHold),
            PaymentStatus::Cancelled => Some(Transition::Cancelled),
            PaymentStatus::Other(_) => None,
        }
    }
}

/// Ways a payload can disagree with the order it names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderMismatch {
    #[error("order does not exist")]
    UnknownOrder,
    #[error("amount {received} does not match order total {expected}")]
    AmountMismatch { expected: Decimal, received: Decimal },
    #[error("currency {received} does not match order currency {expected}")]
    CurrencyMismatch { expected: String, received: String },
    #[error("order has already been completed")]
    AlreadyCompleted,
}

/// Why a callback was refused. No order was modified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WebhookRejection {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("signature check failed: {0}")]
    Signature(#[from] SignatureError),
    #[error("order mismatch: {0}")]
    OrderMismatch(#[from] OrderMismatch),
    #[error("order store failed: {0}")]
    Store(String),
}

impl From<StoreError> for WebhookRejection {
    fn from(err: StoreError) -> Self {
        WebhookRejection::Store(err.to_string())
    }
}

/// What happened to one callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The order was transitioned.
    Applied {
        order_id: Uuid,
        transition: Transition,
    },
    /// Authenticated and matching, but the status needs no transition.
    Ignored { order_id: Uuid, status: String },
    /// Refused without touching the order.
    Rejected(WebhookRejection),
}

impl WebhookOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, WebhookOutcome::Applied { .. })
    }
}

/// Applies Waave callbacks to shop orders.
#[derive(Clone)]
pub struct WebhookProcessor {
    store: Arc<dyn OrderStore>,
    log: Arc<dyn WebhookLog>,
    locks: OrderLocks,
}

impl WebhookProcessor {
    /// Create a new WebhookProcessor.
    ///
    /// # Arguments
    ///
    /// * `store` - Where orders are read and transitioned
    /// * `log` - Receives one entry per processed callback
    pub fn new(store: Arc<dyn OrderStore>, log: Arc<dyn WebhookLog>) -> Self {
        Self {
            store,
            log,
            locks: OrderLocks::new(),
        }
    }

    async fn evaluate(
        &self,
        webhook: &InboundWebhook,
        entry: &mut WebhookLogEntry,
    ) -> Result<WebhookOutcome, WebhookRejection> {
        let payload = WebhookPayload::from_slice(&webhook.body)
            .map_err(|e| WebhookRejection::MalformedPayload(e.to_string()))?;
        entry.reference_id = Some(payload.reference_id.clone());

        signature::check_signature(
            &webhook.body,
            webhook.config.callback_url.as_str(),
            webhook.signature.as_deref(),
            webhook.config.secret_bytes(),
        )?;

        let _guard = self.locks.lock(&payload.reference_id).await;

        let order = self
            .store
            .find_by_reference(&payload.reference_id)
            .await?
            .ok_or(OrderMismatch::UnknownOrder)?;
        entry.order_id = Some(order.order_id);

        check_against_order(&payload, &order)?;

        let Some(transition) = Transition::for_status(&payload.status) else {
            return Ok(WebhookOutcome::Ignored {
                order_id: order.order_id,
                status: payload.status.to_string(),
            });
        };

        let applied = match transition {
            Transition::PaymentCompleted => {
                self.store
                    .complete_payment(order.order_id, transition.note())
                    .await?
            }
            Transition::OnHold | Transition::Cancelled => {
                self.store
                    .transition(order.order_id, transition.target_status(), transition.note())
                    .await?
            }
        };

        // Another writer completed the order between our read and write.
        if !applied {
            return Err(OrderMismatch::AlreadyCompleted.into());
        }

        Ok(WebhookOutcome::Applied {
            order_id: order.order_id,
            transition,
        })
    }
}

/// Validate a payload against the order it names.
///
/// The amount is compared with the order total at the currency's minor-unit
/// precision, which is what the hosted page was sent at checkout.
pub fn check_against_order(payload: &WebhookPayload, order: &Order) -> Result<(), OrderMismatch> {
    let expected = round_amount(order.total, &order.currency);
    if payload.amount != expected {
        return Err(OrderMismatch::AmountMismatch {
            expected,
            received: payload.amount,
        });
    }
    if !payload.currency.trim().eq_ignore_ascii_case(order.currency.trim()) {
        return Err(OrderMismatch::CurrencyMismatch {
            expected: order.currency.clone(),
            received: payload.currency.clone(),
        });
    }
    if order.status.is_terminal() {
        return Err(OrderMismatch::AlreadyCompleted);
    }
    Ok(())
}

impl Processor<InboundWebhook> for WebhookProcessor {
    type Output = WebhookOutcome;
    type Error = Infallible;
    #[tracing::instrument(skip_all, name = "Waave:ProcessWebhook")]
    async fn process(&self, webhook: InboundWebhook) -> Result<WebhookOutcome, Infallible> {
        let mut entry = WebhookLogEntry::for_webhook(&webhook);
        let outcome = self
            .evaluate(&webhook, &mut entry)
            .await
            .unwrap_or_else(WebhookOutcome::Rejected);
        entry.outcome = Some(outcome.clone());
        self.log.record(&entry);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::checkout_builder::build_checkout;
    use crate::processors::webhook_log::MemoryWebhookLog;
    use crate::store::MemoryOrderStore;
    use std::str::FromStr;
    use url::Url;
    use waave_sdk::objects::Environment;

    const SECRET: &[u8] = b"test-private-key";
    const CALLBACK_URL: &str = "https://shop.example.com/wc-api/waave";

    struct Harness {
        store: Arc<MemoryOrderStore>,
        log: Arc<MemoryWebhookLog>,
        processor: WebhookProcessor,
        config: Arc<GatewayConfig>,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(MemoryOrderStore::new());
            let log = Arc::new(MemoryWebhookLog::new());
            let processor = WebhookProcessor::new(store.clone(), log.clone());
            let config = Arc::new(GatewayConfig {
                enabled: true,
                environment: Environment::Sandbox,
                access_key: "ak_test".to_string(),
                private_key: SECRET.to_vec().into_boxed_slice(),
                venue_id: "venue-9".to_string(),
                callback_url: Url::parse(CALLBACK_URL).unwrap(),
                return_url: None,
                cancel_url: None,
            });
            Self {
                store,
                log,
                processor,
                config,
            }
        }

        fn order(&self, key: &str, total: &str, status: OrderStatus) -> Uuid {
            let now = time::OffsetDateTime::now_utc();
            let order = Order {
                order_id: Uuid::new_v4(),
                order_key: key.to_string(),
                total: Decimal::from_str(total).unwrap(),
                currency: "USD".to_string(),
                status,
                return_url: "https://shop.example.com/return".to_string(),
                cancel_url: "https://shop.example.com/cancel".to_string(),
                paid_at: None,
                created_at: time::PrimitiveDateTime::new(now.date(), now.time()),
            };
            let order_id = order.order_id;
            self.store.insert(order);
            order_id
        }

        fn signed(&self, body: &str) -> InboundWebhook {
            InboundWebhook {
                config: self.config.clone(),
                body: Bytes::copy_from_slice(body.as_bytes()),
                signature: Some(signature::compute_signature(
                    SECRET,
                    CALLBACK_URL,
                    body.as_bytes(),
                )),
            }
        }

        async fn deliver(&self, webhook: InboundWebhook) -> WebhookOutcome {
            match self.processor.process(webhook).await {
                Ok(outcome) => outcome,
                Err(never) => match never {},
            }
        }

        fn status(&self, order_id: Uuid) -> OrderStatus {
            self.store.order(order_id).unwrap().status
        }
    }

    fn body(reference_id: &str, amount: &str, status: &str) -> String {
        format!(
            r#"{{"reference_id":"{reference_id}","amount":"{amount}","currency":"USD","status":"{status}"}}"#
        )
    }

    #[tokio::test]
    async fn test_pending_puts_order_on_hold() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20.00", OrderStatus::Pending);

        let outcome = harness
            .deliver(harness.signed(&body("abc123", "20.00", "pending")))
            .await;

        assert_eq!(
            outcome,
            WebhookOutcome::Applied {
                order_id,
                transition: Transition::OnHold
            }
        );
        assert_eq!(harness.status(order_id), OrderStatus::OnHold);
        assert_eq!(
            harness.store.notes(order_id),
            vec!["This payment is pending via Waave.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let harness = Harness::new();
        let completed = harness.order("k-completed", "10.00", OrderStatus::Pending);
        let cancelled = harness.order("k-cancelled", "10.00", OrderStatus::Pending);

        harness
            .deliver(harness.signed(&body("k-completed", "10.00", "completed")))
            .await;
        harness
            .deliver(harness.signed(&body("k-cancelled", "10.00", "cancelled")))
            .await;

        assert_eq!(harness.status(completed), OrderStatus::Completed);
        assert_eq!(harness.store.payment_completions(completed), 1);
        assert_eq!(
            harness.store.notes(completed),
            vec![PAYMENT_COMPLETED_NOTE.to_string()]
        );
        assert_eq!(harness.status(cancelled), OrderStatus::Cancelled);
        assert_eq!(
            harness.store.notes(cancelled),
            vec![PAYMENT_CANCELLED_NOTE.to_string()]
        );
    }

    #[tokio::test]
    async fn test_replayed_completion_applies_once() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20.00", OrderStatus::Pending);
        let webhook = harness.signed(&body("abc123", "20.00", "completed"));

        let first = harness.deliver(webhook.clone()).await;
        let second = harness.deliver(webhook).await;

        assert!(first.is_applied());
        assert_eq!(
            second,
            WebhookOutcome::Rejected(WebhookRejection::OrderMismatch(
                OrderMismatch::AlreadyCompleted
            ))
        );
        assert_eq!(harness.store.payment_completions(order_id), 1);
        assert_eq!(harness.store.notes(order_id).len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_completions_apply_once() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20.00", OrderStatus::Pending);
        let webhook = harness.signed(&body("abc123", "20.00", "completed"));

        let deliveries = (0..8).map(|_| {
            let processor = harness.processor.clone();
            let webhook = webhook.clone();
            tokio::spawn(async move { processor.process(webhook).await })
        });
        let mut applied = 0;
        for delivery in deliveries.collect::<Vec<_>>() {
            if let Ok(Ok(outcome)) = delivery.await {
                if outcome.is_applied() {
                    applied += 1;
                }
            }
        }

        assert_eq!(applied, 1);
        assert_eq!(harness.store.payment_completions(order_id), 1);
        assert_eq!(harness.store.notes(order_id).len(), 1);
    }

    #[tokio::test]
    async fn test_already_completed_order_is_rejected() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20.00", OrderStatus::Completed);

        let outcome = harness
            .deliver(harness.signed(&body("abc123", "20.00", "completed")))
            .await;

        assert_eq!(
            outcome,
            WebhookOutcome::Rejected(OrderMismatch::AlreadyCompleted.into())
        );
        assert_eq!(harness.store.payment_completions(order_id), 0);
        assert!(harness.store.notes(order_id).is_empty());
    }

    #[tokio::test]
    async fn test_bad_signature_never_mutates() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20.00", OrderStatus::Pending);

        let mut forged = harness.signed(&body("abc123", "20.00", "completed"));
        forged.signature = Some(signature::compute_signature(
            b"guessed-key",
            CALLBACK_URL,
            &forged.body,
        ));
        let unsigned = InboundWebhook {
            signature: None,
            ..harness.signed(&body("abc123", "20.00", "completed"))
        };

        assert_eq!(
            harness.deliver(forged).await,
            WebhookOutcome::Rejected(SignatureError::SignatureMismatch.into())
        );
        assert_eq!(
            harness.deliver(unsigned).await,
            WebhookOutcome::Rejected(SignatureError::MissingHeader.into())
        );
        assert_eq!(harness.status(order_id), OrderStatus::Pending);
        assert!(harness.store.notes(order_id).is_empty());
    }

    #[tokio::test]
    async fn test_amount_mismatch_is_rejected() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "49.99", OrderStatus::Pending);

        let outcome = harness
            .deliver(harness.signed(&body("abc123", "50.00", "completed")))
            .await;

        assert_eq!(
            outcome,
            WebhookOutcome::Rejected(
                OrderMismatch::AmountMismatch {
                    expected: Decimal::from_str("49.99").unwrap(),
                    received: Decimal::from_str("50.00").unwrap(),
                }
                .into()
            )
        );
        assert_eq!(harness.status(order_id), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_amount_scale_does_not_matter() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20", OrderStatus::Pending);

        let outcome = harness
            .deliver(harness.signed(
                r#"{"reference_id":"abc123","amount":20.0,"currency":"usd","status":"pending"}"#,
            ))
            .await;

        assert!(outcome.is_applied());
        assert_eq!(harness.status(order_id), OrderStatus::OnHold);
    }

    #[tokio::test]
    async fn test_currency_mismatch_is_rejected() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20.00", OrderStatus::Pending);

        let outcome = harness
            .deliver(harness.signed(
                r#"{"reference_id":"abc123","amount":"20.00","currency":"EUR","status":"completed"}"#,
            ))
            .await;

        assert!(matches!(
            outcome,
            WebhookOutcome::Rejected(WebhookRejection::OrderMismatch(
                OrderMismatch::CurrencyMismatch { .. }
            ))
        ));
        assert_eq!(harness.status(order_id), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_order_and_malformed_body() {
        let harness = Harness::new();

        assert_eq!(
            harness
                .deliver(harness.signed(&body("nope", "20.00", "completed")))
                .await,
            WebhookOutcome::Rejected(OrderMismatch::UnknownOrder.into())
        );
        assert!(matches!(
            harness.deliver(harness.signed("{\"status\":")).await,
            WebhookOutcome::Rejected(WebhookRejection::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_status_is_a_logged_no_op() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20.00", OrderStatus::OnHold);

        let outcome = harness
            .deliver(harness.signed(&body("abc123", "20.00", "refunded")))
            .await;

        assert_eq!(
            outcome,
            WebhookOutcome::Ignored {
                order_id,
                status: "refunded".to_string()
            }
        );
        assert_eq!(harness.status(order_id), OrderStatus::OnHold);
        assert!(harness.store.notes(order_id).is_empty());

        let entries = harness.log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, Some(outcome));
    }

    #[tokio::test]
    async fn test_on_hold_order_can_complete_later() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "20.00", OrderStatus::Pending);

        harness
            .deliver(harness.signed(&body("abc123", "20.00", "pending")))
            .await;
        let outcome = harness
            .deliver(harness.signed(&body("abc123", "20.00", "completed")))
            .await;

        assert!(outcome.is_applied());
        assert_eq!(harness.status(order_id), OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_rejections_are_logged_with_signatures() {
        let harness = Harness::new();
        harness.order("abc123", "20.00", OrderStatus::Pending);
        let payload = body("abc123", "20.00", "completed");

        let mut webhook = harness.signed(&payload);
        webhook.signature = Some("00".repeat(32));
        harness.deliver(webhook).await;

        let entries = harness.log.entries();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.reference_id.as_deref(), Some("abc123"));
        assert_eq!(entry.payload, payload);
        assert_eq!(entry.received_signature, Some("00".repeat(32)));
        assert_eq!(
            entry.computed_signature.as_deref(),
            Some(signature::compute_signature(SECRET, CALLBACK_URL, payload.as_bytes()).as_str())
        );
        assert!(matches!(
            entry.outcome,
            Some(WebhookOutcome::Rejected(WebhookRejection::Signature(_)))
        ));
    }

    #[tokio::test]
    async fn test_checkout_amount_is_accepted_back() {
        let harness = Harness::new();
        let order_id = harness.order("abc123", "49.995", OrderStatus::Pending);
        let order = harness.store.order(order_id).unwrap();

        let request = build_checkout(&order, &harness.config).unwrap();
        let (_, amount) = request
            .form_fields()
            .into_iter()
            .find(|(name, _)| *name == "amount")
            .unwrap();
        assert_eq!(amount, "50.00");

        let outcome = harness
            .deliver(harness.signed(&body("abc123", &amount, "completed")))
            .await;

        assert!(outcome.is_applied());
        assert_eq!(harness.status(order_id), OrderStatus::Completed);
    }

    struct FailingOrderStore;

    #[async_trait::async_trait]
    impl OrderStore for FailingOrderStore {
        async fn find_by_reference(&self, _: &str) -> Result<Option<Order>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn complete_payment(&self, _: Uuid, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn transition(&self, _: Uuid, _: OrderStatus, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_rejected_and_logged() {
        let harness = Harness::new();
        let log = Arc::new(MemoryWebhookLog::new());
        let processor = WebhookProcessor::new(Arc::new(FailingOrderStore), log.clone());

        let outcome = match processor
            .process(harness.signed(&body("abc123", "20.00", "completed")))
            .await
        {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        };

        assert!(matches!(
            outcome,
            WebhookOutcome::Rejected(WebhookRejection::Store(_))
        ));
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].reference_id.as_deref(), Some("abc123"));
        assert_eq!(entries[0].order_id, None);
        assert_eq!(entries[0].outcome, Some(outcome));
    }
}
