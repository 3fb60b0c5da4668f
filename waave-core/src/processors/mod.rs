pub mod checkout_builder;
pub mod order_locks;
pub mod webhook_log;
pub mod webhook_processor;

pub use checkout_builder::build_checkout;
pub use order_locks::{OrderGuard, OrderLocks};
pub use webhook_log::{MemoryWebhookLog, TracingWebhookLog, WebhookLog, WebhookLogEntry};
pub use webhook_processor::{
    InboundWebhook, OrderMismatch, Transition, WebhookOutcome, WebhookProcessor,
    WebhookRejection,
};
