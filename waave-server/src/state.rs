//! Application state shared across all request handlers.

use std::sync::Arc;
use waave_core::config::{GatewayConfig, SharedConfig};
use waave_core::processors::{TracingWebhookLog, WebhookLog, WebhookProcessor};
use waave_core::store::OrderStore;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Orders owned by the shop.
    pub store: Arc<dyn OrderStore>,
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Callback pipeline.
    pub webhooks: WebhookProcessor,
}

impl AppState {
    /// Create a new AppState that logs callbacks through `tracing`.
    pub fn new(store: Arc<dyn OrderStore>, config: SharedConfig) -> Self {
        Self::with_webhook_log(store, config, Arc::new(TracingWebhookLog))
    }

    /// Create a new AppState with a custom callback log.
    pub fn with_webhook_log(
        store: Arc<dyn OrderStore>,
        config: SharedConfig,
        log: Arc<dyn WebhookLog>,
    ) -> Self {
        let webhooks = WebhookProcessor::new(store.clone(), log);
        Self {
            store,
            config,
            webhooks,
        }
    }

    /// Snapshot of the gateway settings for the current request.
    pub async fn gateway(&self) -> Arc<GatewayConfig> {
        self.config.gateway().await
    }
}
