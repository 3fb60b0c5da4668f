//! Configuration types for the Waave gateway.
//!
//! These types represent the validated runtime configuration. Loading and
//! parsing the config file is handled by the server crate.

mod gateway;
mod server;

pub use gateway::{ConfigurationError, GatewayConfig, UrlTemplate};
pub use server::ServerConfig;

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared configuration state with separate locks for each section.
#[derive(Clone)]
pub struct SharedConfig {
    /// Server configuration (listen address, public URL).
    pub server: Arc<RwLock<ServerConfig>>,
    /// Gateway settings. Readers clone the inner `Arc` and keep that
    /// snapshot for the rest of the request.
    pub gateway: Arc<RwLock<Arc<GatewayConfig>>>,
}

impl SharedConfig {
    pub fn new(server: ServerConfig, gateway: GatewayConfig) -> Self {
        Self {
            server: Arc::new(RwLock::new(server)),
            gateway: Arc::new(RwLock::new(Arc::new(gateway))),
        }
    }

    /// Take a snapshot of the current gateway settings.
    pub async fn gateway(&self) -> Arc<GatewayConfig> {
        Arc::clone(&*self.gateway.read().await)
    }

    /// Replace the gateway settings; in-flight requests keep their snapshot.
    pub async fn replace_gateway(&self, gateway: GatewayConfig) {
        *self.gateway.write().await = Arc::new(gateway);
    }
}
