//! TOML file configuration structures.
//!
//! These structs directly map to the `waave-config.toml` file format.

use serde::Deserialize;
use std::net::SocketAddr;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port to listen on (e.g., "0.0.0.0:8080").
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
    /// Public base URL of the shop; the Waave callback URL is derived from it.
    pub public_url: Url,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Waave gateway section.
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// Offer Waave at checkout.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Send shoppers to the staging host instead of production.
    #[serde(default = "default_true")]
    pub sandbox: bool,
    #[serde(default)]
    pub access_key: String,
    /// Key shared with Waave for callback signatures.
    #[serde(default)]
    pub private_key: String,
    #[serde(default)]
    pub venue_id: String,
    /// Return URL template; `{reference_id}` is replaced with the order key.
    pub return_url: Option<String>,
    /// Cancel URL template; `{reference_id}` is replaced with the order key.
    pub cancel_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sandbox: true,
            access_key: String::new(),
            private_key: String::new(),
            venue_id: String::new(),
            return_url: None,
            cancel_url: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("enabled", &self.enabled)
            .field("sandbox", &self.sandbox)
            .field("access_key", &self.access_key)
            .field("private_key", &"<redacted>")
            .field("venue_id", &self.venue_id)
            .field("return_url", &self.return_url)
            .field("cancel_url", &self.cancel_url)
            .finish()
    }
}

fn default_true() -> bool {
    true
}
