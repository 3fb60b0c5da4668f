//! Server configuration.

use std::net::SocketAddr;
use url::Url;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The address and port to listen on.
    pub listen: SocketAddr,
    /// Public base URL of the shop, used to derive the callback URL.
    pub public_url: Url,
}
