//! Configuration module for waave-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::{FileConfig, GatewayConfig as FileGatewayConfig};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;
use url::Url;
use waave_core::config::{
    ConfigurationError, GatewayConfig, ServerConfig, SharedConfig, UrlTemplate,
};
use waave_sdk::objects::{CALLBACK_PATH, Environment};

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("gateway configuration error: {0}")]
    Gateway(#[from] ConfigurationError),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.gateway)
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the runtime configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;
        build_loaded_config(file_config)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let public_url = &config.server.public_url;
        if !matches!(public_url.scheme(), "http" | "https") || public_url.cannot_be_a_base() {
            return Err(ConfigError::ValidationError(format!(
                "public_url must be an absolute http(s) URL, got {public_url}"
            )));
        }

        let gateway = &config.gateway;
        if gateway.enabled {
            if gateway.access_key.trim().is_empty() || gateway.venue_id.trim().is_empty() {
                tracing::warn!(
                    "Waave is enabled but access_key or venue_id is empty; checkout will fail"
                );
            }
            if gateway.private_key.is_empty() {
                tracing::warn!("Waave private_key is empty; every callback will be rejected");
            }
        }
        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig) -> Result<LoadedConfig, ConfigError> {
    let callback_url = callback_url(&file_config.server.public_url)?;
    let gateway = convert_gateway(file_config.gateway, callback_url)?;

    Ok(LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
            public_url: file_config.server.public_url,
        },
        gateway,
    })
}

/// The absolute URL Waave posts callbacks to.
///
/// The callback path is resolved under `public_url`, so a shop served from a
/// sub-directory keeps its prefix.
pub fn callback_url(public_url: &Url) -> Result<Url, ConfigError> {
    let mut base = public_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(CALLBACK_PATH.trim_start_matches('/'))
        .map_err(|e| ConfigError::ValidationError(format!("invalid callback url: {e}")))
}

fn convert_gateway(
    g: FileGatewayConfig,
    callback_url: Url,
) -> Result<GatewayConfig, ConfigurationError> {
    let return_url = g
        .return_url
        .map(|template| UrlTemplate::parse("return", template))
        .transpose()?;
    let cancel_url = g
        .cancel_url
        .map(|template| UrlTemplate::parse("cancel", template))
        .transpose()?;

    Ok(GatewayConfig {
        enabled: g.enabled,
        environment: Environment::from_sandbox_flag(g.sandbox),
        access_key: g.access_key,
        private_key: g.private_key.into_bytes().into_boxed_slice(),
        venue_id: g.venue_id,
        callback_url,
        return_url,
        cancel_url,
    })
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
