//! Waave gateway configuration.

use url::Url;
use waave_sdk::objects::Environment;

/// Settings required to talk to Waave.
///
/// Loaded once and shared behind an `Arc`; a reload swaps the whole value.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Whether checkout through Waave is offered at all.
    pub enabled: bool,
    /// Sandbox or production checkout host.
    pub environment: Environment,
    /// Merchant access key sent with every checkout.
    pub access_key: String,
    /// Private key shared with Waave for callback signatures.
    pub private_key: Box<[u8]>,
    /// Merchant venue identifier.
    pub venue_id: String,
    /// Absolute URL Waave posts callbacks to.
    pub callback_url: Url,
    /// Overrides the order's own return URL.
    pub return_url: Option<UrlTemplate>,
    /// Overrides the order's own cancel URL.
    pub cancel_url: Option<UrlTemplate>,
}

impl GatewayConfig {
    /// Get the private key bytes for callback signatures.
    pub fn secret_bytes(&self) -> &[u8] {
        &self.private_key
    }

    /// Hosted checkout page for the configured environment.
    pub fn checkout_endpoint(&self) -> &'static str {
        self.environment.checkout_url()
    }

    /// Fail when the fields Waave needs to accept a checkout are absent.
    pub fn ensure_checkout_ready(&self) -> Result<(), ConfigurationError> {
        if self.access_key.trim().is_empty() {
            return Err(ConfigurationError::MissingAccessKey);
        }
        if self.venue_id.trim().is_empty() {
            return Err(ConfigurationError::MissingVenueId);
        }
        Ok(())
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("enabled", &self.enabled)
            .field("environment", &self.environment)
            .field("access_key", &self.access_key)
            .field("private_key", &"<redacted>")
            .field("venue_id", &self.venue_id)
            .field("callback_url", &self.callback_url.as_str())
            .field("return_url", &self.return_url)
            .field("cancel_url", &self.cancel_url)
            .finish()
    }
}

/// A URL containing an optional `{reference_id}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
}

impl UrlTemplate {
    pub const PLACEHOLDER: &'static str = "{reference_id}";

    /// Validate a template by rendering it with a dummy reference.
    pub fn parse(
        field: &'static str,
        template: impl Into<String>,
    ) -> Result<Self, ConfigurationError> {
        let template = Self {
            template: template.into(),
        };
        template
            .render("reference")
            .map_err(|e| ConfigurationError::InvalidUrl {
                field,
                reason: e.to_string(),
            })?;
        Ok(template)
    }

    /// Substitute the percent-encoded reference id and parse the result.
    pub fn render(&self, reference_id: &str) -> Result<Url, url::ParseError> {
        let rendered = self
            .template
            .replace(Self::PLACEHOLDER, &urlencoding::encode(reference_id));
        Url::parse(&rendered)
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }
}

/// Settings problems that stop a checkout from being built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Waave access key is not configured")]
    MissingAccessKey,
    #[error("Waave venue id is not configured")]
    MissingVenueId,
    #[error("invalid {field} url: {reason}")]
    InvalidUrl { field: &'static str, reason: String },
}
