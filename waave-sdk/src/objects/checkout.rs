//! Checkout request handed to the Waave hosted payment page.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

/// Hosted checkout page for live payments.
pub const PRODUCTION_CHECKOUT_URL: &str = "https://pg.getwaave.co/waavepay/checkout";

/// Hosted checkout page on the staging host.
pub const SANDBOX_CHECKOUT_URL: &str = "https://staging-pg.getwaave.co/waavepay/checkout";

/// Which Waave host receives the checkout form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub fn from_sandbox_flag(sandbox: bool) -> Self {
        if sandbox {
            Environment::Sandbox
        } else {
            Environment::Production
        }
    }

    pub fn checkout_url(self) -> &'static str {
        match self {
            Environment::Sandbox => SANDBOX_CHECKOUT_URL,
            Environment::Production => PRODUCTION_CHECKOUT_URL,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Sandbox => write!(f, "sandbox"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Parameters submitted to the hosted payment page as a GET form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Merchant access key issued by Waave.
    pub access_key: String,
    /// Where the shopper lands after paying.
    pub return_url: Url,
    /// Where the shopper lands after abandoning payment.
    pub cancel_url: Url,
    /// Where Waave posts the payment outcome.
    pub callback_url: Url,
    /// Order total in `currency`.
    pub amount: Decimal,
    /// Order key, echoed back in the callback.
    pub reference_id: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Merchant venue identifier issued by Waave.
    pub venue_id: String,
}

impl CheckoutRequest {
    /// Form fields in the order the hosted page expects them.
    pub fn form_fields(&self) -> [(&'static str, String); 8] {
        [
            ("access_key", self.access_key.clone()),
            ("return_url", self.return_url.to_string()),
            ("cancel_url", self.cancel_url.to_string()),
            ("callback_url", self.callback_url.to_string()),
            ("amount", format_amount(self.amount, &self.currency)),
            ("reference_id", self.reference_id.clone()),
            ("currency", self.currency.clone()),
            ("venue_id", self.venue_id.clone()),
        ]
    }

    /// The hosted page URL with every form field in its query string.
    pub fn redirect_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(endpoint, self.form_fields())
    }
}

/// Number of minor-unit digits for an ISO 4217 currency code.
pub fn minor_units(currency: &str) -> u32 {
    match currency.to_ascii_uppercase().as_str() {
        "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF" | "UGX"
        | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
        "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
        _ => 2,
    }
}

/// Round an amount to the currency's minor units, as sent to the hosted page.
pub fn round_amount(amount: Decimal, currency: &str) -> Decimal {
    let scale = minor_units(currency);
    let mut rounded = amount.round_dp(scale);
    rounded.rescale(scale);
    rounded
}

/// Render an amount with exactly the currency's minor-unit digits.
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    round_amount(amount, currency).to_string()
}
