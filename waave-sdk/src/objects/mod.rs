pub mod checkout;
pub mod webhook;

pub use checkout::{CheckoutRequest, Environment, format_amount, minor_units, round_amount};
pub use webhook::{PaymentStatus, PayloadError, WebhookPayload};

/// Path on the merchant site that receives Waave callbacks.
pub const CALLBACK_PATH: &str = "/wc-api/waave";

/// Literal body acknowledging every callback.
pub const CALLBACK_ACK: &str = "OK";
