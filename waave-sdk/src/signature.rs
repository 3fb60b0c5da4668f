//! Signature algorithm and verification for Waave callbacks.
//!
//! Waave signs every callback with a plain SHA-256 digest over the shared
//! secret, the callback URL it was given at checkout, and the raw request
//! body:
//!
//! ```text
//! X-Api-Signature: hex(SHA-256("{private_key}{callback_url}{raw_body}"))
//! ```
//!
//! The body bytes fed into the digest must be the bytes received on the
//! wire. Parsing and re-serializing the JSON would not preserve key order or
//! number formatting, so callers hash the raw body they also parse.

use subtle::ConstantTimeEq;

/// Header name carrying the callback signature.
pub const SIGNATURE_HEADER: &str = "X-Api-Signature";

/// Errors produced by signature verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing X-Api-Signature header")]
    MissingHeader,
    #[error("invalid hex encoding")]
    InvalidHex,
    #[error("private key is not configured")]
    MissingSecret,
    #[error("invalid signature")]
    SignatureMismatch,
}

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// Compute the raw SHA-256 digest of `secret ‖ callback_url ‖ body`.
pub fn digest(secret: &[u8], callback_url: &str, body: &[u8]) -> ring::digest::Digest {
    let mut context = ring::digest::Context::new(&ring::digest::SHA256);
    context.update(secret);
    context.update(callback_url.as_bytes());
    context.update(body);
    context.finish()
}

/// Compute the lowercase hex signature Waave is expected to send.
pub fn compute_signature(secret: &[u8], callback_url: &str, body: &[u8]) -> String {
    hex::encode(digest(secret, callback_url, body).as_ref())
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Check a received signature header against the expected digest.
///
/// The header is hex-decoded (either case) and compared to the digest in
/// constant time. An empty secret never verifies.
pub fn check_signature(
    body: &[u8],
    callback_url: &str,
    received_signature: Option<&str>,
    secret: &[u8],
) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }
    let received = received_signature.ok_or(SignatureError::MissingHeader)?;
    let received = hex::decode(received.trim()).map_err(|_| SignatureError::InvalidHex)?;

    let expected = digest(secret, callback_url, body);
    if bool::from(expected.as_ref().ct_eq(&received)) {
        Ok(())
    } else {
        Err(SignatureError::SignatureMismatch)
    }
}

/// Boolean form of [`check_signature`].
pub fn verify(
    payload_bytes: &[u8],
    callback_url: &str,
    received_signature: Option<&str>,
    shared_secret: &[u8],
) -> bool {
    check_signature(payload_bytes, callback_url, received_signature, shared_secret).is_ok()
}
