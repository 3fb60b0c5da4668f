//! HTTP adapter for the Waave gateway.
//!
//! # Endpoints
//!
//! - `GET  /checkout/{reference_id}`: redirect the shopper to the hosted page
//! - `POST /wc-api/waave`: Waave payment callback

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use waave_sdk::objects::CALLBACK_PATH;

use crate::state::AppState;

mod callback;
mod checkout;

/// Upper bound for callback bodies.
const CALLBACK_BODY_LIMIT: usize = 64 * 1024;

/// Build the gateway router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout/{reference_id}", get(checkout::checkout_redirect))
        .route(
            CALLBACK_PATH,
            post(callback::waave_callback).layer(DefaultBodyLimit::max(CALLBACK_BODY_LIMIT)),
        )
}
