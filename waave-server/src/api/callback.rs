use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use kanau::processor::Processor;
use waave_core::processors::InboundWebhook;
use waave_sdk::objects::CALLBACK_ACK;
use waave_sdk::signature::SIGNATURE_HEADER;

use crate::state::AppState;

/// `POST /wc-api/waave`: Waave payment callback.
///
/// The whole pipeline runs before responding. The answer is always
/// `200 OK`; only the log tells accepted and refused callbacks apart.
pub(super) async fn waave_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let webhook = InboundWebhook {
        config: state.gateway().await,
        body,
        signature,
    };

    match state.webhooks.process(webhook).await {
        Ok(outcome) => {
            tracing::debug!(applied = outcome.is_applied(), "Waave callback handled");
        }
        Err(never) => match never {},
    }

    (StatusCode::OK, CALLBACK_ACK)
}
