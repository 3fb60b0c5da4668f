use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use waave_core::config::ConfigurationError;
use waave_core::entities::OrderStatus;
use waave_core::processors::build_checkout;
use waave_core::store::StoreError;

use crate::state::AppState;

/// `GET /checkout/{reference_id}`: send the shopper to the Waave hosted page.
///
/// Builds the checkout request for the order and answers `303 See Other`
/// with every form field in the hosted page's query string.
pub(super) async fn checkout_redirect(
    State(state): State<AppState>,
    Path(reference_id): Path<String>,
) -> Result<Redirect, CheckoutApiError> {
    let config = state.gateway().await;
    if !config.enabled {
        return Err(CheckoutApiError::Disabled);
    }

    let order = state
        .store
        .find_by_reference(&reference_id)
        .await
        .map_err(CheckoutApiError::Store)?
        .ok_or(CheckoutApiError::NotFound)?;

    if order.status == OrderStatus::Completed {
        return Err(CheckoutApiError::AlreadyPaid);
    }

    let request = build_checkout(&order, &config).map_err(CheckoutApiError::Configuration)?;
    let url = request
        .redirect_url(config.checkout_endpoint())
        .map_err(CheckoutApiError::Endpoint)?;

    tracing::info!(
        reference_id = %order.order_key,
        environment = %config.environment,
        "Redirecting to Waave checkout"
    );
    Ok(Redirect::to(url.as_str()))
}

/// Errors that can occur while starting a checkout.
#[derive(Debug)]
pub(super) enum CheckoutApiError {
    /// Waave is switched off in the configuration.
    Disabled,
    /// No order carries this reference id.
    NotFound,
    /// The order has already been paid.
    AlreadyPaid,
    /// Reading the order failed.
    Store(StoreError),
    /// Required gateway settings are missing.
    Configuration(ConfigurationError),
    /// The hosted page URL could not be assembled.
    Endpoint(url::ParseError),
}

impl IntoResponse for CheckoutApiError {
    fn into_response(self) -> Response {
        match self {
            CheckoutApiError::Disabled => {
                (StatusCode::SERVICE_UNAVAILABLE, "payment method unavailable").into_response()
            }
            CheckoutApiError::NotFound => {
                (StatusCode::NOT_FOUND, "order not found").into_response()
            }
            CheckoutApiError::AlreadyPaid => {
                (StatusCode::CONFLICT, "order is already paid").into_response()
            }
            CheckoutApiError::Store(e) => {
                tracing::error!(error = %e, "Checkout order lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            CheckoutApiError::Configuration(e) => {
                tracing::error!(error = %e, "Waave checkout is misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            CheckoutApiError::Endpoint(e) => {
                tracing::error!(error = %e, "Failed to build Waave checkout URL");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
