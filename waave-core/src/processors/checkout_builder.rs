//! Builds the parameters for the Waave hosted checkout page.

use crate::config::{ConfigurationError, GatewayConfig, UrlTemplate};
use crate::entities::Order;
use url::Url;
use waave_sdk::objects::CheckoutRequest;

/// Build the checkout request for `order`.
///
/// Fails before building anything when the access key or venue id is
/// missing, so an incomplete form is never sent to Waave. The order itself
/// is not modified.
pub fn build_checkout(
    order: &Order,
    config: &GatewayConfig,
) -> Result<CheckoutRequest, ConfigurationError> {
    config.ensure_checkout_ready()?;

    let return_url = resolve_url(
        "return",
        config.return_url.as_ref(),
        &order.return_url,
        &order.order_key,
    )?;
    let cancel_url = resolve_url(
        "cancel",
        config.cancel_url.as_ref(),
        &order.cancel_url,
        &order.order_key,
    )?;

    Ok(CheckoutRequest {
        access_key: config.access_key.trim().to_owned(),
        return_url,
        cancel_url,
        callback_url: config.callback_url.clone(),
        amount: order.total,
        reference_id: order.order_key.clone(),
        currency: order.currency.clone(),
        venue_id: config.venue_id.trim().to_owned(),
    })
}

fn resolve_url(
    field: &'static str,
    template: Option<&UrlTemplate>,
    fallback: &str,
    reference_id: &str,
) -> Result<Url, ConfigurationError> {
    let url = match template {
        Some(template) => template.render(reference_id),
        None => Url::parse(fallback),
    };
    url.map_err(|e| ConfigurationError::InvalidUrl {
        field,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::OrderStatus;
    use rust_decimal::Decimal;
    use uuid::Uuid;
    use waave_sdk::objects::Environment;

    fn config() -> GatewayConfig {
        GatewayConfig {
            enabled: true,
            environment: Environment::Production,
            access_key: "ak_live".to_string(),
            private_key: b"key".to_vec().into_boxed_slice(),
            venue_id: "venue-9".to_string(),
            callback_url: Url::parse("https://shop.example.com/wc-api/waave").unwrap(),
            return_url: None,
            cancel_url: None,
        }
    }

    fn order() -> Order {
        let now = time::OffsetDateTime::now_utc();
        Order {
            order_id: Uuid::new_v4(),
            order_key: "wc_order_abc123".to_string(),
            total: Decimal::new(2000, 2),
            currency: "USD".to_string(),
            status: OrderStatus::Pending,
            return_url: "https://shop.example.com/checkout/order-received/7?key=wc_order_abc123"
                .to_string(),
            cancel_url: "https://shop.example.com/cart/?cancel_order=true&order_id=7".to_string(),
            paid_at: None,
            created_at: time::PrimitiveDateTime::new(now.date(), now.time()),
        }
    }

    #[test]
    fn test_build_fills_every_field() {
        let order = order();
        let request = build_checkout(&order, &config()).unwrap();

        assert_eq!(request.access_key, "ak_live");
        assert_eq!(request.venue_id, "venue-9");
        assert_eq!(request.reference_id, "wc_order_abc123");
        assert_eq!(request.amount, Decimal::new(2000, 2));
        assert_eq!(request.currency, "USD");
        assert_eq!(request.return_url.as_str(), order.return_url);
        assert_eq!(request.cancel_url.as_str(), order.cancel_url);
        assert_eq!(
            request.callback_url.as_str(),
            "https://shop.example.com/wc-api/waave"
        );
        assert!(request.form_fields().iter().all(|(_, value)| !value.is_empty()));
    }

    #[test]
    fn test_missing_settings_fail_before_building() {
        let mut config = config();
        config.access_key.clear();
        assert_eq!(
            build_checkout(&order(), &config),
            Err(ConfigurationError::MissingAccessKey)
        );

        let mut config = self::config();
        config.venue_id = " ".to_string();
        assert_eq!(
            build_checkout(&order(), &config),
            Err(ConfigurationError::MissingVenueId)
        );
    }

    #[test]
    fn test_url_templates_override_order_urls() {
        let mut config = config();
        config.return_url = Some(
            UrlTemplate::parse("return", "https://shop.example.com/thanks/{reference_id}").unwrap(),
        );
        let request = build_checkout(&order(), &config).unwrap();
        assert_eq!(
            request.return_url.as_str(),
            "https://shop.example.com/thanks/wc_order_abc123"
        );
        assert_eq!(
            request.cancel_url.as_str(),
            "https://shop.example.com/cart/?cancel_order=true&order_id=7"
        );
    }

    #[test]
    fn test_build_leaves_order_untouched() {
        let order = order();
        let before = order.clone();
        let _ = build_checkout(&order, &config());
        assert_eq!(order, before);
    }
}
