//! Regional payment-gateway client. Sessions are created with a synchronous
//! JSON POST; completion is confirmed by re-querying the gateway from the
//! notify handler instead of trusting the browser redirect.

use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use crate::config::PaymentConfig;
use crate::error::{AppError, AppResult};

/// Fixed short timeout on the outbound calls; the gateway is the only
/// provider the original contacted synchronously.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway transaction ids are the order id with a fixed prefix.
pub fn transaction_id(order_id: Uuid) -> String {
    format!("CMD{order_id}")
}

/// Recover the order id from a notify callback's transaction id.
pub fn order_id_from_transaction(transaction_id: &str) -> Option<Uuid> {
    transaction_id
        .strip_prefix("CMD")
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

/// Create a payment session and return the URL to redirect the browser to.
/// A missing `payment_url` in the response body carries the raw provider
/// payload back to the caller.
pub async fn create_payment_session(
    http: &reqwest::Client,
    config: &PaymentConfig,
    order_id: Uuid,
    amount: i64,
    return_url: &str,
    notify_url: &str,
) -> AppResult<String> {
    let url = format!("{}/payment", config.cinetpay_base_url);
    let body = json!({
        "apikey": config.cinetpay_api_key,
        "site_id": config.cinetpay_site_id,
        "transaction_id": transaction_id(order_id),
        "amount": amount,
        "currency": config.currency,
        "description": format!("Payment for order #{order_id}"),
        "return_url": return_url,
        "notify_url": notify_url,
    });

    let resp: serde_json::Value = http
        .post(&url)
        .timeout(GATEWAY_TIMEOUT)
        .json(&body)
        .send()
        .await
        .map_err(|e| AppError::Provider(e.to_string()))?
        .json()
        .await
        .map_err(|e| AppError::Provider(e.to_string()))?;

    resp["payment_url"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| AppError::Provider(format!("no payment URL in gateway response: {resp}")))
}

#[derive(Debug)]
pub struct GatewayStatus {
    pub accepted: bool,
    pub amount: i64,
}

/// Ask the gateway for the authoritative state of a transaction. Used by the
/// notify handler so that an unauthenticated callback alone never marks an
/// order paid.
pub async fn check_transaction(
    http: &reqwest::Client,
    config: &PaymentConfig,
    transaction_id: &str,
) -> AppResult<GatewayStatus> {
    let url = format!("{}/payment/check", config.cinetpay_base_url);
    let body = json!({
        "apikey": config.cinetpay_api_key,
        "site_id": config.cinetpay_site_id,
        "transaction_id": transaction_id,
    });

    let resp: serde_json::Value = http
        .post(&url)
        .timeout(GATEWAY_TIMEOUT)
        .json(&body)
        .send()
        .await
        .map_err(|e| AppError::Provider(e.to_string()))?
        .json()
        .await
        .map_err(|e| AppError::Provider(e.to_string()))?;

    let status = resp["data"]["status"].as_str().unwrap_or_default();
    let amount = resp["data"]["amount"].as_i64().unwrap_or_default();

    Ok(GatewayStatus {
        accepted: status == "ACCEPTED",
        amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_round_trips() {
        let order_id = Uuid::new_v4();
        let tx = transaction_id(order_id);
        assert_eq!(order_id_from_transaction(&tx), Some(order_id));
    }

    #[test]
    fn rejects_foreign_transaction_ids() {
        assert_eq!(order_id_from_transaction("INV-123"), None);
        assert_eq!(order_id_from_transaction("CMDnot-a-uuid"), None);
    }
}
