//! Card processor integration via its REST API (no SDK dependency).

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const CHECKOUT_SESSIONS_URL: &str = "https://api.stripe.com/v1/checkout/sessions";

/// Create a hosted checkout session for an order and return the URL the
/// browser should be redirected to. The session settles asynchronously; the
/// webhook handler performs the actual order transition.
pub async fn create_checkout_session(
    http: &reqwest::Client,
    secret_key: &str,
    order_id: Uuid,
    amount: i64,
    currency: &str,
    success_url: &str,
    cancel_url: &str,
) -> AppResult<String> {
    let order_ref = format!("Order #{order_id}");
    let amount_str = amount.to_string();
    let order_id_str = order_id.to_string();
    let currency_lower = currency.to_lowercase();

    let resp: serde_json::Value = http
        .post(CHECKOUT_SESSIONS_URL)
        .basic_auth(secret_key, None::<&str>)
        .form(&[
            ("mode", "payment"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price_data][currency]", currency_lower.as_str()),
            ("line_items[0][price_data][unit_amount]", amount_str.as_str()),
            (
                "line_items[0][price_data][product_data][name]",
                order_ref.as_str(),
            ),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
            ("metadata[order_id]", order_id_str.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AppError::Provider(e.to_string()))?
        .json()
        .await
        .map_err(|e| AppError::Provider(e.to_string()))?;

    resp["url"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| AppError::Provider(format!("checkout session creation failed: {resp}")))
}

/// Verify the webhook signature header (`t=<ts>,v1=<hex hmac>`) against the
/// endpoint secret. HMAC-SHA256 over `"<ts>.<payload>"`, constant-time
/// comparison, and a 5-minute replay window.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("invalid signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    let sig_bytes = hex::decode(signature).map_err(|_| "invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "signature mismatch")?;

    let ts: i64 = timestamp.parse().map_err(|_| "invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > 300 {
        return Err("timestamp outside tolerance");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], ts: i64, secret: &str) -> String {
        let signed = format!("{ts}.{}", std::str::from_utf8(payload).unwrap());
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let ts = chrono::Utc::now().timestamp();
        let sig = sign(payload, ts, "whsec_test");
        let header = format!("t={ts},v1={sig}");
        assert!(verify_webhook_signature(payload, &header, "whsec_test").is_ok());
    }

    #[test]
    fn rejects_wrong_secret() {
        let payload = b"{}";
        let ts = chrono::Utc::now().timestamp();
        let sig = sign(payload, ts, "whsec_other");
        let header = format!("t={ts},v1={sig}");
        assert!(verify_webhook_signature(payload, &header, "whsec_test").is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let payload = b"{}";
        let ts = chrono::Utc::now().timestamp() - 3600;
        let sig = sign(payload, ts, "whsec_test");
        let header = format!("t={ts},v1={sig}");
        assert!(verify_webhook_signature(payload, &header, "whsec_test").is_err());
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(verify_webhook_signature(b"{}", "garbage", "whsec_test").is_err());
    }
}
