use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, Payment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Hosted checkout with the card processor; completed via webhook.
    Card,
    /// Regional aggregator; completed via its notify callback.
    Gateway,
    /// Out-of-band chat conversation, confirmed synchronously.
    Chat,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayOrderRequest {
    pub method: PaymentMethod,
    /// Required for `chat`: the user asserts the conversation happened.
    #[serde(default)]
    pub confirmed: bool,
}

/// Where the browser should go next. `payment` is only present for the
/// synchronous chat path; card/gateway settle later through callbacks.
#[derive(Debug, Serialize, ToSchema)]
pub struct PayOrderResponse {
    pub redirect_url: Option<String>,
    pub payment: Option<Payment>,
}

/// Everything the payment page needs to render.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentPage {
    pub order: Order,
    pub total: i64,
    pub currency: String,
    pub chat_numbers: Vec<String>,
    pub chat_message: String,
}

/// Card-processor webhook event, decoded after signature verification.
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: CheckoutSessionData,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionData {
    pub object: CheckoutSessionObject,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    pub amount_total: i64,
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GatewayNotifyRequest {
    /// `"CMD" + order id`, as sent when the session was created.
    pub transaction_id: String,
}
