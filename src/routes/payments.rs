use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    routing::post,
};

use crate::{
    dto::payments::GatewayNotifyRequest,
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/card/webhook", post(card_webhook))
        .route("/gateway/notify", post(gateway_notify))
}

/// Card-processor webhook. The body is taken verbatim because the signature
/// is computed over the exact bytes sent.
#[utoipa::path(
    post,
    path = "/api/payments/card/webhook",
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 200, description = "Event processed or ignored"),
        (status = 400, description = "Bad signature or malformed event"),
    ),
    tag = "Payments"
)]
pub async fn card_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let sig_header = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature header".into()))?;

    payment_service::handle_card_webhook(&state, sig_header, body.as_bytes()).await?;

    Ok(Json(ApiResponse::success(
        "OK",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}

/// Server-to-server notify callback from the regional gateway. The payload is
/// only a hint; the transaction is re-checked with the provider before
/// anything changes.
#[utoipa::path(
    post,
    path = "/api/payments/gateway/notify",
    request_body = GatewayNotifyRequest,
    responses(
        (status = 200, description = "Transaction verified and order settled"),
        (status = 400, description = "Unknown, refused or mismatched transaction"),
        (status = 502, description = "Provider unavailable"),
    ),
    tag = "Payments"
)]
pub async fn gateway_notify(
    State(state): State<AppState>,
    Json(payload): Json<GatewayNotifyRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    payment_service::handle_gateway_notify(&state, payload).await?;

    Ok(Json(ApiResponse::success(
        "OK",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
