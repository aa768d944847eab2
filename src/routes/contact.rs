use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::contact::ContactRequest,
    error::AppResult,
    models::ContactMessage,
    response::ApiResponse,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(submit_message))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message sent", body = ApiResponse<ContactMessage>),
        (status = 400, description = "Missing required field"),
    ),
    tag = "Contact"
)]
pub async fn submit_message(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> AppResult<Json<ApiResponse<ContactMessage>>> {
    Ok(Json(contact_service::submit_message(&state, payload).await?))
}
