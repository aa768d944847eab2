use uuid::Uuid;

use crate::{
    dto::contact::ContactRequest,
    error::{AppError, AppResult},
    models::ContactMessage,
    response::ApiResponse,
    state::AppState,
};

pub async fn submit_message(
    state: &AppState,
    payload: ContactRequest,
) -> AppResult<ApiResponse<ContactMessage>> {
    for (field, value) in [
        ("name", &payload.name),
        ("email", &payload.email),
        ("subject", &payload.subject),
        ("body", &payload.body),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }

    let message = sqlx::query_as::<_, ContactMessage>(
        r#"
        INSERT INTO contact_messages (id, name, email, subject, body)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.name)
    .bind(payload.email)
    .bind(payload.subject)
    .bind(payload.body)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Message sent", message, None))
}
