use chrono::DateTime;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartCount, CartLineDto, CartView, UpdateQuantityRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CartLineRow {
    line_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    promo_price: Option<i64>,
    stock: i32,
    image_url: Option<String>,
    category_id: Uuid,
    created_at: DateTime<chrono::Utc>,
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ci.id AS line_id, ci.quantity,
               p.id AS product_id, p.name, p.description, p.price, p.promo_price,
               p.stock, p.image_url, p.category_id, p.created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let mut total: i64 = 0;
    let mut item_count: i64 = 0;
    let items = rows
        .into_iter()
        .map(|row| {
            let product = Product {
                id: row.product_id,
                name: row.name,
                description: row.description,
                price: row.price,
                promo_price: row.promo_price,
                stock: row.stock,
                image_url: row.image_url,
                category_id: row.category_id,
                created_at: row.created_at,
            };
            let line_total = product.effective_price() * i64::from(row.quantity);
            total += line_total;
            item_count += i64::from(row.quantity);
            CartLineDto {
                id: row.line_id,
                product,
                quantity: row.quantity,
                line_total,
            }
        })
        .collect();

    let data = CartView {
        items,
        total,
        item_count,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Badge counter: sum of quantities across the user's cart lines.
pub async fn cart_count(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartCount>> {
    let total: (Option<i64>,) =
        sqlx::query_as("SELECT SUM(quantity)::BIGINT FROM cart_items WHERE user_id = $1")
            .bind(user.user_id)
            .fetch_one(&state.pool)
            .await?;

    let data = CartCount {
        total_items: total.0.unwrap_or(0),
    };
    Ok(ApiResponse::success("OK", data, None))
}

/// Single add-to-cart operation used by every entry point. Policy:
/// increment-by-requested-amount; a missing line is created at the requested
/// quantity.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (user_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Added to cart", cart_item, None))
}

#[derive(FromRow)]
struct LineWithStock {
    stock: i32,
}

/// Quantity ≤ 0 deletes the line. A quantity above the product's current
/// stock is rejected without touching the line.
pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<Option<CartItem>>> {
    let line: Option<LineWithStock> = sqlx::query_as(
        r#"
        SELECT p.stock
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.id = $1 AND ci.user_id = $2
        "#,
    )
    .bind(line_id)
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;

    let line = match line {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };

    if payload.quantity <= 0 {
        sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
            .bind(line_id)
            .bind(user.user_id)
            .execute(&state.pool)
            .await?;
        return Ok(ApiResponse::success(
            "Removed from cart",
            None,
            Some(Meta::empty()),
        ));
    }

    if payload.quantity > line.stock {
        return Err(AppError::BadRequest(format!(
            "Requested quantity ({}) exceeds available stock ({})",
            payload.quantity, line.stock
        )));
    }

    let updated = sqlx::query_as::<_, CartItem>(
        r#"
        UPDATE cart_items
        SET quantity = $3
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(line_id)
    .bind(user.user_id)
    .bind(payload.quantity)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "line_id": line_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Quantity updated", Some(updated), None))
}

pub async fn remove_line(
    state: &AppState,
    user: &AuthUser,
    line_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
        .bind(line_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "line_id": line_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
