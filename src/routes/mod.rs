use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", catalog::product_router())
        .nest("/categories", catalog::category_router())
        .nest("/auth", auth::router())
        .nest("/cart", cart::router())
        .nest("/addresses", orders::address_router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/contact", contact::router())
        .nest("/admin", admin::router())
}
