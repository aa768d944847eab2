use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Product, Review};

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

/// Product page payload: the product itself, up to four products from the
/// same category, and the five most recent reviews.
#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub similar: Vec<Product>,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostReviewRequest {
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub promo_price: Option<i64>,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub promo_price: Option<i64>,
    /// Set to drop an existing promotional price.
    #[serde(default)]
    pub clear_promo_price: bool,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}
