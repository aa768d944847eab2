use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::catalog::{CategoryList, PostReviewRequest, ProductDetail, ProductList},
    entity::{
        categories::{Entity as Categories, Model as CategoryModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        reviews::{Column as ReviewCol, Entity as Reviews, Model as ReviewModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Category, Product, Review},
    response::{ApiResponse, Meta},
    routes::params::{CatalogSort, ProductQuery},
    state::AppState,
};

/// Home listing: optional category filter, substring search on name or
/// description, and the storefront sort options.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.normalize();
    let mut condition = Condition::all();

    if let Some(category_id) = query.category {
        condition = condition.add(ProdCol::CategoryId.eq(category_id));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProdCol::Name).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Description).ilike(pattern)),
        );
    }

    let mut finder = Products::find().filter(condition);
    finder = match query.sort {
        Some(CatalogSort::PriceAsc) => finder.order_by_asc(ProdCol::Price),
        Some(CatalogSort::PriceDesc) => finder.order_by_desc(ProdCol::Price),
        Some(CatalogSort::Newest) | None => finder.order_by_desc(ProdCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

/// Product page: the product, up to four others from the same category, and
/// the five most recent reviews.
pub async fn get_product_detail(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id).one(&state.orm).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let similar = Products::find()
        .filter(ProdCol::CategoryId.eq(product.category_id))
        .filter(ProdCol::Id.ne(product.id))
        .limit(4)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let reviews = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product.id))
        .order_by_desc(ReviewCol::CreatedAt)
        .limit(5)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    let data = ProductDetail {
        product: product_from_entity(product),
        similar,
        reviews,
    };
    Ok(ApiResponse::success("Product", data, None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        None,
    ))
}

/// Append-only review submission; duplicates per (user, product) are allowed
/// and the rating scale is advisory, matching the documented data model.
pub async fn post_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: PostReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let product_exist = Products::find_by_id(product_id).one(&state.orm).await?;
    if product_exist.is_none() {
        return Err(AppError::NotFound);
    }

    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (id, user_id, product_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(product_id)
    .bind(payload.rating)
    .bind(payload.comment)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_post",
        Some("reviews"),
        Some(serde_json::json!({ "product_id": product_id, "rating": review.rating })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Review posted", review, None))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        promo_price: model.promo_price,
        stock: model.stock,
        image_url: model.image_url,
        category_id: model.category_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        user_id: model.user_id,
        product_id: model.product_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
