use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        AddressList, ConfirmOrderRequest, CreateAddressRequest, OrderList, OrderWithItems,
    },
    entity::{
        addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses,
                    Model as AddressModel},
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
                      Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders,
                 Model as OrderModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Address, Order, OrderItem, unit_price},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    for (field, value) in [
        ("street", &payload.street),
        ("city", &payload.city),
        ("postal_code", &payload.postal_code),
        ("country", &payload.country),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        recipient: Set(payload.recipient),
        phone: Set(payload.phone),
        street: Set(payload.street),
        city: Set(payload.city),
        postal_code: Set(payload.postal_code),
        country: Set(payload.country),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Address created",
        address_from_entity(address),
        None,
    ))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_desc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(address_from_entity)
        .collect();

    Ok(ApiResponse::success("Addresses", AddressList { items }, None))
}

/// Snapshot the cart into a new pending order. The cart is left intact and no
/// stock is reserved; both only move once a payment actually succeeds, so an
/// abandoned payment keeps the cart available for retry.
pub async fn confirm_order(
    state: &AppState,
    user: &AuthUser,
    payload: ConfirmOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let address = Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(payload.address_id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?;
    let address = match address {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        address_id: Set(Some(address.id)),
        paid: Set(false),
        status: Set("pending".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = Products::find_by_id(line.product_id).one(&txn).await?;
        let product = match product {
            Some(p) => p,
            None => return Err(AppError::BadRequest("Cart references a missing product".into())),
        };

        // Price frozen at this instant, promo preferred over list price.
        let frozen = unit_price(product.price, product.promo_price);
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            quantity: Set(line.quantity),
            unit_price: Set(frozen),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_confirm",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let total = order_total(&items);
    Ok(ApiResponse::success(
        "Order created",
        OrderWithItems {
            order: order_from_entity(order),
            items,
            total,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items: orders }, Some(meta)))
}

/// Order confirmation page: one required order id, scoped to the owner.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let (order, items) = load_order_for_user(&state.orm, user.user_id, id).await?;
    let total = order_total(&items);

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order,
            items,
            total,
        },
        Some(Meta::empty()),
    ))
}

pub(crate) async fn load_order_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    order_id: Uuid,
) -> AppResult<(Order, Vec<OrderItem>)> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user_id))
                .add(OrderCol::Id.eq(order_id)),
        )
        .one(conn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok((order_from_entity(order), items))
}

/// Sum of frozen line totals; later catalog price changes never affect it.
pub fn order_total(items: &[OrderItem]) -> i64 {
    items
        .iter()
        .map(|item| item.unit_price * i64::from(item.quantity))
        .sum()
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        address_id: model.address_id,
        paid: model.paid,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        unit_price: model.unit_price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn address_from_entity(model: AddressModel) -> Address {
    Address {
        id: model.id,
        user_id: model.user_id,
        recipient: model.recipient,
        phone: model.phone,
        street: model.street,
        city: model.city,
        postal_code: model.postal_code,
        country: model.country,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(quantity: i32, unit_price: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Some(Uuid::new_v4()),
            quantity,
            unit_price,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn total_sums_frozen_line_prices() {
        // 2 × 800 promo + 1 × 1000 list.
        let items = vec![item(2, 800), item(1, 1000)];
        assert_eq!(order_total(&items), 2600);
    }

    #[test]
    fn total_of_no_items_is_zero() {
        assert_eq!(order_total(&[]), 0);
    }
}
