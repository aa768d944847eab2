use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{
        CheckoutSessionEvent, GatewayNotifyRequest, PayOrderRequest, PayOrderResponse,
        PaymentMethod, PaymentPage,
    },
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        orders::{ActiveModel as OrderActive, Entity as Orders},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments,
                   Model as PaymentModel},
        products::{ActiveModel as ProductActive, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Payment,
    providers::{cinetpay, stripe},
    response::{ApiResponse, Meta},
    services::order_service::{load_order_for_user, order_total},
    state::AppState,
};

/// Data the payment page renders: totals plus the chat-payment contact
/// details with a prefilled message.
pub async fn payment_page(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<PaymentPage>> {
    let (order, items) = load_order_for_user(&state.orm, user.user_id, order_id).await?;
    let total = order_total(&items);
    let payments = &state.config.payments;

    let chat_message = format!(
        "Please contact us before paying by mobile money. Order #{}, amount: {} {}",
        order.id, total, payments.currency
    );
    let chat_numbers = payments
        .chat_numbers
        .iter()
        .map(|n| n.replace(' ', "").replace('+', ""))
        .collect();

    let data = PaymentPage {
        order,
        total,
        currency: payments.currency.clone(),
        chat_numbers,
        chat_message,
    };
    Ok(ApiResponse::success("Payment", data, None))
}

/// Route an order to one of the three payment paths. Methods are mutually
/// exclusive per attempt and a provider failure leaves the order pending and
/// payable by any method.
pub async fn pay(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<PayOrderResponse>> {
    let (order, items) = load_order_for_user(&state.orm, user.user_id, order_id).await?;
    if order.paid {
        return Err(AppError::BadRequest("Order already paid".into()));
    }
    let total = order_total(&items);
    let base = &state.config.public_base_url;
    let return_url = format!("{base}/api/orders/{order_id}/payment-return");

    let response = match payload.method {
        PaymentMethod::Card => {
            let cancel_url = format!("{base}/api/orders/{order_id}/payment");
            let url = stripe::create_checkout_session(
                &state.http,
                &state.config.payments.stripe_secret_key,
                order_id,
                total,
                &state.config.payments.currency,
                &return_url,
                &cancel_url,
            )
            .await?;
            PayOrderResponse {
                redirect_url: Some(url),
                payment: None,
            }
        }
        PaymentMethod::Gateway => {
            let notify_url = format!("{base}/api/payments/gateway/notify");
            let url = cinetpay::create_payment_session(
                &state.http,
                &state.config.payments,
                order_id,
                total,
                &return_url,
                &notify_url,
            )
            .await?;
            PayOrderResponse {
                redirect_url: Some(url),
                payment: None,
            }
        }
        PaymentMethod::Chat => {
            if !payload.confirmed {
                return Err(AppError::BadRequest(
                    "You must chat with us first, then tick the confirmation box".into(),
                ));
            }
            let payment = settle_order(state, order_id, "chat").await?;
            PayOrderResponse {
                redirect_url: None,
                payment: Some(payment),
            }
        }
    };

    Ok(ApiResponse::success("OK", response, Some(Meta::empty())))
}

/// Card-processor webhook: the only path that may complete a card payment.
/// The signature is verified before the body is even parsed, and the event
/// amount must match the stored order total.
pub async fn handle_card_webhook(
    state: &AppState,
    sig_header: &str,
    body: &[u8],
) -> AppResult<()> {
    stripe::verify_webhook_signature(body, sig_header, &state.config.payments.stripe_webhook_secret)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let event: CheckoutSessionEvent = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("malformed event: {e}")))?;

    if event.event_type != "checkout.session.completed" {
        tracing::debug!(event_type = %event.event_type, "ignoring webhook event");
        return Ok(());
    }

    let session = event.data.object;
    let order_id = session
        .metadata
        .get("order_id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| AppError::BadRequest("event carries no order id".into()))?;

    verify_amount(state, order_id, session.amount_total).await?;
    settle_order(state, order_id, "online").await?;
    Ok(())
}

/// Gateway notify callback: never trusted on its own. The transaction is
/// re-queried from the provider and must be accepted with the exact order
/// amount before the order transitions.
pub async fn handle_gateway_notify(
    state: &AppState,
    payload: GatewayNotifyRequest,
) -> AppResult<()> {
    let order_id = cinetpay::order_id_from_transaction(&payload.transaction_id)
        .ok_or_else(|| AppError::BadRequest("unknown transaction id".into()))?;

    let status = cinetpay::check_transaction(
        &state.http,
        &state.config.payments,
        &payload.transaction_id,
    )
    .await?;

    if !status.accepted {
        return Err(AppError::BadRequest("transaction not accepted".into()));
    }

    verify_amount(state, order_id, status.amount).await?;
    settle_order(state, order_id, "online").await?;
    Ok(())
}

async fn verify_amount(state: &AppState, order_id: Uuid, reported: i64) -> AppResult<()> {
    let order = Orders::find_by_id(order_id).one(&state.orm).await?;
    if order.is_none() {
        return Err(AppError::NotFound);
    }

    let items = crate::entity::OrderItems::find()
        .filter(crate::entity::order_items::Column::OrderId.eq(order_id))
        .all(&state.orm)
        .await?;
    let total: i64 = items
        .iter()
        .map(|i| i.unit_price * i64::from(i.quantity))
        .sum();

    if reported != total {
        return Err(AppError::BadRequest(format!(
            "reported amount {reported} does not match order total {total}"
        )));
    }
    Ok(())
}

/// Single transaction that finishes a successful payment: record the payment,
/// flip paid (status stays pending until fulfilment), move stock, and clear
/// the owner's cart. Idempotent for an already-paid order so provider retries
/// do not fail or double-insert.
pub async fn settle_order(state: &AppState, order_id: Uuid, method: &str) -> AppResult<Payment> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.paid {
        let existing = Payments::find()
            .filter(PaymentCol::OrderId.eq(order.id))
            .one(&txn)
            .await?;
        txn.commit().await?;
        return match existing {
            Some(p) => Ok(payment_from_entity(p)),
            None => Err(AppError::Internal(anyhow::anyhow!(
                "paid order {order_id} has no payment record"
            ))),
        };
    }

    let items = crate::entity::OrderItems::find()
        .filter(crate::entity::order_items::Column::OrderId.eq(order.id))
        .all(&txn)
        .await?;
    let total: i64 = items
        .iter()
        .map(|i| i.unit_price * i64::from(i.quantity))
        .sum();

    // Stock moves here, not at confirmation: two unpaid orders may still race
    // for the same unit, and the loser bottoms out at zero.
    for item in &items {
        let Some(product_id) = item.product_id else {
            continue;
        };
        let product = Products::find_by_id(product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let Some(product) = product else {
            continue;
        };
        let new_stock = (product.stock - item.quantity).max(0);
        let mut active: ProductActive = product.into();
        active.stock = Set(new_stock);
        active.update(&txn).await?;
    }

    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        amount: Set(total),
        method: Set(method.to_string()),
        status: Set("succeeded".into()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let user_id = order.user_id;
    let mut active: OrderActive = order.into();
    active.paid = Set(true);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user_id),
        "payment_recorded",
        Some("payments"),
        Some(serde_json::json!({ "order_id": order_id, "method": method, "amount": total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(payment_from_entity(payment))
}

fn payment_from_entity(model: PaymentModel) -> Payment {
    Payment {
        id: model.id,
        order_id: model.order_id,
        amount: model.amount,
        method: model.method,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
