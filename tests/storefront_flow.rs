use boutique_api::{
    config::{AppConfig, PaymentConfig},
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        cart::{AddToCartRequest, UpdateQuantityRequest},
        catalog::PostReviewRequest,
        contact::ContactRequest,
        orders::ConfirmOrderRequest,
        payments::{PayOrderRequest, PaymentMethod},
    },
    entity::{
        AuditLogs, Users, addresses::ActiveModel as AddressActive,
        categories::ActiveModel as CategoryActive, products::ActiveModel as ProductActive,
        products::Entity as Products, users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{OrderListQuery, Pagination},
    services::{
        admin_service::{self, UpdateOrderStatusRequest},
        cart_service, catalog_service, contact_service, order_service, payment_service,
    },
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, ModelTrait, Set, Statement};
use uuid::Uuid;

// Full storefront flow: browse, fill the cart, confirm an order, pay through
// the chat path, then admin moves the order along.
#[tokio::test]
async fn cart_checkout_and_chat_payment_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let user_id = create_user(&state, "user", "user@example.com").await?;
    let other_id = create_user(&state, "user", "other@example.com").await?;
    let admin_id = create_user(&state, "admin", "admin@example.com").await?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set("Clothing".into()),
        description: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Promo price takes precedence over the list price everywhere.
    let shirt = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Wax Print Shirt".into()),
        description: Set(Some("Hand-finished shirt".into())),
        price: Set(1000),
        promo_price: Set(Some(800)),
        stock: Set(10),
        image_url: Set(None),
        category_id: Set(category.id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let bag = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set("Leather Handbag".into()),
        description: Set(None),
        price: Set(2000),
        promo_price: Set(None),
        stock: Set(5),
        image_url: Set(None),
        category_id: Set(category.id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let auth_user = AuthUser {
        user_id,
        role: "user".into(),
    };
    let auth_other = AuthUser {
        user_id: other_id,
        role: "user".into(),
    };
    let auth_admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    // Adding the same product twice increments the existing line.
    for _ in 0..2 {
        cart_service::add_to_cart(
            &state,
            &auth_user,
            AddToCartRequest {
                product_id: shirt.id,
                quantity: 1,
            },
        )
        .await?;
    }
    cart_service::add_to_cart(
        &state,
        &auth_user,
        AddToCartRequest {
            product_id: bag.id,
            quantity: 1,
        },
    )
    .await?;

    let count = cart_service::cart_count(&state, &auth_user).await?;
    assert_eq!(count.data.unwrap().total_items, 3);

    let cart = cart_service::list_cart(&state, &auth_user).await?.data.unwrap();
    assert_eq!(cart.total, 2 * 800 + 2000);
    let shirt_line = cart
        .items
        .iter()
        .find(|l| l.product.id == shirt.id)
        .expect("shirt line");
    assert_eq!(shirt_line.quantity, 2);
    assert_eq!(shirt_line.line_total, 1600);

    // Quantity above stock is rejected without touching the line.
    let bag_line_id = cart
        .items
        .iter()
        .find(|l| l.product.id == bag.id)
        .expect("bag line")
        .id;
    let err = cart_service::update_quantity(
        &state,
        &auth_user,
        bag_line_id,
        UpdateQuantityRequest { quantity: 999 },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    cart_service::remove_line(&state, &auth_user, bag_line_id).await?;

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        recipient: Set(Some("A. Client".into())),
        phone: Set(None),
        street: Set("12 Market Street".into()),
        city: Set("Abidjan".into()),
        postal_code: Set("00225".into()),
        country: Set("CI".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    // Someone else's address is invisible, and an empty cart cannot confirm.
    let err = order_service::confirm_order(
        &state,
        &auth_other,
        ConfirmOrderRequest {
            address_id: address.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let other_address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(other_id),
        recipient: Set(None),
        phone: Set(None),
        street: Set("1 Side Street".into()),
        city: Set("Abidjan".into()),
        postal_code: Set("00225".into()),
        country: Set("CI".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    let err = order_service::confirm_order(
        &state,
        &auth_other,
        ConfirmOrderRequest {
            address_id: other_address.id,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let confirmed = order_service::confirm_order(
        &state,
        &auth_user,
        ConfirmOrderRequest {
            address_id: address.id,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(confirmed.order.status, "pending");
    assert!(!confirmed.order.paid);
    assert_eq!(confirmed.total, 1600);
    assert!(confirmed.items.iter().all(|i| i.unit_price == 800));

    // Confirmation leaves the cart alone; abandoning payment costs nothing.
    let cart = cart_service::list_cart(&state, &auth_user).await?.data.unwrap();
    assert_eq!(cart.total, 1600);

    // A later catalog price change must not move the order total.
    let model = Products::find_by_id(shirt.id)
        .one(&state.orm)
        .await?
        .expect("shirt");
    let mut active: ProductActive = model.into();
    active.promo_price = Set(Some(500));
    active.update(&state.orm).await?;

    let order = order_service::get_order(&state, &auth_user, confirmed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(order.total, 1600);

    // Chat payment requires the explicit confirmation flag.
    let err = payment_service::pay(
        &state,
        &auth_user,
        confirmed.order.id,
        PayOrderRequest {
            method: PaymentMethod::Chat,
            confirmed: false,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let page = payment_service::payment_page(&state, &auth_user, confirmed.order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(page.total, 1600);
    assert!(page.chat_message.contains(&confirmed.order.id.to_string()));

    let paid = payment_service::pay(
        &state,
        &auth_user,
        confirmed.order.id,
        PayOrderRequest {
            method: PaymentMethod::Chat,
            confirmed: true,
        },
    )
    .await?
    .data
    .unwrap();
    let payment = paid.payment.expect("chat payment settles synchronously");
    assert_eq!(payment.amount, 1600);
    assert_eq!(payment.method, "chat");

    let order = order_service::get_order(&state, &auth_user, confirmed.order.id)
        .await?
        .data
        .unwrap();
    assert!(order.order.paid);
    assert_eq!(order.order.status, "pending");

    // Settlement clears the cart and moves stock.
    let cart = cart_service::list_cart(&state, &auth_user).await?.data.unwrap();
    assert!(cart.items.is_empty());
    let stock = Products::find_by_id(shirt.id)
        .one(&state.orm)
        .await?
        .expect("shirt")
        .stock;
    assert_eq!(stock, 8);

    // Paying twice is rejected.
    let err = payment_service::pay(
        &state,
        &auth_user,
        confirmed.order.id,
        PayOrderRequest {
            method: PaymentMethod::Chat,
            confirmed: true,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The audit trail ties back to the acting user.
    let user_row = Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .expect("user");
    let trail = user_row.find_related(AuditLogs).all(&state.orm).await?;
    assert!(trail.iter().any(|entry| entry.action == "payment_recorded"));

    // Review lands on the product page.
    catalog_service::post_review(
        &state,
        &auth_user,
        shirt.id,
        PostReviewRequest {
            rating: 5,
            comment: "Lovely fabric".into(),
        },
    )
    .await?;
    let detail = catalog_service::get_product_detail(&state, shirt.id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.reviews.len(), 1);

    // Contact form, then admin reads the inbox.
    contact_service::submit_message(
        &state,
        ContactRequest {
            name: "A. Client".into(),
            email: "user@example.com".into(),
            subject: "Delivery".into(),
            body: "When does my order ship?".into(),
        },
    )
    .await?;
    let inbox = admin_service::list_contact_messages(
        &state,
        &auth_admin,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(inbox.items.len(), 1);

    // Admin moves the order forward; backwards transitions are refused.
    let updated = admin_service::update_order_status(
        &state,
        &auth_admin,
        confirmed.order.id,
        UpdateOrderStatusRequest {
            status: "shipped".into(),
        },
    )
    .await?;
    assert_eq!(updated.data.unwrap().status, "shipped");

    let err = admin_service::update_order_status(
        &state,
        &auth_admin,
        confirmed.order.id,
        UpdateOrderStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Non-admins cannot touch the admin surface.
    let err = admin_service::list_all_orders(
        &state,
        &auth_user,
        OrderListQuery {
            page: None,
            per_page: None,
            status: None,
            sort_order: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE payments, order_items, orders, cart_items, reviews, addresses, contact_messages, audit_logs, products, categories, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        public_base_url: "http://localhost:3000".into(),
        payments: PaymentConfig {
            stripe_secret_key: String::new(),
            stripe_webhook_secret: "whsec_test".into(),
            cinetpay_api_key: String::new(),
            cinetpay_site_id: String::new(),
            cinetpay_base_url: "https://sandbox.cinetpay.com/v1".into(),
            currency: "XOF".into(),
            chat_numbers: vec!["+225 07 00 00 00 01".into()],
        },
    };

    Ok(AppState {
        pool,
        orm,
        http: reqwest::Client::new(),
        config,
    })
}

async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
