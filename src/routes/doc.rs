use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        cart::{CartCount, CartLineDto, CartView},
        catalog::{CategoryList, ProductDetail, ProductList},
        contact::ContactMessageList,
        orders::{AddressList, OrderList, OrderWithItems},
        payments::{PayOrderResponse, PaymentPage},
    },
    models::{
        Address, CartItem, Category, ContactMessage, Order, OrderItem, Payment, Product, Review,
        User,
    },
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, catalog, contact, health, orders, params, payments},
    services::admin_service,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        catalog::list_products,
        catalog::get_product,
        catalog::post_review,
        catalog::list_categories,
        cart::cart_list,
        cart::cart_count,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_line,
        orders::create_address,
        orders::list_addresses,
        orders::confirm_order,
        orders::list_orders,
        orders::get_order,
        orders::payment_page,
        orders::pay_order,
        orders::payment_return,
        payments::card_webhook,
        payments::gateway_notify,
        contact::submit_message,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::create_category,
        admin::update_category,
        admin::delete_category,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::list_contact_messages
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            CartItem,
            Address,
            Order,
            OrderItem,
            Payment,
            Review,
            ContactMessage,
            ProductList,
            ProductDetail,
            CategoryList,
            CartView,
            CartLineDto,
            CartCount,
            AddressList,
            OrderList,
            OrderWithItems,
            PaymentPage,
            PayOrderResponse,
            ContactMessageList,
            admin_service::UpdateOrderStatusRequest,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<ProductDetail>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentPage>,
            ApiResponse<PayOrderResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog and review endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Address and order endpoints"),
        (name = "Payments", description = "Payment page, dispatch and provider callbacks"),
        (name = "Contact", description = "Contact form endpoint"),
        (name = "Admin", description = "Admin endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
