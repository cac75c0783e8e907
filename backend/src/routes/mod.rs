//! Route definitions for the Retail Management Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Protected routes
        .nest("/purchases", purchase_routes())
        .nest("/sales", sale_routes())
        .nest("/batches", batch_routes())
        .nest("/inventory", inventory_routes())
}

/// Authentication routes (public, except /me)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route(
            "/me",
            get(handlers::me).route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Purchasing routes (protected)
fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_purchases).post(handlers::create_purchase),
        )
        .route("/return", post(handlers::return_to_supplier))
        .route("/:purchase_id", get(handlers::get_purchase))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Sales routes (protected)
fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route("/shop/:shop_id", get(handlers::sales_by_shop))
        .route("/invoice/:invoice_no", get(handlers::get_sale_by_invoice))
        .route("/:sale_id", get(handlers::get_sale))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Batch routes (protected)
fn batch_routes() -> Router<AppState> {
    Router::new()
        .route("/expiring", get(handlers::expiring_batches))
        .route("/number/:batch_number", get(handlers::get_batch_by_number))
        .route("/product/:product_id", get(handlers::available_batches))
        .route("/:batch_id/history", get(handlers::batch_history))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory routes (protected)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_inventory))
        .route("/adjust", post(handlers::adjust_stock))
        .route("/shop/:shop_id", get(handlers::list_inventory))
        .route("/shop/:shop_id/low-stock", get(handlers::low_stock))
        .route(
            "/:shop_id/:product_id",
            get(handlers::get_inventory),
        )
        .route(
            "/:shop_id/:product_id/movements",
            get(handlers::stock_movements),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
