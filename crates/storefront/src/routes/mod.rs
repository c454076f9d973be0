//! HTTP route handlers for storefront.
//!
//! Form-encoded input, JSON output.
//!
//! # Route Structure
//!
//! ```text
//! # Cart
//! GET  /cart                          - Current cart (empty cart if none)
//! POST /cart/items                    - Add item
//! POST /cart/items/{line}/quantity    - Set quantity (0 removes)
//! POST /cart/items/{line}/remove      - Remove line
//! POST /cart/delivery                 - Switch to delivery
//! POST /cart/pickup                   - Switch to pickup
//! POST /cart/address                  - Assign shipment address
//! POST /cart/clear                    - Forget the cart
//!
//! # Checkout & Orders
//! POST /checkout                      - Pay and convert the cart to an order
//! GET  /orders/active                 - Active order for the session
//! GET  /orders/{id}                   - Order detail
//!
//! # Catalog
//! GET  /products                      - Search (search, taxonomy, page)
//! GET  /products/{id}                 - Product detail
//! GET  /taxonomies                    - Category listing
//! GET  /postal-codes/{code}           - Postal-code lookup
//!
//! # Auth
//! POST /auth/login
//! POST /auth/register
//! POST /auth/logout
//! POST /auth/password-reset
//!
//! # Account (requires auth)
//! GET  /account/addresses             - Address list
//! POST /account/addresses             - Create address
//! POST /account/addresses/{id}        - Update address
//! POST /account/addresses/{id}/delete - Delete address
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod postal;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add_item))
        .route("/items/{line}/quantity", post(cart::adjust_quantity))
        .route("/items/{line}/remove", post(cart::remove_item))
        .route("/delivery", post(cart::delivery))
        .route("/pickup", post(cart::pickup))
        .route("/address", post(cart::assign_address))
        .route("/clear", post(cart::clear))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/active", get(orders::active))
        .route("/{id}", get(orders::show))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/password-reset", post(auth::password_reset))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route("/addresses/{id}", post(account::update_address))
        .route("/addresses/{id}/delete", post(account::delete_address))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .route("/checkout", post(orders::checkout))
        .nest("/orders", order_routes())
        .route("/products", get(catalog::products))
        .route("/products/{id}", get(catalog::product))
        .route("/taxonomies", get(catalog::taxonomies))
        .route("/postal-codes/{code}", get(postal::lookup))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
}
