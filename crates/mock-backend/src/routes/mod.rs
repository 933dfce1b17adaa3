//! HTTP route handlers for the mock backend.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness check (outside the API prefix)
//!
//! # Catalog
//! GET    /products                    - All products (bare array)
//! GET    /products/{id}               - One product
//!
//! # Cart (requires auth)
//! GET    /cart                        - Current cart
//! POST   /cart/items                  - Add a product (form: productId, quantity)
//! PUT    /cart/items/{id}             - Set quantity (form: quantity)
//! DELETE /cart/items/{id}             - Remove a line
//!
//! # Orders (requires auth)
//! POST   /orders                      - Create an order from the cart
//! GET    /orders                      - Order history
//!
//! # Payment (requires auth)
//! POST   /payment/create-intent       - Open an intent (query: orderId)
//! POST   /payment/confirm             - Confirm an intent (form: paymentIntentId)
//!
//! # Users
//! POST   /users/login                 - Exchange credentials for a token
//! GET    /users/profile               - Signed-in user's profile (requires auth)
//! ```

pub mod cart;
pub mod orders;
pub mod payment;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", post(cart::add))
        .route("/items/{id}", put(cart::update).delete(cart::remove))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new().route("/", get(orders::index).post(orders::create))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-intent", post(payment::create_intent))
        .route("/confirm", post(payment::confirm))
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(users::login))
        .route("/profile", get(users::profile))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/payment", payment_routes())
        .nest("/users", user_routes())
}
