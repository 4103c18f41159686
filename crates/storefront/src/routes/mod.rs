//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /products               - Product listing (optional ?category=)
//! GET  /products/{id}          - Product detail
//! GET  /categories             - Category listing
//! GET  /categories/{id}        - Category detail
//!
//! # Search
//! GET  /search                 - Full search page
//! GET  /search/suggest         - Suggestions fragment (HTMX)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Set absolute quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/bar               - Floating cart bar (fragment)
//!
//! # Checkout
//! GET  /checkout               - Contact/address form (empty cart redirects away)
//! POST /checkout               - Submit form, freeze snapshot
//! GET  /checkout/payment       - UPI payment instructions
//! POST /checkout/payment/confirm - Buyer confirms payment; order placed
//! POST /checkout/payment/cancel  - Back to the form
//! GET  /checkout/success       - Order placed page
//!
//! # Content
//! GET  /pages/{slug}           - Markdown content page
//! ```

pub mod cart;
pub mod categories;
pub mod checkout;
pub mod home;
pub mod pages;
pub mod products;
pub mod search;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{checkout_rate_limiter, create_session_layer, security_headers_middleware};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{id}", get(categories::show))
}

/// Create the search routes router.
pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(search::search_page))
        .route("/suggest", get(search::suggest))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/bar", get(cart::bar))
}

/// Create the checkout routes router.
///
/// Submission and confirmation are rate limited: both can trigger
/// outbound notification traffic.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/payment", get(checkout::payment))
        .route("/payment/confirm", post(checkout::confirm))
        .route("/payment/cancel", post(checkout::cancel))
        .route("/success", get(checkout::success))
        .layer(checkout_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog routes
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        // Search routes
        .nest("/search", search_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
        // Content pages
        .route("/pages/{slug}", get(pages::show))
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Assemble the full application: routes, static files, sessions, tracing
/// and security headers. The binary adds Sentry layers on top.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
