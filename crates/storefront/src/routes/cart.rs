//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart itself lives in the session; handlers load it, apply one core
//! operation, persist, and return a fragment. Every surface that shows
//! money (page, items fragment, floating bar) renders from the same
//! [`CartView`], which in turn derives everything from the one shipping
//! policy - the totals cannot disagree between surfaces.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tabletop_reboxing_core::types::ProductId;
use tabletop_reboxing_core::{Cart, ShippingPolicy};

use crate::filters;
use crate::services::cart::CartSession;
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
    pub customization: Option<String>,
}

/// Cart display data for templates.
///
/// All money fields are preformatted strings so templates stay dumb.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    /// `₹120` below the threshold, `Free` at or above it.
    pub shipping: String,
    pub shipping_is_free: bool,
    pub grand_total: String,
    pub amount_to_free_shipping: String,
    /// Whether the free-shipping nudge strip should show.
    pub below_free_shipping: bool,
}

impl CartView {
    /// Create an empty cart view.
    #[must_use]
    pub fn empty(policy: ShippingPolicy) -> Self {
        Self::from_cart(&Cart::new(), policy)
    }

    /// Derive every displayed figure from the cart and the one policy.
    #[must_use]
    pub fn from_cart(cart: &Cart, policy: ShippingPolicy) -> Self {
        let subtotal = cart.subtotal();
        let shipping = policy.charge(subtotal);
        let to_free = policy.amount_to_free_shipping(subtotal);

        Self {
            items: cart
                .lines()
                .iter()
                .map(|line| CartItemView {
                    id: line.product_id.to_string(),
                    name: line.name.clone(),
                    image: line.image.clone(),
                    quantity: line.quantity,
                    price: line.price.to_string(),
                    line_total: line.line_total().to_string(),
                    customization: line.customization.clone(),
                })
                .collect(),
            item_count: cart.item_count(),
            subtotal: subtotal.to_string(),
            shipping: if shipping.is_zero() {
                "Free".to_owned()
            } else {
                shipping.to_string()
            },
            shipping_is_free: shipping.is_zero(),
            grand_total: policy.grand_total(subtotal).to_string(),
            amount_to_free_shipping: to_free.to_string(),
            below_free_shipping: !cart.is_empty() && !to_free.is_zero(),
        }
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
    pub customization: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    /// Absolute quantity; zero or negative removes the line.
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/cart.html")]
pub struct CartPageTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Floating cart bar fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_bar.html")]
pub struct CartBarTemplate {
    pub cart: CartView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Response {
    let policy = state.config().shipping;
    let cart = match CartSession::new(session).load().await {
        Ok(cart) => CartView::from_cart(&cart, policy),
        Err(e) => {
            tracing::warn!("Failed to load cart: {e}");
            CartView::empty(policy)
        }
    };

    CartPageTemplate { cart }.into_response()
}

/// Add item to cart (HTMX).
///
/// Merges by product id and snapshots name/price/image from the catalog.
/// Returns the cart count badge plus an `HX-Trigger` so other fragments
/// (items list, floating bar) refresh themselves.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    let Some(product) = state.catalog().product(&product_id) else {
        return (
            StatusCode::NOT_FOUND,
            Html("<span class=\"cart-error\">Product not found</span>"),
        )
            .into_response();
    };
    if !product.is_purchasable() {
        return (
            StatusCode::CONFLICT,
            Html("<span class=\"cart-error\">Currently unavailable</span>"),
        )
            .into_response();
    }

    let customization = form
        .customization
        .map(|note| note.trim().to_owned())
        .filter(|note| !note.is_empty());

    let result = CartSession::new(session)
        .add(product, form.quantity.unwrap_or(1), customization)
        .await;

    match result {
        Ok(cart) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to add item to cart: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<span class=\"cart-error\">Error adding to cart</span>"),
            )
                .into_response()
        }
    }
}

/// Update cart item quantity (HTMX).
///
/// The quantity is absolute; zero or negative removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let policy = state.config().shipping;
    let product_id = ProductId::new(form.product_id);

    match CartSession::new(session)
        .set_quantity(&product_id, form.quantity)
        .await
    {
        Ok(cart) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate {
                cart: CartView::from_cart(&cart, policy),
            },
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to update cart: {e}");
            CartItemsTemplate {
                cart: CartView::empty(policy),
            }
            .into_response()
        }
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let policy = state.config().shipping;
    let product_id = ProductId::new(form.product_id);

    match CartSession::new(session).remove(&product_id).await {
        Ok(cart) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartItemsTemplate {
                cart: CartView::from_cart(&cart, policy),
            },
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to remove from cart: {e}");
            CartItemsTemplate {
                cart: CartView::empty(policy),
            }
            .into_response()
        }
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> impl IntoResponse {
    let count = CartSession::new(session)
        .load()
        .await
        .map(|cart| cart.item_count())
        .unwrap_or(0);

    CartCountTemplate { count }
}

/// Get the floating cart bar fragment (HTMX).
///
/// Renders empty when the cart is empty; the template handles hiding.
#[instrument(skip(state, session))]
pub async fn bar(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let policy = state.config().shipping;
    let cart = CartSession::new(session)
        .load()
        .await
        .map_or_else(|_| CartView::empty(policy), |c| CartView::from_cart(&c, policy));

    CartBarTemplate { cart }
}
