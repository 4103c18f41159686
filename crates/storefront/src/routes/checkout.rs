//! Checkout route handlers.
//!
//! The checkout state machine itself lives in the core crate; these
//! handlers persist it in the session and bolt on the three pieces of I/O
//! it deliberately avoids: redirects, order-id generation at the confirm
//! step, and fire-and-forget notification dispatch.
//!
//! Entering checkout with an empty cart is not an error, it is a redirect
//! to the product listing. Dispatch failures never surface to the buyer.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use tabletop_reboxing_core::types::OrderId;
use tabletop_reboxing_core::{
    CheckoutError, CheckoutFlow, CustomerDetails, OrderNotification, OrderSnapshot,
};

use crate::error::Result;
use crate::filters;
use crate::models::session_keys;
use crate::routes::cart::{CartItemView, CartView};
use crate::services::cart::CartSession;
use crate::services::notify::{dispatch_in_background, upi_payment_link, whatsapp_order_link};
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the checkout flow, or a fresh one on first use.
async fn load_flow(session: &Session) -> Result<CheckoutFlow> {
    Ok(session
        .get::<CheckoutFlow>(session_keys::CHECKOUT)
        .await?
        .unwrap_or_default())
}

/// Persist the checkout flow.
async fn save_flow(session: &Session, flow: &CheckoutFlow) -> Result<()> {
    session.insert(session_keys::CHECKOUT, flow).await?;
    Ok(())
}

// =============================================================================
// Forms and Views
// =============================================================================

/// Checkout contact/address form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
}

impl CheckoutForm {
    /// Normalize into core details: trim everything, blank phone -> `None`.
    fn into_details(self) -> CustomerDetails {
        let phone = self.phone.trim();
        CustomerDetails {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            email: self.email.trim().to_owned(),
            phone: if phone.is_empty() {
                None
            } else {
                Some(phone.to_owned())
            },
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
        }
    }
}

/// Form field values for re-rendering (after validation errors or cancel).
#[derive(Clone, Default)]
pub struct CheckoutFormView {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl CheckoutFormView {
    fn from_details(details: &CustomerDetails) -> Self {
        Self {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.clone(),
            phone: details.phone.clone().unwrap_or_default(),
            address: details.address.clone(),
            city: details.city.clone(),
            state: details.state.clone(),
            zip_code: details.zip_code.clone(),
        }
    }

    fn from_draft(draft: Option<&CustomerDetails>) -> Self {
        draft.map_or_else(Self::default, Self::from_details)
    }
}

/// Frozen order summary rendered on the payment page.
///
/// Totals come verbatim from the snapshot - never recomputed - so a
/// config change mid-checkout cannot drift the amount the buyer was shown.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub shipping_is_free: bool,
    pub grand_total: String,
}

impl OrderSummaryView {
    fn from_snapshot(snapshot: &OrderSnapshot) -> Self {
        Self {
            items: snapshot
                .lines
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
            item_count: snapshot.item_count(),
            subtotal: snapshot.subtotal.to_string(),
            shipping: if snapshot.shipping.is_zero() {
                "Free".to_owned()
            } else {
                snapshot.shipping.to_string()
            },
            shipping_is_free: snapshot.shipping.is_zero(),
            grand_total: snapshot.grand_total.to_string(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout form page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/checkout.html")]
pub struct CheckoutTemplate {
    pub form: CheckoutFormView,
    pub error: Option<String>,
    pub cart: CartView,
}

/// Payment instructions page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/payment.html")]
pub struct PaymentTemplate {
    pub summary: OrderSummaryView,
    pub customer_email: String,
    pub upi_link: String,
    pub upi_vpa: String,
    pub error: Option<String>,
}

/// Order placed page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/success.html")]
pub struct SuccessTemplate {
    pub order_id: String,
    pub order_date: String,
    pub customer_email: String,
    pub item_count: u32,
    pub total: String,
    pub whatsapp_link: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Checkout form page.
///
/// An empty cart redirects to the product listing; a completed checkout is
/// reset so a new cart can start a fresh flow; a pending payment resumes on
/// the payment page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Response> {
    let cart = CartSession::new(session.clone()).load().await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/products").into_response());
    }

    let mut flow = load_flow(&session).await?;
    if flow.is_placed() {
        flow = CheckoutFlow::new();
        save_flow(&session, &flow).await?;
    }
    if flow.awaiting().is_some() {
        return Ok(Redirect::to("/checkout/payment").into_response());
    }

    Ok(CheckoutTemplate {
        form: CheckoutFormView::from_draft(flow.draft()),
        error: None,
        cart: CartView::from_cart(&cart, state.config().shipping),
    }
    .into_response())
}

/// Submit the checkout form: validate, freeze the cart snapshot, move to
/// the payment step. No order id exists yet.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let policy = state.config().shipping;
    let cart = CartSession::new(session.clone()).load().await?;

    let mut flow = load_flow(&session).await?;
    if flow.is_placed() {
        flow = CheckoutFlow::new();
    }

    let details = form.into_details();
    match flow.submit(details.clone(), &cart, policy) {
        Ok(()) => {
            save_flow(&session, &flow).await?;
            Ok(Redirect::to("/checkout/payment").into_response())
        }
        Err(CheckoutError::EmptyCart) => Ok(Redirect::to("/products").into_response()),
        Err(CheckoutError::MissingField(field)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            CheckoutTemplate {
                form: CheckoutFormView::from_details(&details),
                error: Some(format!("Please fill in the {field} field.")),
                cart: CartView::from_cart(&cart, policy),
            },
        )
            .into_response()),
        // Payment is already pending; resume there.
        Err(CheckoutError::InvalidState { .. }) => {
            Ok(Redirect::to("/checkout/payment").into_response())
        }
    }
}

/// Payment instructions page: frozen totals, UPI deep link, confirm/cancel.
#[instrument(skip(state, session))]
pub async fn payment(State(state): State<AppState>, session: Session) -> Result<Response> {
    let flow = load_flow(&session).await?;
    let Some((customer, snapshot)) = flow.awaiting() else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    let payment = &state.config().payment;
    Ok(PaymentTemplate {
        summary: OrderSummaryView::from_snapshot(snapshot),
        customer_email: customer.email.clone(),
        upi_link: upi_payment_link(
            &payment.upi_vpa,
            &payment.upi_payee,
            snapshot.grand_total,
            "Tabletop Re-Boxing order",
        ),
        upi_vpa: payment.upi_vpa.clone(),
        error: None,
    }
    .into_response())
}

/// The buyer confirms payment was sent.
///
/// Generates the order id, commits the `Placed` transition to the session,
/// clears the cart, then dispatches the notification in the background
/// (one attempt; a failure is logged and never shown to the buyer). If the
/// transition cannot be committed, the buyer stays on the payment page
/// with a retryable error and the cart is untouched.
#[instrument(skip(state, session))]
pub async fn confirm(State(state): State<AppState>, session: Session) -> Result<Response> {
    let mut flow = load_flow(&session).await?;

    // A re-submitted confirm (double click, refresh) is already placed.
    if flow.is_placed() {
        return Ok(Redirect::to("/checkout/success").into_response());
    }
    let Some((customer, snapshot)) = flow.awaiting() else {
        return Ok(Redirect::to("/checkout").into_response());
    };
    let (customer, snapshot) = (customer.clone(), snapshot.clone());

    let now = Utc::now();
    let order_id = OrderId::generate(&state.config().order_prefix, now.date_naive(), &mut rand::rng());

    let Ok(order) = flow.confirm(order_id, now) else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    // Commit the transition before any side effects. If this fails the
    // session still holds AwaitingPayment and the buyer can retry.
    if let Err(e) = save_flow(&session, &flow).await {
        tracing::error!(error = %e, "Failed to persist placed order; returning to payment step");
        let payment = &state.config().payment;
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            PaymentTemplate {
                summary: OrderSummaryView::from_snapshot(&snapshot),
                customer_email: customer.email,
                upi_link: upi_payment_link(
                    &payment.upi_vpa,
                    &payment.upi_payee,
                    snapshot.grand_total,
                    "Tabletop Re-Boxing order",
                ),
                upi_vpa: payment.upi_vpa.clone(),
                error: Some("Something went wrong while placing your order. Please try again.".to_owned()),
            },
        )
            .into_response());
    }

    // The order is placed from here on; a failed cart clear is logged but
    // must not strand the buyer.
    if let Err(e) = CartSession::new(session).clear().await {
        tracing::error!(order_id = %order.order_id, error = %e, "Failed to clear cart after order placement");
    }

    dispatch_in_background(state.notifier(), OrderNotification::from_order(&order));

    tracing::info!(
        order_id = %order.order_id,
        grand_total = order.snapshot.grand_total.amount(),
        items = order.snapshot.item_count(),
        "Order placed"
    );

    Ok(Redirect::to("/checkout/success").into_response())
}

/// Cancel the payment step: back to the editable form, cart untouched.
#[instrument(skip(session))]
pub async fn cancel(session: Session) -> Result<Response> {
    let mut flow = load_flow(&session).await?;
    if flow.cancel().is_ok() {
        save_flow(&session, &flow).await?;
    }
    Ok(Redirect::to("/checkout").into_response())
}

/// Order placed page.
#[instrument(skip(state, session))]
pub async fn success(State(state): State<AppState>, session: Session) -> Result<Response> {
    let flow = load_flow(&session).await?;
    let Some(order) = flow.placed_order() else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    let notification = OrderNotification::from_order(order);
    let whatsapp_link = state
        .config()
        .payment
        .whatsapp_number
        .as_deref()
        .map(|number| whatsapp_order_link(number, &notification));

    Ok(SuccessTemplate {
        order_id: order.order_id.to_string(),
        order_date: notification.order_date.clone(),
        customer_email: order.customer.email.clone(),
        item_count: order.snapshot.item_count(),
        total: order.snapshot.grand_total.to_string(),
        whatsapp_link,
    }
    .into_response())
}
