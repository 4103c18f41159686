//! The checkout state machine through the real router: empty-cart
//! redirects, presence-only validation, frozen totals, order placement,
//! dispatch failure tolerance, and the cancel path.

use axum::http::StatusCode;
use tabletop_reboxing_core::types::OrderId;
use tabletop_reboxing_integration_tests::{TestApp, checkout_form, valid_checkout_form};

/// Pull `TRB-YYMMDD-XXXX` out of a page body.
fn extract_order_id(body: &str) -> String {
    let start = body.find("TRB-").expect("order id in body");
    let id: String = body
        .get(start..)
        .expect("order id slice")
        .chars()
        .take("TRB-240615-X7K2".len())
        .collect();
    id
}

#[tokio::test]
async fn empty_cart_redirects_away_from_checkout() {
    let mut app = TestApp::new();

    let response = app.get("/checkout").await;
    assert_eq!(response.redirect_target(), "/products");
}

#[tokio::test]
async fn missing_email_blocks_submission_and_leaves_cart_unchanged() {
    let mut app = TestApp::new();
    app.post("/cart/add", "product_id=meeple-tray&quantity=2")
        .await;

    let response = app.post("/checkout", &checkout_form("")).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Please fill in the email field."));
    // The other fields come back filled in.
    assert!(response.body.contains("value=\"Asha\""));

    // No snapshot was frozen: the payment page bounces back.
    let payment = app.get("/checkout/payment").await;
    assert_eq!(payment.redirect_target(), "/checkout");

    // Cart untouched.
    assert_eq!(app.cart_count().await, 2);
}

#[tokio::test]
async fn whitespace_email_is_still_missing() {
    let mut app = TestApp::new();
    app.post("/cart/add", "product_id=meeple-tray").await;

    let response = app.post("/checkout", &checkout_form("+++")).await; // "   "
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Please fill in the email field."));
}

#[tokio::test]
async fn full_checkout_places_order_with_shipping_and_clears_cart() {
    let mut app = TestApp::new();

    // Subtotal 900: grand total must be 1,020 (900 + 120 shipping).
    app.post("/cart/add", "product_id=meeple-tray&quantity=2")
        .await;

    let submitted = app.post("/checkout", &valid_checkout_form()).await;
    assert_eq!(submitted.redirect_target(), "/checkout/payment");

    let payment = app.get("/checkout/payment").await;
    assert_eq!(payment.status, StatusCode::OK);
    assert!(payment.body.contains("\u{20b9}1,020"));
    assert!(payment.body.contains("upi://pay?pa=tabletopreboxing%40upi"));
    assert!(payment.body.contains("am=1020"));

    let confirmed = app.post("/checkout/payment/confirm", "").await;
    assert_eq!(confirmed.redirect_target(), "/checkout/success");

    let success = app.get("/checkout/success").await;
    assert_eq!(success.status, StatusCode::OK);
    assert!(success.body.contains("\u{20b9}1,020"));
    assert!(success.body.contains("asha@example.com"));

    let order_id = extract_order_id(&success.body);
    assert!(OrderId::is_well_formed(&order_id), "got {order_id}");

    // Cart cleared after placement.
    assert_eq!(app.cart_count().await, 0);

    // Exactly one dispatch, carrying the frozen totals.
    app.notifier.wait_for_dispatch().await;
    assert_eq!(app.notifier.calls(), 1);
    let payload = app.notifier.last_payload().expect("payload recorded");
    assert_eq!(payload.order_total.amount(), 1_020);
    assert_eq!(payload.customer_name, "Asha Verma");
    assert_eq!(payload.customer_phone, "Not provided");
    assert_eq!(payload.order_id, order_id);
}

#[tokio::test]
async fn snapshot_is_frozen_against_later_cart_edits() {
    let mut app = TestApp::new();

    app.post("/cart/add", "product_id=meeple-tray&quantity=2")
        .await;
    app.post("/checkout", &valid_checkout_form()).await;

    // Buyer edits the cart in "another tab" mid-checkout.
    app.post("/cart/add", "product_id=dice-tower&quantity=3")
        .await;

    // The payment page still shows the frozen 1,020.
    let payment = app.get("/checkout/payment").await;
    assert!(payment.body.contains("\u{20b9}1,020"));
    assert!(!payment.body.contains("Collapsible Dice Tower"));
}

#[tokio::test]
async fn dispatch_failure_still_reaches_placed_and_clears_cart() {
    let mut app = TestApp::with_failing_notifier();

    app.post("/cart/add", "product_id=meeple-tray&quantity=2")
        .await;
    app.post("/checkout", &valid_checkout_form()).await;

    let confirmed = app.post("/checkout/payment/confirm", "").await;
    assert_eq!(confirmed.redirect_target(), "/checkout/success");

    let success = app.get("/checkout/success").await;
    assert_eq!(success.status, StatusCode::OK);
    let order_id = extract_order_id(&success.body);
    assert!(OrderId::is_well_formed(&order_id));

    // The failed dispatch was attempted once and did not block placement.
    app.notifier.wait_for_dispatch().await;
    assert_eq!(app.notifier.calls(), 1);
    assert_eq!(app.cart_count().await, 0);
}

#[tokio::test]
async fn cancel_returns_to_form_with_cart_intact_and_no_order() {
    let mut app = TestApp::new();

    app.post("/cart/add", "product_id=meeple-tray&quantity=2")
        .await;
    app.post("/checkout", &valid_checkout_form()).await;

    let cancelled = app.post("/checkout/payment/cancel", "").await;
    assert_eq!(cancelled.redirect_target(), "/checkout");

    // Back on the editable form, with the details kept as a draft.
    let form = app.get("/checkout").await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("value=\"asha@example.com\""));

    // Cart untouched, no payment pending, no order id ever generated.
    assert_eq!(app.cart_count().await, 2);
    let payment = app.get("/checkout/payment").await;
    assert_eq!(payment.redirect_target(), "/checkout");
    assert_eq!(app.notifier.calls(), 0);
}

#[tokio::test]
async fn confirm_without_pending_payment_redirects_to_checkout() {
    let mut app = TestApp::new();

    let response = app.post("/checkout/payment/confirm", "").await;
    assert_eq!(response.redirect_target(), "/checkout");
    assert_eq!(app.notifier.calls(), 0);
}

#[tokio::test]
async fn placed_flow_resets_for_a_new_cart() {
    let mut app = TestApp::new();

    app.post("/cart/add", "product_id=meeple-tray&quantity=2")
        .await;
    app.post("/checkout", &valid_checkout_form()).await;
    app.post("/checkout/payment/confirm", "").await;
    assert_eq!(app.cart_count().await, 0);

    // A fresh cart starts a fresh checkout in the filling state.
    app.post("/cart/add", "product_id=card-caddy").await;
    let form = app.get("/checkout").await;
    assert_eq!(form.status, StatusCode::OK);
    assert!(form.body.contains("Shipping Address"));
}
