//! Cart behaviour through the real router: merge rules, clamping,
//! recomputed totals, and the shared pricing surfaces.

use axum::http::StatusCode;
use tabletop_reboxing_integration_tests::TestApp;

#[tokio::test]
async fn add_same_product_merges_into_one_line() {
    let mut app = TestApp::new();

    app.post("/cart/add", "product_id=meeple-tray&quantity=2")
        .await;
    app.post("/cart/add", "product_id=meeple-tray&quantity=1")
        .await;

    assert_eq!(app.cart_count().await, 3);

    // One line, quantity 3 - not two lines.
    let cart = app.get("/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body.matches("Stackable Meeple Tray").count(), 1);
    assert!(cart.body.contains("<span class=\"cart-line-qty\">3</span>"));
}

#[tokio::test]
async fn add_without_quantity_defaults_to_one() {
    let mut app = TestApp::new();

    let response = app.post("/cart/add", "product_id=card-caddy").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.cart_count().await, 1);
}

#[tokio::test]
async fn add_keeps_customization_note() {
    let mut app = TestApp::new();

    app.post(
        "/cart/add",
        "product_id=dice-tower&quantity=1&customization=Walnut+finish+please",
    )
    .await;

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Walnut finish please"));
}

#[tokio::test]
async fn add_unknown_product_is_not_found() {
    let mut app = TestApp::new();

    let response = app.post("/cart/add", "product_id=not-a-product").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.cart_count().await, 0);
}

#[tokio::test]
async fn add_out_of_stock_product_is_rejected() {
    let mut app = TestApp::new();

    let response = app.post("/cart/add", "product_id=neoprene-mat").await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(app.cart_count().await, 0);
}

#[tokio::test]
async fn update_sets_absolute_quantity() {
    let mut app = TestApp::new();

    app.post("/cart/add", "product_id=meeple-tray&quantity=5")
        .await;
    app.post("/cart/update", "product_id=meeple-tray&quantity=2")
        .await;

    assert_eq!(app.cart_count().await, 2);
}

#[tokio::test]
async fn update_to_zero_removes_the_line() {
    let mut app = TestApp::new();

    app.post("/cart/add", "product_id=meeple-tray&quantity=5")
        .await;
    let response = app
        .post("/cart/update", "product_id=meeple-tray&quantity=0")
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Your cart is empty"));
    assert_eq!(app.cart_count().await, 0);
}

#[tokio::test]
async fn update_to_negative_removes_the_line() {
    let mut app = TestApp::new();

    app.post("/cart/add", "product_id=meeple-tray&quantity=5")
        .await;
    app.post("/cart/update", "product_id=meeple-tray&quantity=-5")
        .await;

    assert_eq!(app.cart_count().await, 0);
}

#[tokio::test]
async fn remove_deletes_whole_line_and_absent_id_is_harmless() {
    let mut app = TestApp::new();

    app.post("/cart/add", "product_id=meeple-tray&quantity=4")
        .await;
    app.post("/cart/remove", "product_id=meeple-tray").await;
    assert_eq!(app.cart_count().await, 0);

    // Removing something that isn't there is a no-op, not an error.
    let response = app.post("/cart/remove", "product_id=meeple-tray").await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn cart_page_and_floating_bar_agree_on_totals() {
    let mut app = TestApp::new();

    // 2 x 450 = 900 subtotal, below the 1,000 threshold: 120 shipping.
    app.post("/cart/add", "product_id=meeple-tray&quantity=2")
        .await;

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("\u{20b9}900"));
    assert!(cart.body.contains("\u{20b9}120"));
    assert!(cart.body.contains("\u{20b9}1,020"));
    // 100 more to free shipping.
    assert!(cart.body.contains("\u{20b9}100"));

    let bar = app.get("/cart/bar").await;
    assert!(bar.body.contains("\u{20b9}1,020"));
    assert!(bar.body.contains("incl. \u{20b9}120 shipping"));
}

#[tokio::test]
async fn crossing_the_threshold_waives_shipping_everywhere() {
    let mut app = TestApp::new();

    // 450 + 699 = 1,149: free shipping.
    app.post("/cart/add", "product_id=meeple-tray").await;
    app.post("/cart/add", "product_id=card-caddy").await;

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("\u{20b9}1,149"));
    assert!(cart.body.contains("Free"));
    assert!(!cart.body.contains("more for"));

    let bar = app.get("/cart/bar").await;
    assert!(bar.body.contains("Free shipping"));
}

#[tokio::test]
async fn empty_cart_renders_empty_bar() {
    let mut app = TestApp::new();

    let bar = app.get("/cart/bar").await;
    assert_eq!(bar.status, StatusCode::OK);
    assert!(!bar.body.contains("cart-bar-main"));
}
