//! Integration test harness for the Tabletop Re-Boxing storefront.
//!
//! Tests drive the real router in-process via `tower::ServiceExt::oneshot`,
//! carrying the session cookie between requests the way a browser would.
//! No server, no network: the only test double is the notification
//! transport, which records (or fails) dispatches.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tabletop-reboxing-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)] // test harness

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;

use tabletop_reboxing_core::OrderNotification;
use tabletop_reboxing_core::types::{CategoryId, ProductId, Rupees};
use tabletop_reboxing_core::{Category, Product, ShippingPolicy};
use tabletop_reboxing_storefront::catalog::CatalogStore;
use tabletop_reboxing_storefront::config::{PaymentConfig, StorefrontConfig};
use tabletop_reboxing_storefront::content::ContentStore;
use tabletop_reboxing_storefront::routes;
use tabletop_reboxing_storefront::services::notify::{NotifyError, OrderNotifier};
use tabletop_reboxing_storefront::state::AppState;

/// Notification double: counts dispatches, keeps the last payload, and can
/// be told to fail every attempt.
pub struct RecordingNotifier {
    fail: bool,
    calls: AtomicUsize,
    last: Mutex<Option<OrderNotification>>,
}

impl RecordingNotifier {
    /// A notifier whose dispatches succeed.
    #[must_use]
    pub const fn succeeding() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    /// A notifier whose dispatches all fail.
    #[must_use]
    pub const fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    /// Number of dispatch attempts so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent payload, if any attempt was made.
    #[must_use]
    pub fn last_payload(&self) -> Option<OrderNotification> {
        self.last.lock().unwrap().clone()
    }

    /// Wait until at least one dispatch attempt has landed (dispatch runs
    /// on a spawned task). Panics after ~2s without one.
    pub async fn wait_for_dispatch(&self) {
        for _ in 0..200 {
            if self.calls() > 0 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("notification dispatch was never attempted");
    }
}

#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn dispatch(&self, notification: &OrderNotification) -> Result<(), NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(notification.clone());
        if self.fail {
            return Err(NotifyError::Api {
                status: 500,
                message: "simulated transport failure".to_owned(),
            });
        }
        Ok(())
    }
}

/// Test configuration: default shipping policy (threshold 1,000 / fee 120),
/// no EmailJS, fixed payment details.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost:3000".to_owned(),
        session_secret: SecretString::from("k7Qp2xVbN9mRtY4wZcE6hJ8uA3sDfG5LqWnM0oPiKjHgF1dS"),
        shipping: ShippingPolicy::default(),
        order_prefix: "TRB".to_owned(),
        payment: PaymentConfig {
            upi_vpa: "tabletopreboxing@upi".to_owned(),
            upi_payee: "Tabletop Re-Boxing".to_owned(),
            whatsapp_number: Some("919845012345".to_owned()),
        },
        emailjs: None,
        catalog_dir: PathBuf::from("unused"),
        content_dir: PathBuf::from("unused"),
        sentry_dsn: None,
    }
}

fn product(id: &str, name: &str, price: i64) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        category: CategoryId::new("organizer-inserts"),
        price: Rupees::new(price),
        image: format!("/static/images/products/{id}.jpg"),
        images: Vec::new(),
        description: format!("{name} description"),
        featured: false,
        hidden: false,
        out_of_stock: false,
        specs: BTreeMap::new(),
    }
}

/// Fixture catalog with known prices for total assertions.
#[must_use]
pub fn test_catalog() -> CatalogStore {
    let mut soldout = product("neoprene-mat", "Neoprene Play Mat", 1_599);
    soldout.out_of_stock = true;

    CatalogStore::new(
        vec![
            product("meeple-tray", "Stackable Meeple Tray", 450),
            product("card-caddy", "Sleeved Card Caddy", 699),
            product("dice-tower", "Collapsible Dice Tower", 899),
            soldout,
        ],
        vec![Category {
            id: CategoryId::new("organizer-inserts"),
            name: "Organizer Inserts".to_owned(),
            description: String::new(),
            icon: "grid".to_owned(),
        }],
    )
}

/// One response, decoded for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// Assert a redirect and return its target.
    #[must_use]
    pub fn redirect_target(&self) -> &str {
        assert!(
            self.status.is_redirection(),
            "expected redirect, got {} with body: {}",
            self.status,
            self.body
        );
        self.location.as_deref().expect("redirect without Location")
    }
}

/// The app under test plus a one-cookie jar.
pub struct TestApp {
    router: Router,
    cookie: Option<String>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App with a succeeding notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(RecordingNotifier::succeeding()))
    }

    /// App whose notifier fails every dispatch.
    #[must_use]
    pub fn with_failing_notifier() -> Self {
        Self::with_notifier(Arc::new(RecordingNotifier::failing()))
    }

    fn with_notifier(notifier: Arc<RecordingNotifier>) -> Self {
        let content = ContentStore::load(std::path::Path::new("/nonexistent"))
            .expect("empty content store");
        let state = AppState::new(test_config(), test_catalog(), content, notifier.clone());
        Self {
            router: routes::app(state),
            cookie: None,
            notifier,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router never fails");

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        // Keep the session cookie for the next request, like a browser.
        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            if let Some(pair) = set_cookie.split(';').next() {
                self.cookie = Some(pair.to_owned());
            }
        }

        let body = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();

        TestResponse {
            status,
            location,
            body: String::from_utf8_lossy(&body).into_owned(),
        }
    }

    /// GET a path.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).expect("request builds");
        self.send(request).await
    }

    /// POST a form-urlencoded body to a path.
    pub async fn post(&mut self, path: &str, form: &str) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder
            .body(Body::from(form.to_owned()))
            .expect("request builds");
        self.send(request).await
    }

    /// Quantity currently shown by the cart count badge.
    pub async fn cart_count(&mut self) -> u32 {
        let response = self.get("/cart/count").await;
        assert_eq!(response.status, StatusCode::OK);
        extract_badge_count(&response.body)
    }
}

/// Pull the number out of the count badge fragment (`...>7</span>`).
fn extract_badge_count(fragment: &str) -> u32 {
    let end = fragment.rfind("</span>").expect("badge fragment");
    let start = fragment[..end].rfind('>').expect("badge fragment") + 1;
    fragment[start..end].trim().parse().expect("badge number")
}

/// A complete, valid checkout form body.
#[must_use]
pub fn valid_checkout_form() -> String {
    checkout_form("asha%40example.com")
}

/// A checkout form body with a caller-supplied (already-encoded) email.
#[must_use]
pub fn checkout_form(email: &str) -> String {
    format!(
        "first_name=Asha&last_name=Verma&email={email}&phone=&address=14+MG+Road\
         &city=Bengaluru&state=KA&zip_code=560001"
    )
}
