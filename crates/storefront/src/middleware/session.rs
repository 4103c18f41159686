//! Session middleware configuration.
//!
//! Sessions are the buyer's persistence slot: the cart and the checkout
//! flow live under keys in the session store and survive page reloads.
//! There is no database; the in-memory store with a long inactivity expiry
//! matches the single-device, single-session scope of the shop.

use secrecy::ExposeSecret;
use tower_sessions::cookie::Key;
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "trb_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store and signed cookies.
///
/// # Panics
///
/// Panics if the session secret is shorter than 32 bytes; configuration
/// loading enforces the minimum length before this is reached.
#[must_use]
pub fn create_session_layer(
    config: &StorefrontConfig,
) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    let store = MemoryStore::default();

    let key = Key::derive_from(config.session_secret.expose_secret().as_bytes());

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key)
}
