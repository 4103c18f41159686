//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with in-memory store, signed cookies)
//! 4. Security headers (CSP, frame deny, nosniff)
//! 5. Rate limiting on checkout submission (governor)

pub mod rate_limit;
pub mod security_headers;
pub mod session;

pub use rate_limit::checkout_rate_limiter;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
