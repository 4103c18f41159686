//! Rate limiting middleware using governor and `tower_governor`.
//!
//! Checkout submission and payment confirmation trigger outbound
//! notification traffic, so they get a per-IP limiter. Browsing and cart
//! endpoints stay unlimited.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor that prefers proxy-forwarded client IPs and falls back to
/// localhost when none are present (direct local connections, tests).
#[derive(Clone, Copy)]
pub struct ForwardedIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ForwardedIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        // X-Forwarded-For (first IP in the chain)
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        // X-Real-IP
        if let Some(ip) = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ForwardedIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for checkout endpoints: ~30 requests per minute per
/// IP (1 token every 2 seconds, burst of 10).
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers, which are always accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn checkout_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ForwardedIpKeyExtractor)
        .per_second(2)
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_second(2) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tower_governor::key_extractor::KeyExtractor;

    #[test]
    fn test_extractor_prefers_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        let key = ForwardedIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(key.to_string(), "203.0.113.7");
    }

    #[test]
    fn test_extractor_falls_back_to_localhost() {
        let req = Request::builder().body(()).unwrap();
        let key = ForwardedIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(key, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}
