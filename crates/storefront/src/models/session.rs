//! Session keys.
//!
//! Everything the storefront remembers about a buyer lives in the session:
//! the cart and the checkout flow. Both are serde-serialized core types,
//! stored opaquely under these keys.

/// Session keys for buyer state.
pub mod keys {
    /// Key for the serialized cart (`tabletop_reboxing_core::Cart`).
    pub const CART: &str = "cart";

    /// Key for the checkout state machine
    /// (`tabletop_reboxing_core::CheckoutFlow`).
    pub const CHECKOUT: &str = "checkout";
}
