//! Storefront services.

pub mod cart;
pub mod notify;
