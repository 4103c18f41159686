//! Session-backed cart store.
//!
//! The session is the cart's persistence slot: a key-value store holding
//! the serialized line list between requests. Every mutation is an atomic
//! read-modify-write - load the cart, apply one core operation, persist -
//! so a pair of rapid double-clicks cannot lose an update within a request,
//! and no handler ever works from a stale copy it mutated earlier.

use tower_sessions::Session;

use tabletop_reboxing_core::types::ProductId;
use tabletop_reboxing_core::{Cart, CartLine, Product};

use crate::error::Result;
use crate::models::session_keys;

/// Handle over the buyer's cart for the duration of one request.
#[derive(Debug, Clone)]
pub struct CartSession {
    session: Session,
}

impl CartSession {
    /// Wrap the request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// Load the cart, or an empty one on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store is unreachable.
    pub async fn load(&self) -> Result<Cart> {
        Ok(self
            .session
            .get::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default())
    }

    /// Persist the cart.
    async fn save(&self, cart: &Cart) -> Result<()> {
        self.session.insert(session_keys::CART, cart).await?;
        Ok(())
    }

    /// Add a product to the cart, merging by product id.
    ///
    /// Snapshot fields (name, price, image) are copied from the catalog at
    /// this moment and never re-read. Returns the updated cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store is unreachable.
    pub async fn add(
        &self,
        product: &Product,
        quantity: u32,
        customization: Option<String>,
    ) -> Result<Cart> {
        let mut cart = self.load().await?;
        cart.add_line(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
            customization,
        });
        self.save(&cart).await?;
        Ok(cart)
    }

    /// Set a line's absolute quantity (zero or less removes the line).
    ///
    /// # Errors
    ///
    /// Returns an error if the session store is unreachable.
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: i64) -> Result<Cart> {
        let mut cart = self.load().await?;
        cart.set_quantity(product_id, quantity);
        self.save(&cart).await?;
        Ok(cart)
    }

    /// Remove a line entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store is unreachable.
    pub async fn remove(&self, product_id: &ProductId) -> Result<Cart> {
        let mut cart = self.load().await?;
        cart.remove_line(product_id);
        self.save(&cart).await?;
        Ok(cart)
    }

    /// Empty the cart. Called after successful order placement.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store is unreachable.
    pub async fn clear(&self) -> Result<()> {
        self.save(&Cart::new()).await
    }
}
