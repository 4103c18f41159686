//! The cart: the single source of truth for a buyer's selected items.
//!
//! A cart is an ordered list of lines, at most one line per product id.
//! Adding an id that is already present merges into the existing line
//! instead of duplicating it, and driving a quantity to zero removes the
//! line outright - a zero-quantity row never persists.
//!
//! All operations are total over valid inputs: out-of-range quantities are
//! clamped rather than rejected, because this is buyer-facing UI state, not
//! a ledger. Totals are recomputed from the lines on every read so no
//! cached figure can drift after a mutation.

use serde::{Deserialize, Serialize};

use crate::types::{ProductId, Rupees};

/// One row in the cart, uniquely keyed by product id.
///
/// `name`, `price` and `image` are snapshots taken at add time; they are
/// never re-fetched from the catalog, so a later catalog edit does not
/// change what the buyer already put in their cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Rupees,
    pub image: String,
    pub quantity: u32,
    /// Free-text note attached by the buyer (engraving, colour choice, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization: Option<String>,
}

impl CartLine {
    /// `price * quantity` for this line.
    #[must_use]
    pub const fn line_total(&self) -> Rupees {
        self.price.times(self.quantity)
    }
}

/// An ordered collection of [`CartLine`]s (insertion order = display order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// The cart lines in display order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines (not the quantity sum).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across all lines - what the header badge shows.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Sum of `price * quantity` over all lines, recomputed on every call.
    #[must_use]
    pub fn subtotal(&self) -> Rupees {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Add a line, merging by product id.
    ///
    /// If a line with the same product id exists, its quantity increases by
    /// the incoming quantity (clamped to at least 1, saturating on
    /// overflow); this call never decreases a quantity. Otherwise the line
    /// is appended. A customization note on a merged add replaces the
    /// existing note.
    pub fn add_line(&mut self, line: CartLine) {
        let delta = line.quantity.max(1);

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(delta);
            if line.customization.is_some() {
                existing.customization = line.customization;
            }
        } else {
            self.lines.push(CartLine {
                quantity: delta,
                ..line
            });
        }
    }

    /// Delete the line entirely, regardless of quantity.
    ///
    /// No-op (not an error) if the id is absent.
    pub fn remove_line(&mut self, product_id: &ProductId) {
        self.lines.retain(|line| &line.product_id != product_id);
    }

    /// Set a line's quantity to an absolute value.
    ///
    /// A quantity of zero or less behaves as [`Self::remove_line`]; a
    /// quantity above `u32::MAX` is clamped. No-op if the id is absent.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_line(product_id);
            return;
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| &l.product_id == product_id)
        {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Empty the cart. Used after successful order placement.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
