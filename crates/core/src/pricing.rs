//! Shipping charge and grand-total arithmetic.
//!
//! Kept pure and side-effect-free so the identical formula backs every
//! surface that previews pricing (cart page, floating cart bar, checkout
//! summary, payment page). Two render sites can only disagree on a total by
//! not using this type.

use serde::{Deserialize, Serialize};

use crate::types::Rupees;

/// Default subtotal above which shipping is free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Rupees = Rupees::new(1_000);

/// Default flat shipping fee below the threshold.
pub const DEFAULT_SHIPPING_FLAT_FEE: Rupees = Rupees::new(120);

/// Free-shipping threshold plus the flat fee charged below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub free_shipping_threshold: Rupees,
    pub flat_fee: Rupees,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            flat_fee: DEFAULT_SHIPPING_FLAT_FEE,
        }
    }
}

impl ShippingPolicy {
    /// Shipping charge for a given subtotal: zero at or above the
    /// threshold, the flat fee below it.
    #[must_use]
    pub fn charge(self, subtotal: Rupees) -> Rupees {
        if subtotal >= self.free_shipping_threshold {
            Rupees::ZERO
        } else {
            self.flat_fee
        }
    }

    /// Subtotal plus the shipping charge.
    #[must_use]
    pub fn grand_total(self, subtotal: Rupees) -> Rupees {
        subtotal.saturating_add(self.charge(subtotal))
    }

    /// How much more the buyer must add to reach free shipping
    /// (zero once the threshold is met).
    #[must_use]
    pub fn amount_to_free_shipping(self, subtotal: Rupees) -> Rupees {
        self.free_shipping_threshold.saturating_sub_floor_zero(subtotal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_below_at_and_above_threshold() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.charge(Rupees::new(999)), Rupees::new(120));
        assert_eq!(policy.charge(Rupees::new(1_000)), Rupees::ZERO);
        assert_eq!(policy.charge(Rupees::new(5_000)), Rupees::ZERO);
    }

    #[test]
    fn test_grand_total_adds_charge_only_below_threshold() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.grand_total(Rupees::new(900)), Rupees::new(1_020));
        assert_eq!(policy.grand_total(Rupees::new(1_000)), Rupees::new(1_000));
    }

    #[test]
    fn test_amount_to_free_shipping() {
        let policy = ShippingPolicy::default();
        assert_eq!(
            policy.amount_to_free_shipping(Rupees::new(750)),
            Rupees::new(250)
        );
        assert_eq!(
            policy.amount_to_free_shipping(Rupees::new(1_200)),
            Rupees::ZERO
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = ShippingPolicy {
            free_shipping_threshold: Rupees::new(500),
            flat_fee: Rupees::new(60),
        };
        assert_eq!(policy.charge(Rupees::new(499)), Rupees::new(60));
        assert_eq!(policy.charge(Rupees::new(500)), Rupees::ZERO);
    }
}
