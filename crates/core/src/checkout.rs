//! The checkout state machine.
//!
//! A checkout moves `Filling -> AwaitingPayment -> Placed`, with an explicit
//! cancel transition back from `AwaitingPayment` to `Filling`.
//!
//! The cart and its computed totals are frozen into an [`OrderSnapshot`] at
//! form submission, not re-read at confirmation time: a buyer editing the
//! cart in another tab mid-checkout must not change what they are paying
//! for. The order id is generated only at the confirm transition - a
//! cancelled checkout never had one.
//!
//! This type is pure: it never touches the session, the live cart, or the
//! notification transport. The storefront persists the flow, clears the
//! cart, and dispatches the notification around these transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{Cart, CartLine};
use crate::pricing::ShippingPolicy;
use crate::types::{OrderId, Rupees};

/// Contact and shipping details entered on the checkout form.
///
/// Validation is field-presence only: the email value is used exactly as
/// typed, and only the phone number is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl CustomerDetails {
    /// Check that every mandatory field is non-empty after trimming.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingField`] naming the first missing
    /// field, in form order.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let required: [(&str, &str); 7] = [
            ("first name", &self.first_name),
            ("last name", &self.last_name),
            ("email", &self.email),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("ZIP code", &self.zip_code),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingField(field.to_owned()));
            }
        }
        Ok(())
    }

    /// `"First Last"` for notification payloads.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Single-line shipping address for labels and notifications.
    #[must_use]
    pub fn shipping_address(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.address.trim(),
            self.city.trim(),
            self.state.trim(),
            self.zip_code.trim()
        )
    }
}

/// Frozen copy of the cart and its computed totals, captured when the buyer
/// submits the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub lines: Vec<CartLine>,
    pub subtotal: Rupees,
    pub shipping: Rupees,
    pub grand_total: Rupees,
}

impl OrderSnapshot {
    /// Capture the current cart contents and totals under the given policy.
    ///
    /// The totals are stored, not recomputed later, so a change to the
    /// shipping constants after submission cannot drift the amount the
    /// buyer was shown.
    #[must_use]
    pub fn capture(cart: &Cart, policy: ShippingPolicy) -> Self {
        let subtotal = cart.subtotal();
        let shipping = policy.charge(subtotal);
        Self {
            lines: cart.lines().to_vec(),
            subtotal,
            shipping,
            grand_total: subtotal.saturating_add(shipping),
        }
    }

    /// Sum of quantities across the snapshot lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity))
    }
}

/// A confirmed order. Ephemeral: lives in the session and the dispatched
/// notification, never in a database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub placed_at: DateTime<Utc>,
    pub customer: CustomerDetails,
    pub snapshot: OrderSnapshot,
}

/// Where the buyer is in the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckoutState {
    /// Buyer editing the contact/address form. `draft` re-fills the form
    /// after a cancel.
    Filling { draft: Option<CustomerDetails> },
    /// Order intent captured, payment instructions shown.
    AwaitingPayment {
        customer: CustomerDetails,
        snapshot: OrderSnapshot,
    },
    /// Terminal: payment claimed, order handed to fulfilment.
    Placed { order: PlacedOrder },
}

/// Errors surfaced by checkout transitions.
///
/// None of these carry side effects: a failed transition leaves the flow
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Checkout is meaningless with zero items.
    #[error("cart is empty")]
    EmptyCart,
    /// A mandatory form field was blank.
    #[error("missing required field: {0}")]
    MissingField(String),
    /// The transition does not apply to the current state.
    #[error("checkout is not {expected}")]
    InvalidState {
        /// The state the transition requires.
        expected: &'static str,
    },
}

/// The checkout state machine, persisted opaquely between requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutFlow {
    state: CheckoutState,
}

impl Default for CheckoutFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutFlow {
    /// Start a fresh checkout in `Filling`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: CheckoutState::Filling { draft: None },
        }
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Draft details to re-fill the form with, if any.
    #[must_use]
    pub const fn draft(&self) -> Option<&CustomerDetails> {
        match &self.state {
            CheckoutState::Filling { draft } => draft.as_ref(),
            CheckoutState::AwaitingPayment { customer, .. } => Some(customer),
            CheckoutState::Placed { .. } => None,
        }
    }

    /// The frozen customer/snapshot pair while payment is pending.
    #[must_use]
    pub const fn awaiting(&self) -> Option<(&CustomerDetails, &OrderSnapshot)> {
        match &self.state {
            CheckoutState::AwaitingPayment { customer, snapshot } => Some((customer, snapshot)),
            _ => None,
        }
    }

    /// The placed order, once terminal.
    #[must_use]
    pub const fn placed_order(&self) -> Option<&PlacedOrder> {
        match &self.state {
            CheckoutState::Placed { order } => Some(order),
            _ => None,
        }
    }

    /// Whether the flow has reached its terminal state.
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        matches!(self.state, CheckoutState::Placed { .. })
    }

    /// `Filling -> AwaitingPayment`: validate the form and freeze the cart.
    ///
    /// No order id is generated here. On any error the flow, the details
    /// and the cart are untouched.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InvalidState`] if the flow is not in `Filling`
    /// - [`CheckoutError::EmptyCart`] if the cart has no lines
    /// - [`CheckoutError::MissingField`] if a mandatory field is blank
    pub fn submit(
        &mut self,
        details: CustomerDetails,
        cart: &Cart,
        policy: ShippingPolicy,
    ) -> Result<(), CheckoutError> {
        if !matches!(self.state, CheckoutState::Filling { .. }) {
            return Err(CheckoutError::InvalidState { expected: "filling" });
        }
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        details.validate()?;

        self.state = CheckoutState::AwaitingPayment {
            customer: details,
            snapshot: OrderSnapshot::capture(cart, policy),
        };
        Ok(())
    }

    /// `AwaitingPayment -> Placed`: the buyer claims payment was sent.
    ///
    /// The caller generates the order id at this moment (and only now),
    /// then dispatches the notification and clears the live cart. Returns
    /// the placed order so the caller can build the payload from the frozen
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidState`] unless payment is pending.
    pub fn confirm(
        &mut self,
        order_id: OrderId,
        placed_at: DateTime<Utc>,
    ) -> Result<PlacedOrder, CheckoutError> {
        let CheckoutState::AwaitingPayment { customer, snapshot } = &self.state else {
            return Err(CheckoutError::InvalidState {
                expected: "awaiting payment",
            });
        };

        let order = PlacedOrder {
            order_id,
            placed_at,
            customer: customer.clone(),
            snapshot: snapshot.clone(),
        };
        self.state = CheckoutState::Placed {
            order: order.clone(),
        };
        Ok(order)
    }

    /// `AwaitingPayment -> Filling`: discard the snapshot and return to the
    /// editable form (details kept as the draft). The cart is untouched and
    /// no order id was ever generated.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidState`] unless payment is pending.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        let CheckoutState::AwaitingPayment { customer, .. } = &self.state else {
            return Err(CheckoutError::InvalidState {
                expected: "awaiting payment",
            });
        };

        self.state = CheckoutState::Filling {
            draft: Some(customer.clone()),
        };
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::ProductId;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn customer() -> CustomerDetails {
        CustomerDetails {
            first_name: "Asha".to_owned(),
            last_name: "Verma".to_owned(),
            email: "asha@example.com".to_owned(),
            phone: None,
            address: "14 MG Road".to_owned(),
            city: "Bengaluru".to_owned(),
            state: "KA".to_owned(),
            zip_code: "560001".to_owned(),
        }
    }

    fn cart_with_subtotal_900() -> Cart {
        let mut cart = Cart::new();
        cart.add_line(CartLine {
            product_id: ProductId::new("meeple-tray"),
            name: "Stackable Meeple Tray".to_owned(),
            price: Rupees::new(450),
            image: "/static/images/products/meeple-tray.jpg".to_owned(),
            quantity: 2,
            customization: None,
        });
        cart
    }

    fn order_id() -> OrderId {
        let mut rng = StdRng::seed_from_u64(1);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        OrderId::generate("TRB", date, &mut rng)
    }

    fn placed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_validate_flags_first_missing_field() {
        let mut details = customer();
        details.email = "   ".to_owned();
        assert_eq!(
            details.validate(),
            Err(CheckoutError::MissingField("email".to_owned()))
        );
    }

    #[test]
    fn test_validate_allows_missing_phone() {
        let details = customer();
        assert!(details.phone.is_none());
        assert!(details.validate().is_ok());
    }

    #[test]
    fn test_submit_empty_cart_is_rejected() {
        let mut flow = CheckoutFlow::new();
        let err = flow
            .submit(customer(), &Cart::new(), ShippingPolicy::default())
            .unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
        assert!(matches!(flow.state(), CheckoutState::Filling { .. }));
    }

    #[test]
    fn test_submit_missing_field_leaves_flow_untouched() {
        let mut flow = CheckoutFlow::new();
        let mut details = customer();
        details.email = String::new();

        let err = flow
            .submit(details, &cart_with_subtotal_900(), ShippingPolicy::default())
            .unwrap_err();
        assert_eq!(err, CheckoutError::MissingField("email".to_owned()));
        assert!(flow.awaiting().is_none());
    }

    #[test]
    fn test_submit_freezes_snapshot_and_totals() {
        let mut flow = CheckoutFlow::new();
        let mut cart = cart_with_subtotal_900();
        flow.submit(customer(), &cart, ShippingPolicy::default())
            .unwrap();

        // Subtotal 900 is below the 1,000 threshold: 120 shipping applies.
        let (_, snapshot) = flow.awaiting().unwrap();
        assert_eq!(snapshot.subtotal, Rupees::new(900));
        assert_eq!(snapshot.shipping, Rupees::new(120));
        assert_eq!(snapshot.grand_total, Rupees::new(1_020));

        // Editing the live cart afterwards must not leak into the snapshot.
        cart.set_quantity(&ProductId::new("meeple-tray"), 10);
        let (_, snapshot) = flow.awaiting().unwrap();
        assert_eq!(snapshot.item_count(), 2);
        assert_eq!(snapshot.grand_total, Rupees::new(1_020));
    }

    #[test]
    fn test_submit_twice_is_invalid_state() {
        let mut flow = CheckoutFlow::new();
        let cart = cart_with_subtotal_900();
        flow.submit(customer(), &cart, ShippingPolicy::default())
            .unwrap();

        let err = flow
            .submit(customer(), &cart, ShippingPolicy::default())
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidState { .. }));
    }

    #[test]
    fn test_confirm_produces_placed_order_from_snapshot() {
        let mut flow = CheckoutFlow::new();
        flow.submit(customer(), &cart_with_subtotal_900(), ShippingPolicy::default())
            .unwrap();

        let order = flow.confirm(order_id(), placed_at()).unwrap();
        assert!(OrderId::is_well_formed(order.order_id.as_str()));
        assert_eq!(order.snapshot.grand_total, Rupees::new(1_020));
        assert_eq!(order.customer.email, "asha@example.com");
        assert!(flow.is_placed());
        assert_eq!(flow.placed_order(), Some(&order));
    }

    #[test]
    fn test_confirm_without_pending_payment_is_invalid() {
        let mut flow = CheckoutFlow::new();
        let err = flow.confirm(order_id(), placed_at()).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidState { .. }));
        assert!(!flow.is_placed());
    }

    #[test]
    fn test_placed_is_terminal() {
        let mut flow = CheckoutFlow::new();
        let cart = cart_with_subtotal_900();
        flow.submit(customer(), &cart, ShippingPolicy::default())
            .unwrap();
        flow.confirm(order_id(), placed_at()).unwrap();

        assert!(flow.submit(customer(), &cart, ShippingPolicy::default()).is_err());
        assert!(flow.cancel().is_err());
        assert!(flow.confirm(order_id(), placed_at()).is_err());
    }

    #[test]
    fn test_cancel_returns_to_filling_with_draft() {
        let mut flow = CheckoutFlow::new();
        flow.submit(customer(), &cart_with_subtotal_900(), ShippingPolicy::default())
            .unwrap();

        flow.cancel().unwrap();
        assert!(matches!(flow.state(), CheckoutState::Filling { .. }));
        assert_eq!(flow.draft().map(|d| d.email.as_str()), Some("asha@example.com"));
        assert!(flow.awaiting().is_none());
        assert!(flow.placed_order().is_none());
    }

    #[test]
    fn test_serde_roundtrip_mid_flow() {
        let mut flow = CheckoutFlow::new();
        flow.submit(customer(), &cart_with_subtotal_900(), ShippingPolicy::default())
            .unwrap();

        let json = serde_json::to_string(&flow).unwrap();
        let restored: CheckoutFlow = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, flow);
    }
}
