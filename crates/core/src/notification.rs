//! Order notification payload formatting.
//!
//! One payload is emitted per placed order. The payload is transport
//! agnostic: the storefront hands it to whatever channel is configured
//! (email API, WhatsApp deep link) and never depends on delivery for the
//! order to count as placed.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::checkout::PlacedOrder;
use crate::types::Rupees;

/// IST is UTC+05:30. Orders are fulfilled from India, so the order date in
/// the notification is rendered in that zone regardless of server time.
const IST_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

/// One itemised row of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Rupees,
    pub line_total: Rupees,
}

/// The fully-formed payload for a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNotification {
    pub order_id: String,
    /// Human-readable order date in IST.
    pub order_date: String,
    pub customer_name: String,
    pub customer_email: String,
    /// `"Not provided"` when the buyer left the phone field blank.
    pub customer_phone: String,
    pub shipping_address: String,
    pub lines: Vec<NotificationLine>,
    pub order_total: Rupees,
}

impl OrderNotification {
    /// Build the payload from a placed order's frozen snapshot.
    #[must_use]
    pub fn from_order(order: &PlacedOrder) -> Self {
        let order_date = FixedOffset::east_opt(IST_OFFSET_SECONDS).map_or_else(
            || order.placed_at.format("%A, %d %B %Y, %I:%M %p UTC").to_string(),
            |ist| {
                order
                    .placed_at
                    .with_timezone(&ist)
                    .format("%A, %d %B %Y, %I:%M %p IST")
                    .to_string()
            },
        );

        let customer_phone = order
            .customer
            .phone
            .as_deref()
            .map_or_else(|| "Not provided".to_owned(), str::to_owned);

        Self {
            order_id: order.order_id.to_string(),
            order_date,
            customer_name: order.customer.full_name(),
            customer_email: order.customer.email.clone(),
            customer_phone,
            shipping_address: order.customer.shipping_address(),
            lines: order
                .snapshot
                .lines
                .iter()
                .map(|line| NotificationLine {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit_price: line.price,
                    line_total: line.line_total(),
                })
                .collect(),
            order_total: order.snapshot.grand_total,
        }
    }

    /// Plain-text item list, one line per product:
    /// `Stackable Meeple Tray x2 = ₹900 (₹450 each)`.
    #[must_use]
    pub fn items_text(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                format!(
                    "{} x{} = {} ({} each)",
                    line.name, line.quantity, line.line_total, line.unit_price
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Compact one-paragraph summary used for deep links.
    #[must_use]
    pub fn summary_text(&self) -> String {
        format!(
            "Order {} ({})\n{}\nTotal: {}\nShip to: {}, {}",
            self.order_id,
            self.order_date,
            self.items_text(),
            self.order_total,
            self.customer_name,
            self.shipping_address
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cart::{Cart, CartLine};
    use crate::checkout::{CheckoutFlow, CustomerDetails};
    use crate::pricing::ShippingPolicy;
    use crate::types::{OrderId, ProductId};
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn placed_order(phone: Option<&str>) -> PlacedOrder {
        let mut cart = Cart::new();
        cart.add_line(CartLine {
            product_id: ProductId::new("meeple-tray"),
            name: "Stackable Meeple Tray".to_owned(),
            price: Rupees::new(450),
            image: "/static/images/products/meeple-tray.jpg".to_owned(),
            quantity: 2,
            customization: None,
        });

        let mut flow = CheckoutFlow::new();
        flow.submit(
            CustomerDetails {
                first_name: "Asha".to_owned(),
                last_name: "Verma".to_owned(),
                email: "asha@example.com".to_owned(),
                phone: phone.map(str::to_owned),
                address: "14 MG Road".to_owned(),
                city: "Bengaluru".to_owned(),
                state: "KA".to_owned(),
                zip_code: "560001".to_owned(),
            },
            &cart,
            ShippingPolicy::default(),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        // 09:30 UTC = 15:00 IST
        let placed_at = chrono::Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();
        flow.confirm(OrderId::generate("TRB", date, &mut rng), placed_at)
            .unwrap()
    }

    #[test]
    fn test_payload_carries_frozen_totals_and_lines() {
        let notification = OrderNotification::from_order(&placed_order(None));
        assert_eq!(notification.order_total, Rupees::new(1_020));
        assert_eq!(notification.lines.len(), 1);
        assert_eq!(notification.lines[0].quantity, 2);
        assert_eq!(notification.lines[0].unit_price, Rupees::new(450));
        assert_eq!(notification.lines[0].line_total, Rupees::new(900));
        assert_eq!(
            notification.shipping_address,
            "14 MG Road, Bengaluru, KA 560001"
        );
    }

    #[test]
    fn test_order_date_is_rendered_in_ist() {
        let notification = OrderNotification::from_order(&placed_order(None));
        assert_eq!(
            notification.order_date,
            "Saturday, 15 June 2024, 03:00 PM IST"
        );
    }

    #[test]
    fn test_missing_phone_becomes_not_provided() {
        assert_eq!(
            OrderNotification::from_order(&placed_order(None)).customer_phone,
            "Not provided"
        );
        assert_eq!(
            OrderNotification::from_order(&placed_order(Some("98450 12345"))).customer_phone,
            "98450 12345"
        );
    }

    #[test]
    fn test_items_text_lists_each_line() {
        let notification = OrderNotification::from_order(&placed_order(None));
        assert_eq!(
            notification.items_text(),
            "Stackable Meeple Tray x2 = \u{20b9}900 (\u{20b9}450 each)"
        );
    }

    #[test]
    fn test_summary_text_mentions_order_id_and_total() {
        let notification = OrderNotification::from_order(&placed_order(None));
        let summary = notification.summary_text();
        assert!(summary.contains(&notification.order_id));
        assert!(summary.contains("Total: \u{20b9}1,020"));
    }
}
