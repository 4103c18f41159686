//! Order notification dispatch.
//!
//! One payload per placed order, sent best-effort over EmailJS. Dispatch
//! happens after the order transition has committed, gets exactly one
//! attempt, and a failure is logged and abandoned - the business fulfils
//! manually from that point, so a notification hiccup must never strand
//! the buyer.
//!
//! This module also builds the two deep links the buyer sees: the UPI
//! payment link on the payment page and the WhatsApp confirmation link on
//! the success page.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use tabletop_reboxing_core::OrderNotification;
use tabletop_reboxing_core::types::Rupees;

use crate::config::EmailJsConfig;

/// EmailJS REST endpoint.
const EMAILJS_SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Errors that can occur when dispatching a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Transport for placed-order notifications.
///
/// Implementations must be cheap to call exactly once per order and must
/// not retry internally; the caller already treats dispatch as
/// fire-and-forget.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Deliver one order notification.
    async fn dispatch(&self, notification: &OrderNotification) -> Result<(), NotifyError>;
}

/// EmailJS-backed notifier.
pub struct EmailJsNotifier {
    client: reqwest::Client,
    config: EmailJsConfig,
}

impl EmailJsNotifier {
    /// Create a notifier from the EmailJS configuration.
    #[must_use]
    pub fn new(config: EmailJsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Template parameters for the order email.
    fn template_params(&self, notification: &OrderNotification) -> serde_json::Value {
        json!({
            "order_id": notification.order_id,
            "order_date": notification.order_date,
            "customer_name": notification.customer_name,
            "customer_email": notification.customer_email,
            "customer_phone": notification.customer_phone,
            "shipping_address": notification.shipping_address,
            "items_text": notification.items_text(),
            "items_html": items_html(notification),
            "order_total": notification.order_total.to_string(),
            "to_email": self.config.inbox_email,
        })
    }
}

#[async_trait]
impl OrderNotifier for EmailJsNotifier {
    async fn dispatch(&self, notification: &OrderNotification) -> Result<(), NotifyError> {
        let body = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": self.template_params(notification),
        });

        let response = self.client.post(EMAILJS_SEND_URL).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Notifier used when no transport is configured. Logs and succeeds.
pub struct NoopNotifier;

#[async_trait]
impl OrderNotifier for NoopNotifier {
    async fn dispatch(&self, notification: &OrderNotification) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %notification.order_id,
            "No notification transport configured; order recorded in logs only"
        );
        Ok(())
    }
}

/// Dispatch a notification in the background: one attempt, failures logged.
///
/// The order transition has already committed by the time this is called,
/// so nothing here can block or fail the buyer's flow.
pub fn dispatch_in_background(notifier: Arc<dyn OrderNotifier>, notification: OrderNotification) {
    tokio::spawn(async move {
        if let Err(e) = notifier.dispatch(&notification).await {
            tracing::warn!(
                order_id = %notification.order_id,
                error = %e,
                "Order notification dispatch failed (order still placed)"
            );
        } else {
            tracing::info!(order_id = %notification.order_id, "Order notification dispatched");
        }
    });
}

/// Render the itemised order table rows for the email template.
fn items_html(notification: &OrderNotification) -> String {
    notification
        .lines
        .iter()
        .map(|line| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&line.name),
                line.quantity,
                line.unit_price,
                line.line_total
            )
        })
        .collect()
}

/// Minimal HTML escaping for text interpolated into the email table.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Build the `upi://pay` deep link shown on the payment page.
///
/// `note` becomes the transaction note the payee sees in their UPI app.
#[must_use]
pub fn upi_payment_link(vpa: &str, payee: &str, amount: Rupees, note: &str) -> String {
    format!(
        "upi://pay?pa={}&pn={}&am={}&cu=INR&tn={}",
        urlencoding::encode(vpa),
        urlencoding::encode(payee),
        amount.amount(),
        urlencoding::encode(note)
    )
}

/// Build the WhatsApp deep link carrying the order summary.
///
/// `number` is digits with country code (e.g. `919845012345`); anything
/// else in the configured value is stripped.
#[must_use]
pub fn whatsapp_order_link(number: &str, notification: &OrderNotification) -> String {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(&notification.summary_text())
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tabletop_reboxing_core::NotificationLine;

    fn notification() -> OrderNotification {
        OrderNotification {
            order_id: "TRB-240615-X7K2".to_owned(),
            order_date: "Saturday, 15 June 2024, 03:00 PM IST".to_owned(),
            customer_name: "Asha Verma".to_owned(),
            customer_email: "asha@example.com".to_owned(),
            customer_phone: "Not provided".to_owned(),
            shipping_address: "14 MG Road, Bengaluru, KA 560001".to_owned(),
            lines: vec![NotificationLine {
                name: "Stackable Meeple Tray".to_owned(),
                quantity: 2,
                unit_price: Rupees::new(450),
                line_total: Rupees::new(900),
            }],
            order_total: Rupees::new(1_020),
        }
    }

    #[test]
    fn test_upi_link_encodes_fields() {
        let link = upi_payment_link(
            "tabletopreboxing@upi",
            "Tabletop Re-Boxing",
            Rupees::new(1_020),
            "Order TRB-240615-X7K2",
        );
        assert!(link.starts_with("upi://pay?pa=tabletopreboxing%40upi"));
        assert!(link.contains("pn=Tabletop%20Re-Boxing"));
        assert!(link.contains("am=1020"));
        assert!(link.contains("cu=INR"));
        assert!(link.contains("tn=Order%20TRB-240615-X7K2"));
    }

    #[test]
    fn test_whatsapp_link_strips_non_digits_and_encodes_text() {
        let link = whatsapp_order_link("+91 98450-12345", &notification());
        assert!(link.starts_with("https://wa.me/919845012345?text="));
        assert!(link.contains("TRB-240615-X7K2"));
        assert!(!link.contains(' '));
    }

    #[test]
    fn test_items_html_renders_one_row_per_line() {
        let html = items_html(&notification());
        assert_eq!(html.matches("<tr>").count(), 1);
        assert!(html.contains("Stackable Meeple Tray"));
        assert!(html.contains("\u{20b9}900"));
    }

    #[tokio::test]
    async fn test_noop_notifier_succeeds() {
        assert!(NoopNotifier.dispatch(&notification()).await.is_ok());
    }
}
