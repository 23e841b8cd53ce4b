//! Order domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use verdant_core::{CurrencyCode, Email, OrderId, OrderStatus, PaymentStatus, UserId};

/// One line of a confirmed order.
///
/// Stored as JSON inside the order row, in the order the customer saw them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product name at the time of purchase.
    pub name: String,
    /// Number of units.
    #[serde(alias = "qty")]
    pub quantity: u32,
    /// Price of one unit in minor currency units.
    #[serde(alias = "price")]
    pub unit_price: i64,
}

impl LineItem {
    /// Quantity times unit price, or `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

/// A confirmed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Payment processor session; unique across all orders.
    pub payment_session_id: String,
    /// Set only when the purchaser was signed in at checkout.
    pub user_id: Option<UserId>,
    pub customer_email: Email,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    /// Total charged, in minor currency units.
    pub total_amount: i64,
    pub currency: CurrencyCode,
    pub items: Vec<LineItem>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated order ready to be inserted.
///
/// Built only by [`crate::services::orders::OrderStore`] after validating a
/// payment confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub payment_session_id: String,
    pub user_id: Option<UserId>,
    pub customer_email: Email,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
    pub total_amount: i64,
    pub currency: CurrencyCode,
    pub items: Vec<LineItem>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub metadata: Option<serde_json::Value>,
}

/// Outcome of recording a payment confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedOrder {
    pub order_id: OrderId,
    /// `false` when the payment session had already been recorded.
    pub created: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_accepts_short_aliases() {
        let item: LineItem =
            serde_json::from_str(r#"{"name":"Euphorbia Ingens XXL","qty":1,"price":34900}"#)
                .unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.unit_price, 34_900);
    }

    #[test]
    fn test_line_item_subtotal() {
        let item = LineItem {
            name: "Opuntia".to_string(),
            quantity: 3,
            unit_price: 1_250,
        };
        assert_eq!(item.subtotal(), Some(3_750));

        let huge = LineItem {
            name: "x".to_string(),
            quantity: u32::MAX,
            unit_price: i64::MAX,
        };
        assert_eq!(huge.subtotal(), None);
    }
}
