//! Orders, quotes and payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::id::{OrderId, PaymentId, ProductId};
use super::status::OrderStatus;

/// A line on an order, priced at the time the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub quantity: u32,
    /// Unit price when ordered; absent on quotes awaiting pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// An order or submitted quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
    /// Address copied onto the order at checkout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Order {
    /// Total units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Server total, or the sum of priced lines when the server sent none.
    #[must_use]
    pub fn computed_total(&self) -> Option<Decimal> {
        self.total.or_else(|| {
            self.items
                .iter()
                .map(|line| line.price.map(|p| p * Decimal::from(line.quantity)))
                .sum()
        })
    }
}

/// A payment recorded against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_computed_total_sums_priced_lines() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 9,
            "created_at": "2026-03-01T12:00:00Z",
            "status": "completed",
            "items": [
                {"product_id": 1, "quantity": 2, "price": "10.00"},
                {"product_id": 2, "quantity": 1, "price": "5.50"}
            ]
        }))
        .unwrap();

        assert_eq!(order.unit_count(), 3);
        assert_eq!(order.computed_total(), Some(Decimal::new(2550, 2)));
    }

    #[test]
    fn test_computed_total_unknown_when_quote_unpriced() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": 10,
            "created_at": "2026-03-01T12:00:00Z",
            "items": [{"product_id": 1, "quantity": 2}]
        }))
        .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.computed_total(), None);
    }
}
