//! Cart lines and saved cart templates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartTemplateId, ProductId};

/// Product fields the server joins onto a cart line.
///
/// Every field is optional because partial responses (e.g. from
/// `POST /cart/add`) may omit the join entirely or in part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ProductSnapshot {
    /// Overwrite the fields `incoming` carries, keep the rest.
    pub fn merge(&mut self, incoming: Self) {
        if incoming.title.is_some() {
            self.title = incoming.title;
        }
        if incoming.brand.is_some() {
            self.brand = incoming.brand;
        }
        if incoming.price.is_some() {
            self.price = incoming.price;
        }
        if incoming.url.is_some() {
            self.url = incoming.url;
        }
    }
}

/// A line in the signed-in account's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product this line refers to; unique within a cart.
    pub product_id: ProductId,
    /// Units of the product.
    pub quantity: u32,
    /// Denormalized product data from the server join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CartItem {
    /// Merge a server response for the same product into this line.
    ///
    /// Quantity and every field present in `incoming` are overwritten.
    /// Snapshot fields the response omits are preserved.
    pub fn merge(&mut self, incoming: Self) {
        debug_assert_eq!(self.product_id, incoming.product_id);

        self.quantity = incoming.quantity;
        if incoming.updated_at.is_some() {
            self.updated_at = incoming.updated_at;
        }
        match (&mut self.product, incoming.product) {
            (Some(existing), Some(snapshot)) => existing.merge(snapshot),
            (None, Some(snapshot)) => self.product = Some(snapshot),
            (_, None) => {}
        }
    }

    /// Unit price from the snapshot, if the server disclosed one.
    #[must_use]
    pub fn unit_price(&self) -> Option<Decimal> {
        self.product.as_ref().and_then(|p| p.price)
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price().map(|price| price * Decimal::from(self.quantity))
    }

    /// Title for display, falling back to the product ID.
    #[must_use]
    pub fn display_title(&self) -> String {
        self.product
            .as_ref()
            .and_then(|p| p.title.clone())
            .unwrap_or_else(|| format!("Product #{}", self.product_id))
    }
}

/// A named, saved copy of a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTemplate {
    pub id: CartTemplateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub item_count: u32,
}

/// A saved cart template with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTemplateDetails {
    #[serde(flatten)]
    pub template: CartTemplate,
    #[serde(default)]
    pub items: Vec<CartItem>,
}
