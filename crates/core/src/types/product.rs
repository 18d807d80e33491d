//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::validation::{ValidationError, require};

/// A catalog product as returned by the storefront API.
///
/// Read-only from the client's perspective; products are only created or
/// edited through the admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Brand name (e.g., "Juul", "Geek Bar").
    pub brand: String,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Stock keeping unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Category names the product is listed under.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Available flavors.
    #[serde(default)]
    pub flavors: Vec<String>,
    /// Image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Wholesale unit price.
    ///
    /// Only present when the request was made by a signed-in account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether the server disclosed pricing for this product.
    #[must_use]
    pub const fn has_price(&self) -> bool {
        self.price.is_some()
    }

    /// Whether the product is listed under `category` (case-insensitive).
    #[must_use]
    pub fn in_category(&self, category: &str) -> bool {
        self.categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

/// Payload for creating a product from the admin back-office.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub flavors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

impl ProductDraft {
    /// Check the fields the admin form marks as required.
    ///
    /// # Errors
    ///
    /// Returns an error if the title or brand is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Title", &self.title)?;
        require("Brand", &self.brand)
    }
}

/// Partial update for an existing product. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_minimal_payload() {
        let product: Product =
            serde_json::from_str(r#"{"id": 42, "title": "Mango Pods", "brand": "Juul"}"#)
                .unwrap();

        assert_eq!(product.id, ProductId::new(42));
        assert!(product.categories.is_empty());
        assert!(!product.has_price());
    }

    #[test]
    fn test_product_price_accepts_string_and_number() {
        let from_str: Product = serde_json::from_str(
            r#"{"id": 1, "title": "A", "brand": "B", "price": "12.50"}"#,
        )
        .unwrap();
        let from_num: Product =
            serde_json::from_str(r#"{"id": 1, "title": "A", "brand": "B", "price": 12.5}"#)
                .unwrap();

        assert_eq!(from_str.price, from_num.price);
    }

    #[test]
    fn test_in_category_ignores_case() {
        let product: Product = serde_json::from_str(
            r#"{"id": 1, "title": "A", "brand": "B", "categories": ["Disposables"]}"#,
        )
        .unwrap();
        assert!(product.in_category("disposables"));
        assert!(!product.in_category("pods"));
    }

    #[test]
    fn test_draft_requires_title_and_brand() {
        let draft = ProductDraft {
            title: "Mint Ice".to_string(),
            ..ProductDraft::default()
        };
        assert_eq!(
            draft.validate(),
            Err(ValidationError::Required { field: "Brand" })
        );
    }

    #[test]
    fn test_update_only_sends_set_fields() {
        let update = ProductUpdate {
            title: Some("Renamed".to_string()),
            ..ProductUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Renamed"}));
    }
}
