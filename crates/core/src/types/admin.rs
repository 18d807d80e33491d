//! Admin back-office records.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;
use super::status::Role;

/// One page of the admin product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub items: Vec<Product>,
    #[serde(rename = "totalPages", alias = "total_pages", default)]
    pub total_pages: u32,
}

impl ProductPage {
    /// Whether `page` (1-based) exists according to this page's count.
    #[must_use]
    pub const fn has_page(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }
}

/// Partial update to an account from the admin users screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
}

/// Homepage banner entry keyed by a fixed identifier (e.g. `"hero"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSlot {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Body for `PATCH /admin/update-feature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureUpdate {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Store-wide settings from `/admin/settings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub feature_slots: Vec<FeatureSlot>,
    /// Settings the client does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl StoreSettings {
    /// Look up a feature slot by key.
    #[must_use]
    pub fn feature(&self, key: &str) -> Option<&FeatureSlot> {
        self.feature_slots.iter().find(|slot| slot.key == key)
    }
}

/// Response from `POST /admin/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_accepts_both_casings() {
        let camel: ProductPage =
            serde_json::from_str(r#"{"items": [], "totalPages": 3}"#).unwrap();
        let snake: ProductPage =
            serde_json::from_str(r#"{"items": [], "total_pages": 3}"#).unwrap();

        assert_eq!(camel, snake);
        assert!(camel.has_page(3));
        assert!(!camel.has_page(4));
        assert!(!camel.has_page(0));
    }

    #[test]
    fn test_settings_keep_unknown_fields() {
        let settings: StoreSettings = serde_json::from_value(serde_json::json!({
            "feature_slots": [{"key": "hero", "title": "Spring restock"}],
            "maintenance": false
        }))
        .unwrap();

        assert_eq!(
            settings.feature("hero").and_then(|s| s.title.as_deref()),
            Some("Spring restock")
        );
        assert!(settings.extra.contains_key("maintenance"));
    }
}
