//! Shipping and billing addresses.

use serde::{Deserialize, Serialize};

use super::id::AddressId;
use super::validation::{ValidationError, require};

/// Whether an address is used for shipping or billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    #[default]
    Shipping,
    Billing,
}

impl std::str::FromStr for AddressKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shipping" => Ok(Self::Shipping),
            "billing" => Ok(Self::Billing),
            _ => Err(format!("invalid address type: {s}")),
        }
    }
}

/// A saved address.
///
/// The server keeps at most one default per [`AddressKind`]; the client
/// never enforces that itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: AddressId,
    #[serde(default, rename = "type")]
    pub kind: AddressKind,
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Single-line summary for lists and prompts.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.clone()];
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.is_empty()) {
            parts.push(line2.to_string());
        }
        parts.push(format!("{}, {} {}", self.city, self.state, self.postal_code));
        parts.join(", ")
    }
}

/// Form payload for a new address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    #[serde(rename = "type")]
    pub kind: AddressKind,
    pub name: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl NewAddress {
    /// Check the fields the address form marks as required.
    ///
    /// # Errors
    ///
    /// Returns the first blank required field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Name", &self.name)?;
        require("Address line 1", &self.line1)?;
        require("City", &self.city)?;
        require("State", &self.state)?;
        require("Postal code", &self.postal_code)
    }
}

fn default_country() -> String {
    "US".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_wire_format() {
        let address: Address = serde_json::from_value(serde_json::json!({
            "id": 5,
            "type": "billing",
            "name": "Cloud Nine Smoke Shop",
            "line1": "12 Main St",
            "city": "Austin",
            "state": "TX",
            "postal_code": "78701",
            "is_default": true
        }))
        .unwrap();

        assert_eq!(address.kind, AddressKind::Billing);
        assert_eq!(address.country, "US");
        assert_eq!(address.one_line(), "12 Main St, Austin, TX 78701");
    }

    #[test]
    fn test_new_address_requires_city() {
        let address = NewAddress {
            name: "Shop".to_string(),
            line1: "1 Elm".to_string(),
            state: "TX".to_string(),
            postal_code: "78701".to_string(),
            ..NewAddress::default()
        };
        assert_eq!(
            address.validate(),
            Err(ValidationError::Required { field: "City" })
        );
    }
}
