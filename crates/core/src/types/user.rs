//! Accounts, sessions and sign-in forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::status::Role;
use super::validation::{ValidationError, require};

/// Permission flags granted to a subaccount by its parent account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubaccountPermissions {
    /// May submit orders and quotes.
    #[serde(default)]
    pub can_place_orders: bool,
    /// May see wholesale pricing.
    #[serde(default)]
    pub can_view_pricing: bool,
}

/// The signed-in account, as returned by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// Only meaningful for [`Role::Subaccount`].
    #[serde(default)]
    pub permissions: SubaccountPermissions,
    /// Primary account that owns this subaccount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<UserId>,
}

impl User {
    /// Whether the account has back-office access.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Whether the account may submit orders or quotes.
    ///
    /// Primary accounts and admins always can; subaccounts need the flag.
    #[must_use]
    pub const fn can_place_orders(&self) -> bool {
        match self.role {
            Role::User | Role::Admin => true,
            Role::Subaccount => self.permissions.can_place_orders,
        }
    }
}

/// An account as listed in the admin back-office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(flatten)]
    pub user: User,
    /// Wholesale accounts must be approved before they see pricing.
    #[serde(default)]
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Login form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Check that both fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank field or an email without an @ symbol.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Email", &self.email)?;
        require("Password", &self.password)?;
        if !self.email.contains('@') {
            return Err(ValidationError::MalformedEmail);
        }
        Ok(())
    }
}

/// Registration form for a new wholesale account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl NewAccount {
    /// Check the fields the registration form marks as required.
    ///
    /// # Errors
    ///
    /// Returns the first blank required field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
        .validate()?;
        require("Name", &self.name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(role: &str, can_place_orders: bool) -> User {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "email": "buyer@shop.test",
            "role": role,
            "permissions": {"can_place_orders": can_place_orders}
        }))
        .unwrap()
    }

    #[test]
    fn test_subaccount_needs_permission_to_order() {
        assert!(!user("SUBACCOUNT", false).can_place_orders());
        assert!(user("SUBACCOUNT", true).can_place_orders());
        assert!(user("USER", false).can_place_orders());
    }

    #[test]
    fn test_is_admin() {
        assert!(user("ADMIN", false).is_admin());
        assert!(!user("USER", false).is_admin());
    }

    #[test]
    fn test_credentials_validation() {
        let blank = Credentials::default();
        assert_eq!(
            blank.validate(),
            Err(ValidationError::Required { field: "Email" })
        );

        let malformed = Credentials {
            email: "buyer".to_string(),
            password: "hunter22".to_string(),
        };
        assert_eq!(malformed.validate(), Err(ValidationError::MalformedEmail));
    }

    #[test]
    fn test_admin_user_flattens_user() {
        let listed: AdminUser = serde_json::from_value(serde_json::json!({
            "id": 3,
            "email": "owner@shop.test",
            "role": "USER",
            "approved": true
        }))
        .unwrap();
        assert!(listed.approved);
        assert_eq!(listed.user.id, UserId::new(3));
    }
}
