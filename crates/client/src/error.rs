//! Unified error handling with Sentry integration.
//!
//! Every API module, hook and store returns `Result<T, ApiError>`. Call sites
//! turn errors into a transient notification via [`ApiError::user_message`];
//! nothing is retried and nothing is fatal.

use thiserror::Error;
use wholesale_core::ValidationError;

use crate::config::ConfigError;

/// Message shown when the server gave no usable error body.
const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request failed before a response arrived.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The session is missing or expired. The login redirect has already fired.
    #[error("{message}")]
    Unauthorized { message: String },

    /// The response body did not have the expected shape.
    #[error("Invalid response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A client-side form check failed; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The client could not be constructed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Text for a toast or inline error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Unable to reach the server. Check your connection.".to_string(),
            Self::Decode { .. } | Self::Config(_) => GENERIC_MESSAGE.to_string(),
            Self::Status { message, .. } | Self::Unauthorized { message } => {
                if message.trim().is_empty() {
                    GENERIC_MESSAGE.to_string()
                } else {
                    message.clone()
                }
            }
            Self::Validation(err) => err.to_string(),
        }
    }

    /// HTTP status, when the server responded.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Whether this error points at a bug or outage rather than user input.
    #[must_use]
    pub const fn is_server_fault(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Decode { .. } | Self::Config(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Unauthorized { .. } | Self::Validation(_) => false,
        }
    }

    /// Send server faults to Sentry; record everything else as a breadcrumb.
    pub fn report(&self) {
        if self.is_server_fault() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API error"
            );
        } else {
            add_breadcrumb("api", &self.to_string(), self.status());
        }
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Add a breadcrumb for a failed call.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of calls
/// leading up to an error.
fn add_breadcrumb(category: &str, message: &str, status: Option<u16>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(status) = status {
        breadcrumb
            .data
            .insert("status".to_string(), serde_json::Value::from(status));
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_shows_server_message() {
        let err = ApiError::Status {
            status: 409,
            message: "Product already in template".to_string(),
        };
        assert_eq!(err.to_string(), "Product already in template");
        assert_eq!(err.user_message(), "Product already in template");
        assert_eq!(err.status(), Some(409));
        assert!(!err.is_server_fault());
    }

    #[test]
    fn test_blank_message_falls_back_to_generic() {
        let err = ApiError::Status {
            status: 500,
            message: "  ".to_string(),
        };
        assert_eq!(err.user_message(), GENERIC_MESSAGE);
        assert!(err.is_server_fault());
    }

    #[test]
    fn test_unauthorized_keeps_message() {
        let err = ApiError::Unauthorized {
            message: "Invalid credentials".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.user_message(), "Invalid credentials");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_validation_error_message() {
        let err = ApiError::from(ValidationError::Required { field: "Email" });
        assert_eq!(err.user_message(), "Email is required");
        assert_eq!(err.status(), None);
    }
}
