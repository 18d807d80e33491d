//! Client-side form validation.
//!
//! The server is the source of truth for every rule. These checks only catch
//! blank required fields before a request is sent.

/// Errors raised by client-side form checks.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is empty or whitespace.
    #[error("{field} is required")]
    Required {
        /// Human-readable field name.
        field: &'static str,
    },
    /// The quantity must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// The email address is obviously malformed.
    #[error("email must contain an @ symbol")]
    MalformedEmail,
    /// The signed-in account may not perform the action.
    #[error("{0}")]
    NotPermitted(String),
    /// An upload was given a content type that does not parse.
    #[error("{0} is not a valid file type")]
    InvalidMimeType(String),
}

/// Reject a blank required field.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] if `value` is empty after trimming.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}
