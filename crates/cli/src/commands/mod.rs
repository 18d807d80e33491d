//! Command implementations. Output goes through `tracing`.

pub mod addresses;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;

use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;
use wholesale_client::hooks::{Outcome, ResourceState};
use wholesale_client::{ApiError, Storefront};
use wholesale_core::{Credentials, User};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A screen load failed; holds the message the screen would show.
    #[error("{0}")]
    Failed(String),

    #[error("Not signed in. Set WHOLESALE_EMAIL and WHOLESALE_PASSWORD.")]
    NotSignedIn,

    #[error("{0}")]
    InvalidInput(String),
}

/// Probe the session, then sign in with configured credentials if needed.
///
/// # Errors
///
/// Returns an error if configured credentials are rejected.
pub async fn sign_in(storefront: &Storefront) -> Result<Option<User>, CommandError> {
    let session = storefront.session();
    if let Some(user) = session.init().await {
        return Ok(Some(user));
    }
    let Some(config) = &storefront.config().credentials else {
        return Ok(None);
    };
    let credentials = Credentials {
        email: config.email.clone(),
        password: config.password.expose_secret().to_string(),
    };
    Ok(Some(session.login(&credentials).await?))
}

/// The signed-in account.
///
/// # Errors
///
/// Returns [`CommandError::NotSignedIn`] for guests.
pub fn whoami(storefront: &Storefront) -> Result<(), CommandError> {
    let user = storefront
        .session()
        .current_user()
        .ok_or(CommandError::NotSignedIn)?;
    info!(
        "#{} {} <{}> role={} business={}",
        user.id,
        user.name,
        user.email,
        user.role,
        user.business_name.as_deref().unwrap_or("-")
    );
    Ok(())
}

/// Data from a finished hook load, or the message it failed with.
fn loaded<T>(outcome: Outcome, state: ResourceState<T>) -> Result<T, CommandError> {
    match (outcome, state.data) {
        (Outcome::Loaded | Outcome::Skipped, Some(data)) => Ok(data),
        _ => Err(CommandError::Failed(
            state
                .error
                .unwrap_or_else(|| "Request did not complete".to_string()),
        )),
    }
}

/// `$12.50`, or a dash when the price is hidden.
fn money(amount: Option<rust_decimal::Decimal>) -> String {
    amount.map_or_else(|| "-".to_string(), |a| format!("${a:.2}"))
}
