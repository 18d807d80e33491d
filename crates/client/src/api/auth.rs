//! Authentication endpoints.

use serde::de::IgnoredAny;
use tracing::instrument;
use wholesale_core::{Credentials, NewAccount, User};

use crate::error::Result;
use crate::http::{Envelope, HttpClient};

/// Client for `/auth/*`.
#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The account behind the current session cookie.
    ///
    /// Returns `Ok(None)` for guests, whether the server answers 401 or
    /// `{ "data": null }`.
    ///
    /// # Errors
    ///
    /// Returns an error for transport failures and non-401 error statuses.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<Option<User>> {
        match self.http.get::<Envelope<Option<User>>>("/auth/me").await {
            Ok(envelope) => Ok(envelope.data),
            Err(err) if err.is_unauthorized() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Sign in. The server sets the session cookie on success.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields without calling the
    /// server, or the server's message (e.g. "Invalid credentials").
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        credentials.validate()?;
        let envelope: Envelope<User> = self.http.post("/auth/login", credentials).await?;
        Ok(envelope.data)
    }

    /// Create a wholesale account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, or the server's message.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, account: &NewAccount) -> Result<User> {
        account.validate()?;
        let envelope: Envelope<User> = self.http.post("/auth/register", account).await?;
        Ok(envelope.data)
    }

    /// End the session. The server clears the cookie.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        let _: IgnoredAny = self.http.post_empty("/auth/logout").await?;
        Ok(())
    }
}
