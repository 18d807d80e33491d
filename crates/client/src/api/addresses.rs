//! Address book endpoints.

use serde::de::IgnoredAny;
use tracing::instrument;
use wholesale_core::{Address, AddressId, NewAddress};

use crate::error::Result;
use crate::http::{Envelope, HttpClient};

/// Client for `/address` and `/addresses`.
#[derive(Clone)]
pub struct AddressesApi {
    http: HttpClient,
}

impl AddressesApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Every saved address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Address>> {
        let envelope: Envelope<Vec<Address>> = self.http.get("/addresses").await?;
        Ok(envelope.data)
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank required fields, or the
    /// server's error.
    #[instrument(skip(self, address))]
    pub async fn create(&self, address: &NewAddress) -> Result<Address> {
        address.validate()?;
        let envelope: Envelope<Address> = self.http.post("/address", address).await?;
        Ok(envelope.data)
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn delete(&self, id: AddressId) -> Result<()> {
        let _: IgnoredAny = self.http.delete(&format!("/address/{id}")).await?;
        Ok(())
    }

    /// Make an address the default for its type. The server unsets the old one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(address_id = %id))]
    pub async fn set_default(&self, id: AddressId) -> Result<Address> {
        let envelope: Envelope<Address> =
            self.http.patch_empty(&format!("/address/{id}/default")).await?;
        Ok(envelope.data)
    }
}
