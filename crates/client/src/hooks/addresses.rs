//! Address book with mutations that refresh the list.

use tracing::instrument;
use wholesale_core::{Address, AddressId, AddressKind, NewAddress};

use super::{Outcome, Query, ResourceState};
use crate::api::AddressesApi;
use crate::error::Result;
use crate::ui::Confirmation;

/// Saved addresses for the signed-in account.
pub struct AddressBook {
    api: AddressesApi,
    list: Query<(), Vec<Address>>,
}

impl AddressBook {
    #[must_use]
    pub fn new(api: AddressesApi) -> Self {
        let list = {
            let api = api.clone();
            Query::new(move |()| {
                let api = api.clone();
                async move { api.list().await }
            })
        };
        Self { api, list }
    }

    pub async fn mount(&self) -> Outcome {
        self.list.mount(()).await
    }

    pub async fn refetch(&self) -> Outcome {
        self.list.refetch().await
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<Vec<Address>> {
        self.list.state()
    }

    /// The default address of `kind`, falling back to the first of that kind.
    #[must_use]
    pub fn default_for(&self, kind: AddressKind) -> Option<Address> {
        let addresses = self.list.state().data?;
        let mut of_kind = addresses.iter().filter(|a| a.kind == kind).peekable();
        let first = of_kind.peek().copied().cloned();
        of_kind.find(|a| a.is_default).cloned().or(first)
    }

    /// Save a new address, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns a validation error for missing fields, or the server's error.
    #[instrument(skip(self, address))]
    pub async fn add(&self, address: &NewAddress) -> Result<Address> {
        let created = self.api.create(address).await?;
        self.list.refetch().await;
        Ok(created)
    }

    /// Delete an address after confirmation. Returns `false` if declined.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, confirmation))]
    pub async fn remove(&self, id: AddressId, confirmation: &dyn Confirmation) -> Result<bool> {
        if !confirmation.confirm(&format!("Delete address #{id}?")) {
            return Ok(false);
        }
        self.api.delete(id).await?;
        self.list.refetch().await;
        Ok(true)
    }

    /// Make an address the default for its kind, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn make_default(&self, id: AddressId) -> Result<Address> {
        let updated = self.api.set_default(id).await?;
        self.list.refetch().await;
        Ok(updated)
    }

    pub fn unmount(&self) {
        self.list.unmount();
    }
}
