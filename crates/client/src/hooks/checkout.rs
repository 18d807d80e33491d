//! Checkout screen: addresses and cart loaded together, then an order or a
//! quote request.

use tracing::{info, instrument};
use wholesale_core::{Address, AddressId, AddressKind, Order, ValidationError};

use super::{Outcome, Resource, ResourceState};
use crate::api::{AddressesApi, CheckoutRequest, OrdersApi};
use crate::error::Result;
use crate::session::SessionContext;
use crate::store::CartStore;

pub struct Checkout {
    orders: OrdersApi,
    addresses_api: AddressesApi,
    cart: CartStore,
    session: SessionContext,
    addresses: Resource<Vec<Address>>,
}

impl Checkout {
    #[must_use]
    pub fn new(
        orders: OrdersApi,
        addresses_api: AddressesApi,
        cart: CartStore,
        session: SessionContext,
    ) -> Self {
        Self {
            orders,
            addresses_api,
            cart,
            session,
            addresses: Resource::new(),
        }
    }

    /// Fetch addresses and the cart concurrently. Fails if either fails.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Outcome {
        self.addresses
            .load(async {
                let (addresses, ()) =
                    tokio::try_join!(self.addresses_api.list(), self.cart.fetch_cart())?;
                Ok(addresses)
            })
            .await
    }

    #[must_use]
    pub fn addresses(&self) -> ResourceState<Vec<Address>> {
        self.addresses.state()
    }

    /// Address preselected in the form: the default shipping address, or
    /// the first shipping address.
    #[must_use]
    pub fn preselected_address(&self) -> Option<AddressId> {
        let addresses = self.addresses.state().data?;
        let shipping: Vec<&Address> = addresses
            .iter()
            .filter(|a| a.kind == AddressKind::Shipping)
            .collect();
        shipping
            .iter()
            .find(|a| a.is_default)
            .or_else(|| shipping.first())
            .map(|a| a.id)
    }

    /// Place an order for the server cart and empty the local cart.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotPermitted`] for a subaccount without
    /// ordering rights, or the server's error.
    #[instrument(skip(self, notes))]
    pub async fn place_order(&self, address_id: AddressId, notes: Option<&str>) -> Result<Order> {
        self.ensure_can_order()?;
        let request = CheckoutRequest {
            address_id,
            notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
        };
        let order = self.orders.checkout(&request).await?;
        self.cart.clear_cart();
        info!(order_id = %order.id, "Order placed");
        Ok(order)
    }

    /// Ask for a quote on the server cart instead of ordering.
    ///
    /// # Errors
    ///
    /// Same as [`Checkout::place_order`].
    #[instrument(skip(self, notes))]
    pub async fn submit_quote(&self, notes: Option<&str>) -> Result<Order> {
        self.ensure_can_order()?;
        let order = self.orders.submit_quote(notes).await?;
        self.cart.clear_cart();
        info!(order_id = %order.id, "Quote requested");
        Ok(order)
    }

    fn ensure_can_order(&self) -> std::result::Result<(), ValidationError> {
        if !self.session.can_place_orders() {
            return Err(ValidationError::NotPermitted(
                "Your account is not allowed to place orders".to_string(),
            ));
        }
        Ok(())
    }

    pub fn unmount(&self) {
        self.addresses.cancel();
    }
}
