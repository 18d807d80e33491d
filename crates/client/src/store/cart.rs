//! The cart slice: server cart lines plus the status of the last request.
//!
//! Reducers on [`CartState`] are pure and synchronous. [`CartStore`] runs
//! the network call and applies `pending`, then `*_fulfilled` or `rejected`.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, instrument};
use wholesale_core::{CartItem, CartTemplate, ProductId};

use crate::api::CartApi;
use crate::error::{ApiError, Result};

/// Lifecycle of the most recent cart request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RequestStatus {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// At most one line per product.
    pub items: Vec<CartItem>,
    pub status: RequestStatus,
    pub error: Option<String>,
}

impl CartState {
    pub fn pending(&mut self) {
        self.status = RequestStatus::Pending;
        self.error = None;
    }

    pub fn rejected(&mut self, message: String) {
        self.status = RequestStatus::Rejected;
        self.error = Some(message);
    }

    pub fn fetch_fulfilled(&mut self, items: Vec<CartItem>) {
        self.items = items;
        self.status = RequestStatus::Fulfilled;
    }

    /// Upsert by product id, merging into an existing line field by field.
    /// Returns the line as stored.
    pub fn add_fulfilled(&mut self, item: CartItem) -> CartItem {
        self.status = RequestStatus::Fulfilled;
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|line| line.product_id == item.product_id)
        {
            line.merge(item);
            return line.clone();
        }
        self.items.push(item.clone());
        item
    }

    pub fn remove_fulfilled(&mut self, product_id: ProductId) {
        self.items.retain(|line| line.product_id != product_id);
        self.status = RequestStatus::Fulfilled;
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.status = RequestStatus::Idle;
        self.error = None;
    }

    /// Line for `product_id`, if it is in the cart.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|line| line.product_id == product_id)
    }

    /// Sum of quantities across lines (the cart badge). Saturates at
    /// `u32::MAX`.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Total of priced lines. Lines without a known price count as zero.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().filter_map(CartItem::line_total).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Shared cart store. Clones observe the same state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: CartApi,
    state: watch::Sender<CartState>,
}

impl CartStore {
    #[must_use]
    pub fn new(api: CartApi) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            inner: Arc::new(CartStoreInner { api, state }),
        }
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner.state.borrow().item_count()
    }

    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.inner.state.borrow().subtotal()
    }

    /// Replace the lines with the server cart.
    ///
    /// # Errors
    ///
    /// Returns the request error after recording it in the state.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> Result<()> {
        self.dispatch_pending();
        match self.inner.api.items().await {
            Ok(items) => {
                debug!(lines = items.len(), "Cart loaded");
                self.inner.state.send_modify(|s| s.fetch_fulfilled(items));
                Ok(())
            }
            Err(err) => Err(self.dispatch_rejected(err)),
        }
    }

    /// Add `quantity` of a product, or set the quantity of an existing line.
    ///
    /// Returns the line as it is after the merge.
    ///
    /// # Errors
    ///
    /// Returns the request error after recording it in the state.
    #[instrument(skip(self))]
    pub async fn add_item_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<CartItem> {
        self.dispatch_pending();
        match self.inner.api.add(product_id, quantity).await {
            Ok(item) => {
                let mut merged = item.clone();
                self.inner
                    .state
                    .send_modify(|s| merged = s.add_fulfilled(item));
                Ok(merged)
            }
            Err(err) => Err(self.dispatch_rejected(err)),
        }
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns the request error after recording it in the state.
    #[instrument(skip(self))]
    pub async fn remove_item_from_cart(&self, product_id: ProductId) -> Result<()> {
        self.dispatch_pending();
        match self.inner.api.remove(product_id).await {
            Ok(()) => {
                self.inner
                    .state
                    .send_modify(|s| s.remove_fulfilled(product_id));
                Ok(())
            }
            Err(err) => Err(self.dispatch_rejected(err)),
        }
    }

    /// Empty the local cart. No request is made; the server clears its copy
    /// as part of checkout.
    pub fn clear_cart(&self) {
        self.inner.state.send_modify(CartState::clear);
    }

    /// Save the server cart as a named template.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or the server's error.
    #[instrument(skip(self))]
    pub async fn save_as_template(&self, name: &str) -> Result<CartTemplate> {
        self.inner.api.save_template(name).await
    }

    fn dispatch_pending(&self) {
        self.inner.state.send_modify(CartState::pending);
    }

    fn dispatch_rejected(&self, err: ApiError) -> ApiError {
        err.report();
        let message = err.user_message();
        self.inner.state.send_modify(|s| s.rejected(message));
        err
    }
}
