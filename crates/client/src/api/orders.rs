//! Order, quote and payment history endpoints.

use serde::Serialize;
use tracing::instrument;
use wholesale_core::{AddressId, Order, PaymentRecord};

use crate::error::Result;
use crate::http::{Envelope, HttpClient};

/// Body for `POST /orders/checkout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub address_id: AddressId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct QuoteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
}

/// Client for `/orders/*`.
#[derive(Clone)]
pub struct OrdersApi {
    http: HttpClient,
}

impl OrdersApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Orders and quotes placed by the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn my_orders(&self) -> Result<Vec<Order>> {
        let envelope: Envelope<Vec<Order>> = self.http.get("/orders/my-orders").await?;
        Ok(envelope.data)
    }

    /// Turn the server cart into an order shipped to `request.address_id`.
    ///
    /// # Errors
    ///
    /// Returns the server's error, e.g. for an empty cart.
    #[instrument(skip(self, request), fields(address_id = %request.address_id))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<Order> {
        let envelope: Envelope<Order> = self.http.post("/orders/checkout", request).await?;
        Ok(envelope.data)
    }

    /// Submit the server cart for wholesale pricing.
    ///
    /// # Errors
    ///
    /// Returns the server's error, e.g. for an empty cart.
    #[instrument(skip(self, notes))]
    pub async fn submit_quote(&self, notes: Option<&str>) -> Result<Order> {
        let body = QuoteRequest {
            notes: notes.map(str::trim).filter(|n| !n.is_empty()),
        };
        let envelope: Envelope<Order> = self.http.post("/orders/submit-quote", &body).await?;
        Ok(envelope.data)
    }

    /// Payments recorded against the account's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn payment_history(&self) -> Result<Vec<PaymentRecord>> {
        let envelope: Envelope<Vec<PaymentRecord>> =
            self.http.get("/orders/payment-history").await?;
        Ok(envelope.data)
    }
}
