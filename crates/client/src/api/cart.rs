//! Cart and saved cart template endpoints.

use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::instrument;
use wholesale_core::{
    CartItem, CartTemplate, CartTemplateDetails, CartTemplateId, ProductId, ValidationError,
    require,
};

use crate::error::Result;
use crate::http::{Envelope, HttpClient};

#[derive(Debug, Serialize)]
struct AddToCart {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct SaveTemplate<'a> {
    name: &'a str,
}

/// Client for `/cart/*`.
#[derive(Clone)]
pub struct CartApi {
    http: HttpClient,
}

impl CartApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Every line in the server cart, with product data joined.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn items(&self) -> Result<Vec<CartItem>> {
        let envelope: Envelope<Vec<CartItem>> = self.http.get("/cart").await?;
        Ok(envelope.data)
    }

    /// Upsert a line. The response may carry only part of the product join.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a zero quantity, or the server's error.
    #[instrument(skip(self))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<CartItem> {
        if quantity == 0 {
            return Err(ValidationError::ZeroQuantity.into());
        }
        let body = AddToCart {
            product_id,
            quantity,
        };
        let envelope: Envelope<CartItem> = self.http.post("/cart/add", &body).await?;
        Ok(envelope.data)
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, product_id: ProductId) -> Result<()> {
        let _: IgnoredAny = self.http.delete(&format!("/cart/{product_id}")).await?;
        Ok(())
    }

    /// Save the current server cart under `name`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or the server's error.
    #[instrument(skip(self))]
    pub async fn save_template(&self, name: &str) -> Result<CartTemplate> {
        require("Template name", name)?;
        let body = SaveTemplate { name: name.trim() };
        let envelope: Envelope<CartTemplate> =
            self.http.post("/cart/save-cart-template", &body).await?;
        Ok(envelope.data)
    }

    /// Saved cart templates, without their lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn templates(&self) -> Result<Vec<CartTemplate>> {
        let envelope: Envelope<Vec<CartTemplate>> =
            self.http.get("/cart/saved-cart-templates").await?;
        Ok(envelope.data)
    }

    /// One saved template with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the template does not exist or the request fails.
    #[instrument(skip(self), fields(template_id = %id))]
    pub async fn template_details(&self, id: CartTemplateId) -> Result<CartTemplateDetails> {
        let envelope: Envelope<CartTemplateDetails> = self
            .http
            .get(&format!("/cart/saved-cart-templates-details/{id}"))
            .await?;
        Ok(envelope.data)
    }
}
