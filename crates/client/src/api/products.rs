//! Catalog browsing endpoints.
//!
//! Prices are only included when the session belongs to a signed-in account.

use tracing::instrument;
use wholesale_core::{Product, ProductId};

use super::segment;
use crate::error::Result;
use crate::http::{Envelope, HttpClient};

/// Client for `/products/*`.
#[derive(Clone)]
pub struct ProductsApi {
    http: HttpClient,
}

impl ProductsApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    async fn list(&self, path: &str) -> Result<Vec<Product>> {
        let envelope: Envelope<Vec<Product>> = self.http.get(path).await?;
        Ok(envelope.data)
    }

    /// Products featured on the home screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn home(&self) -> Result<Vec<Product>> {
        self.list("/products/home").await
    }

    /// Products shown on the display (showcase) screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn display(&self) -> Result<Vec<Product>> {
        self.list("/products/display").await
    }

    /// Products for one brand.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn by_brand(&self, brand: &str) -> Result<Vec<Product>> {
        self.list(&format!("/products/brand/{}", segment(brand))).await
    }

    /// Products in one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>> {
        self.list(&format!("/products/category/{}", segment(category)))
            .await
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        let envelope: Envelope<Product> = self.http.get(&format!("/products/product/{id}")).await?;
        Ok(envelope.data)
    }

    /// The full catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Vec<Product>> {
        self.list("/products").await
    }
}
