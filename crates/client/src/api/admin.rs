//! Admin back-office endpoints.
//!
//! Unlike the storefront endpoints these return the resource directly,
//! without a `{ data }` envelope.

use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde::de::IgnoredAny;
use tracing::instrument;
use wholesale_core::{
    AdminUser, FeatureSlot, FeatureUpdate, Product, ProductDraft, ProductId, ProductPage,
    ProductUpdate, StoreSettings, UploadedFile, UserId, UserUpdate, ValidationError, require,
};

use crate::error::Result;
use crate::http::HttpClient;

/// Query string for `GET /admin/products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub page: u32,
}

/// Client for `/admin/*`.
#[derive(Clone)]
pub struct AdminApi {
    http: HttpClient,
}

impl AdminApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<AdminUser>> {
        self.http.get("/admin/users").await
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn delete_user(&self, id: UserId) -> Result<()> {
        let _: IgnoredAny = self.http.delete(&format!("/admin/users/{id}")).await?;
        Ok(())
    }

    /// Change an account's role or approval.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, update), fields(user_id = %id))]
    pub async fn update_user(&self, id: UserId, update: &UserUpdate) -> Result<AdminUser> {
        self.http.patch(&format!("/admin/users/{id}"), update).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// One page of the product listing, optionally filtered by a search term.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, params: &ProductListParams) -> Result<ProductPage> {
        self.http.get_query("/admin/products", params).await
    }

    /// A single product with admin-only fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        self.http.get(&format!("/admin/products/{id}")).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title or brand, or the
    /// server's error.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product> {
        draft.validate()?;
        self.http.post("/admin/products", draft).await
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, update), fields(product_id = %id))]
    pub async fn update_product(&self, id: ProductId, update: &ProductUpdate) -> Result<Product> {
        self.http.patch(&format!("/admin/products/{id}"), update).await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        let _: IgnoredAny = self.http.delete(&format!("/admin/products/{id}")).await?;
        Ok(())
    }

    // =========================================================================
    // Media & Settings
    // =========================================================================

    /// Upload an image; the response holds its public URL.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank file name or an invalid MIME
    /// type, or the server's error.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile> {
        let form = Form::new().part("file", file_part(file_name, mime, bytes)?);
        self.http.post_multipart("/admin/upload", form).await
    }

    /// Point a homepage feature slot at a product or image.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank key, or the server's error.
    #[instrument(skip(self, update), fields(key = %update.key))]
    pub async fn update_feature(&self, update: &FeatureUpdate) -> Result<FeatureSlot> {
        require("Feature key", &update.key)?;
        self.http.patch("/admin/update-feature", update).await
    }

    /// Store settings, including feature slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn settings(&self) -> Result<StoreSettings> {
        self.http.get("/admin/settings").await
    }
}

fn file_part(
    file_name: &str,
    mime: &str,
    bytes: Vec<u8>,
) -> std::result::Result<Part, ValidationError> {
    require("File name", file_name)?;
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .map_err(|_| ValidationError::InvalidMimeType(mime.to_string()))
}
