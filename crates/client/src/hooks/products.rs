//! Catalogue hooks.

use wholesale_core::{Product, ProductId};

use super::Query;
use crate::api::ProductsApi;

/// Products on a listing screen with no dependency.
pub type ProductList = Query<(), Vec<Product>>;

/// Homepage products.
#[must_use]
pub fn home_products(api: &ProductsApi) -> ProductList {
    let api = api.clone();
    Query::new(move |()| {
        let api = api.clone();
        async move { api.home().await }
    })
}

/// Products for the display page.
#[must_use]
pub fn display_products(api: &ProductsApi) -> ProductList {
    let api = api.clone();
    Query::new(move |()| {
        let api = api.clone();
        async move { api.display().await }
    })
}

/// Every storefront product.
#[must_use]
pub fn all_products(api: &ProductsApi) -> ProductList {
    let api = api.clone();
    Query::new(move |()| {
        let api = api.clone();
        async move { api.all().await }
    })
}

/// Products of one brand; refetches when the brand changes.
#[must_use]
pub fn brand_products(api: &ProductsApi) -> Query<String, Vec<Product>> {
    let api = api.clone();
    Query::new(move |brand: String| {
        let api = api.clone();
        async move { api.by_brand(&brand).await }
    })
}

/// Products in one category; refetches when the category changes.
#[must_use]
pub fn category_products(api: &ProductsApi) -> Query<String, Vec<Product>> {
    let api = api.clone();
    Query::new(move |category: String| {
        let api = api.clone();
        async move { api.by_category(&category).await }
    })
}

/// A single product page.
#[must_use]
pub fn product_detail(api: &ProductsApi) -> Query<ProductId, Product> {
    let api = api.clone();
    Query::new(move |id: ProductId| {
        let api = api.clone();
        async move { api.product(id).await }
    })
}
