//! `ws-cli products ...`

use tracing::info;
use wholesale_client::Storefront;
use wholesale_client::hooks::products;
use wholesale_core::{Product, ProductId};

use super::{CommandError, loaded, money};

pub async fn home(storefront: &Storefront) -> Result<(), CommandError> {
    let hook = products::home_products(storefront.products());
    let outcome = hook.mount(()).await;
    print_products(&loaded(outcome, hook.state())?);
    Ok(())
}

pub async fn display(storefront: &Storefront) -> Result<(), CommandError> {
    let hook = products::display_products(storefront.products());
    let outcome = hook.mount(()).await;
    print_products(&loaded(outcome, hook.state())?);
    Ok(())
}

pub async fn all(storefront: &Storefront) -> Result<(), CommandError> {
    let hook = products::all_products(storefront.products());
    let outcome = hook.mount(()).await;
    print_products(&loaded(outcome, hook.state())?);
    Ok(())
}

pub async fn brand(storefront: &Storefront, name: String) -> Result<(), CommandError> {
    let hook = products::brand_products(storefront.products());
    let outcome = hook.mount(name).await;
    print_products(&loaded(outcome, hook.state())?);
    Ok(())
}

pub async fn category(storefront: &Storefront, name: String) -> Result<(), CommandError> {
    let hook = products::category_products(storefront.products());
    let outcome = hook.mount(name).await;
    print_products(&loaded(outcome, hook.state())?);
    Ok(())
}

pub async fn show(storefront: &Storefront, id: ProductId) -> Result<(), CommandError> {
    let hook = products::product_detail(storefront.products());
    let outcome = hook.mount(id).await;
    let product = loaded(outcome, hook.state())?;

    info!("#{} {} ({})", product.id, product.title, product.brand);
    info!("  price: {}", money(product.price));
    if let Some(sku) = &product.sku {
        info!("  sku: {sku}");
    }
    if !product.categories.is_empty() {
        info!("  categories: {}", product.categories.join(", "));
    }
    if !product.flavors.is_empty() {
        info!("  flavors: {}", product.flavors.join(", "));
    }
    if let Some(description) = &product.description {
        info!("  {description}");
    }
    Ok(())
}

pub(super) fn print_products(products: &[Product]) {
    if products.is_empty() {
        info!("No products");
        return;
    }
    for product in products {
        info!(
            "{:<8} {:<40} {:<16} {}",
            format!("#{}", product.id),
            product.title,
            product.brand,
            money(product.price)
        );
    }
}
