//! `ws-cli cart ...` and `ws-cli templates ...`

use tracing::info;
use wholesale_client::Storefront;
use wholesale_client::hooks::cart as template_hooks;
use wholesale_core::{CartItem, CartTemplateId, ProductId};

use super::{CommandError, loaded, money};

pub async fn show(storefront: &Storefront) -> Result<(), CommandError> {
    let store = storefront.cart_store();
    store.fetch_cart().await?;
    let state = store.state();

    print_lines(&state.items);
    info!(
        "{} units, subtotal {}",
        state.item_count(),
        money(Some(state.subtotal()))
    );
    Ok(())
}

pub async fn add(
    storefront: &Storefront,
    product: ProductId,
    quantity: u32,
) -> Result<(), CommandError> {
    let store = storefront.cart_store();
    store.fetch_cart().await?;
    let line = store.add_item_to_cart(product, quantity).await?;
    info!(
        "{} x{} in cart ({} units total)",
        line.display_title(),
        line.quantity,
        store.item_count()
    );
    Ok(())
}

pub async fn remove(storefront: &Storefront, product: ProductId) -> Result<(), CommandError> {
    let store = storefront.cart_store();
    store.fetch_cart().await?;
    store.remove_item_from_cart(product).await?;
    info!("Removed product #{product} ({} units left)", store.item_count());
    Ok(())
}

pub async fn save(storefront: &Storefront, name: &str) -> Result<(), CommandError> {
    let store = storefront.cart_store();
    store.fetch_cart().await?;
    if store.state().is_empty() {
        return Err(CommandError::InvalidInput(
            "The cart is empty; nothing to save".to_string(),
        ));
    }
    let template = store.save_as_template(name).await?;
    info!("Saved template #{} \"{}\"", template.id, template.name);
    Ok(())
}

pub async fn templates(storefront: &Storefront) -> Result<(), CommandError> {
    let hook = template_hooks::saved_templates(storefront.cart());
    let outcome = hook.mount(()).await;
    let templates = loaded(outcome, hook.state())?;

    if templates.is_empty() {
        info!("No saved templates");
    }
    for template in templates {
        let saved = template
            .created_at
            .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string());
        info!(
            "#{} {} ({} items, saved {saved})",
            template.id, template.name, template.item_count
        );
    }
    Ok(())
}

pub async fn template(storefront: &Storefront, id: CartTemplateId) -> Result<(), CommandError> {
    let hook = template_hooks::template_details(storefront.cart());
    let outcome = hook.mount(id).await;
    let details = loaded(outcome, hook.state())?;

    info!("Template #{} \"{}\"", details.template.id, details.template.name);
    print_lines(&details.items);
    Ok(())
}

fn print_lines(lines: &[CartItem]) {
    if lines.is_empty() {
        info!("Cart is empty");
        return;
    }
    for line in lines {
        info!(
            "{:<8} {:<40} x{:<5} {}",
            format!("#{}", line.product_id),
            line.display_title(),
            line.quantity,
            money(line.line_total())
        );
    }
}
