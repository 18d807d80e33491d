//! `ws-cli orders ...`, `ws-cli checkout` and `ws-cli quote`

use tracing::info;
use wholesale_client::Storefront;
use wholesale_client::hooks::Outcome;
use wholesale_client::hooks::orders as order_hooks;
use wholesale_core::{AddressId, Order};

use super::{CommandError, loaded, money};

pub async fn list(storefront: &Storefront) -> Result<(), CommandError> {
    let hook = order_hooks::my_orders(storefront.orders());
    let outcome = hook.mount(()).await;
    let orders = loaded(outcome, hook.state())?;

    if orders.is_empty() {
        info!("No orders yet");
    }
    for order in &orders {
        print_order(order);
    }
    Ok(())
}

pub async fn payments(storefront: &Storefront) -> Result<(), CommandError> {
    let hook = order_hooks::payment_history(storefront.orders());
    let outcome = hook.mount(()).await;
    let payments = loaded(outcome, hook.state())?;

    if payments.is_empty() {
        info!("No payments recorded");
    }
    for payment in payments {
        info!(
            "#{} order #{} {} {} {} {}",
            payment.id,
            payment.order_id,
            payment.paid_at.format("%Y-%m-%d"),
            money(Some(payment.amount)),
            payment.method.as_deref().unwrap_or("-"),
            payment.status.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

pub async fn checkout(
    storefront: &Storefront,
    address: Option<AddressId>,
    notes: Option<&str>,
) -> Result<(), CommandError> {
    let checkout = storefront.checkout();
    if checkout.load().await != Outcome::Loaded {
        return Err(CommandError::Failed(
            checkout
                .addresses()
                .error
                .unwrap_or_else(|| "Could not load checkout".to_string()),
        ));
    }
    if storefront.cart_store().state().is_empty() {
        return Err(CommandError::InvalidInput("The cart is empty".to_string()));
    }

    let address_id = address
        .or_else(|| checkout.preselected_address())
        .ok_or_else(|| {
            CommandError::InvalidInput(
                "No shipping address saved; add one with `ws-cli addresses add`".to_string(),
            )
        })?;

    let order = checkout.place_order(address_id, notes).await?;
    info!("Order placed");
    print_order(&order);
    Ok(())
}

pub async fn quote(storefront: &Storefront, notes: Option<&str>) -> Result<(), CommandError> {
    let checkout = storefront.checkout();
    storefront.cart_store().fetch_cart().await?;
    if storefront.cart_store().state().is_empty() {
        return Err(CommandError::InvalidInput("The cart is empty".to_string()));
    }

    let order = checkout.submit_quote(notes).await?;
    info!("Quote requested; we will be in touch with pricing");
    print_order(&order);
    Ok(())
}

fn print_order(order: &Order) {
    info!(
        "#{} {} {} {} units, total {}",
        order.id,
        order.created_at.format("%Y-%m-%d"),
        order.status,
        order.unit_count(),
        money(order.computed_total())
    );
    if let Some(address) = &order.shipping_address {
        info!("  ship to {}: {}", address.name, address.one_line());
    }
    for line in &order.items {
        info!(
            "  #{} {} x{} {}",
            line.product_id,
            line.title.as_deref().unwrap_or("-"),
            line.quantity,
            money(line.price)
        );
    }
}
