//! `ws-cli admin ...`
//!
//! The server rejects these for non-admin accounts; the CLI only checks that
//! someone is signed in.

use std::path::Path;

use tracing::info;
use wholesale_client::Storefront;
use wholesale_client::ui::AutoConfirm;
use wholesale_core::{FeatureUpdate, ProductDraft, ProductId, Role, UserId, UserUpdate};

use super::catalog::print_products;
use super::{CommandError, loaded};

fn require_admin(storefront: &Storefront) -> Result<(), CommandError> {
    if storefront.session().current_user().is_none() {
        return Err(CommandError::NotSignedIn);
    }
    if !storefront.session().is_admin() {
        tracing::warn!("Signed-in account is not an admin; the server will likely refuse");
    }
    Ok(())
}

pub async fn users(storefront: &Storefront, pending: bool) -> Result<(), CommandError> {
    require_admin(storefront)?;
    let hook = storefront.admin_users();
    let outcome = hook.mount().await;
    let users = if pending {
        loaded(outcome, hook.state())?;
        hook.pending_approval()
    } else {
        loaded(outcome, hook.state())?
    };

    if users.is_empty() {
        info!("No accounts");
    }
    for account in users {
        info!(
            "#{} {} <{}> role={} approved={} business={}",
            account.user.id,
            account.user.name,
            account.user.email,
            account.user.role,
            account.approved,
            account.user.business_name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn approve(
    storefront: &Storefront,
    id: UserId,
    role: Option<Role>,
) -> Result<(), CommandError> {
    require_admin(storefront)?;
    let update = UserUpdate {
        role,
        approved: Some(true),
    };
    let account = storefront.admin_users().update(id, &update).await?;
    info!(
        "Account #{} approved with role {}",
        account.user.id, account.user.role
    );
    Ok(())
}

pub async fn delete_user(
    storefront: &Storefront,
    id: UserId,
    yes: bool,
) -> Result<(), CommandError> {
    require_admin(storefront)?;
    if !storefront.admin_users().delete(id, &AutoConfirm(yes)).await? {
        info!("Not deleted; pass --yes to confirm");
    }
    Ok(())
}

pub async fn products(
    storefront: &Storefront,
    search: Option<&str>,
    page: u32,
) -> Result<(), CommandError> {
    require_admin(storefront)?;
    let listing = storefront.admin_listing();
    match search {
        Some(term) => listing.set_search(term).await,
        None => listing.mount().await,
    }
    if page > 1 {
        // Let the first page land so the page count is known
        listing.settled().await;
        listing.set_page(page).await;
    }

    let state = listing.settled().await;
    if let Some(error) = state.error {
        return Err(CommandError::Failed(error));
    }
    print_products(state.items());
    info!("Page {} of {}", state.query.page(), state.total_pages().max(1));
    Ok(())
}

pub async fn create_product(
    storefront: &Storefront,
    draft: &ProductDraft,
) -> Result<(), CommandError> {
    require_admin(storefront)?;
    let listing = storefront.admin_listing();
    let product = listing.create_product(draft).await?;
    info!("Created product #{} {}", product.id, product.title);
    Ok(())
}

pub async fn delete_product(
    storefront: &Storefront,
    id: ProductId,
    yes: bool,
) -> Result<(), CommandError> {
    require_admin(storefront)?;
    let listing = storefront.admin_listing();
    if !listing.delete_product(id, &AutoConfirm(yes)).await? {
        info!("Not deleted; pass --yes to confirm");
    }
    Ok(())
}

pub async fn settings(storefront: &Storefront) -> Result<(), CommandError> {
    require_admin(storefront)?;
    let hook = storefront.admin_settings();
    let outcome = hook.mount().await;
    let settings = loaded(outcome, hook.state())?;

    for slot in &settings.feature_slots {
        info!(
            "{:<20} product={} image={} title={}",
            slot.key,
            slot.product_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            slot.image_url.as_deref().unwrap_or("-"),
            slot.title.as_deref().unwrap_or("-")
        );
    }
    for (key, value) in &settings.extra {
        info!("{key} = {value}");
    }
    Ok(())
}

pub async fn feature(storefront: &Storefront, update: &FeatureUpdate) -> Result<(), CommandError> {
    require_admin(storefront)?;
    let slot = storefront.admin_settings().update_feature(update).await?;
    info!("Feature slot {} updated", slot.key);
    Ok(())
}

pub async fn upload(storefront: &Storefront, path: &Path, mime: &str) -> Result<(), CommandError> {
    require_admin(storefront)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| CommandError::InvalidInput(format!("{}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CommandError::InvalidInput(format!("{} is not a file", path.display())))?;

    let uploaded = storefront.admin().upload(file_name, mime, bytes).await?;
    info!("Uploaded to {}", uploaded.url);
    Ok(())
}
