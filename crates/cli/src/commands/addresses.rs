//! `ws-cli addresses ...`

use clap::Args;
use tracing::info;
use wholesale_client::Storefront;
use wholesale_client::ui::AutoConfirm;
use wholesale_core::{AddressId, AddressKind, NewAddress};

use super::{CommandError, loaded};

/// Fields of a new address.
#[derive(Args)]
pub struct AddressArgs {
    /// Recipient or business name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub line1: String,

    #[arg(long)]
    pub line2: Option<String>,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    #[arg(long)]
    pub postal_code: String,

    #[arg(long, default_value = "US")]
    pub country: String,

    #[arg(long)]
    pub phone: Option<String>,

    /// `shipping` or `billing`
    #[arg(long = "type", default_value = "shipping")]
    pub kind: AddressKind,

    /// Make this the default for its type
    #[arg(long)]
    pub default: bool,
}

impl From<AddressArgs> for NewAddress {
    fn from(args: AddressArgs) -> Self {
        Self {
            kind: args.kind,
            name: args.name,
            line1: args.line1,
            line2: args.line2,
            city: args.city,
            state: args.state,
            postal_code: args.postal_code,
            country: args.country,
            phone: args.phone,
            is_default: args.default,
        }
    }
}

pub async fn list(storefront: &Storefront) -> Result<(), CommandError> {
    let book = storefront.address_book();
    let outcome = book.mount().await;
    let addresses = loaded(outcome, book.state())?;

    if addresses.is_empty() {
        info!("No saved addresses");
    }
    for address in addresses {
        info!(
            "#{} [{:?}{}] {}: {}",
            address.id,
            address.kind,
            if address.is_default { ", default" } else { "" },
            address.name,
            address.one_line()
        );
    }
    Ok(())
}

pub async fn add(storefront: &Storefront, args: AddressArgs) -> Result<(), CommandError> {
    let book = storefront.address_book();
    let address = book.add(&NewAddress::from(args)).await?;
    info!("Saved address #{}: {}", address.id, address.one_line());
    Ok(())
}

pub async fn remove(storefront: &Storefront, id: AddressId, yes: bool) -> Result<(), CommandError> {
    let book = storefront.address_book();
    if book.remove(id, &AutoConfirm(yes)).await? {
        info!("Deleted address #{id}");
    } else {
        info!("Not deleted; pass --yes to confirm");
    }
    Ok(())
}

pub async fn make_default(storefront: &Storefront, id: AddressId) -> Result<(), CommandError> {
    let book = storefront.address_book();
    let address = book.make_default(id).await?;
    info!("Address #{} is now the default {:?} address", address.id, address.kind);
    Ok(())
}
