//! Wholesale storefront CLI - browse, order and administer from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalogue
//! ws-cli products brand "Geek Bar"
//!
//! # Put 24 units of product 42 in the cart and check out
//! ws-cli cart add 42 24
//! ws-cli checkout --address 7
//!
//! # Ask for a quote instead
//! ws-cli quote --notes "Monthly restock"
//!
//! # Search the admin product table
//! ws-cli admin products --search juul --page 2
//! ```
//!
//! Signs in with `WHOLESALE_EMAIL` / `WHOLESALE_PASSWORD` when both are set.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wholesale_client::{ClientConfig, Host, Storefront};
use wholesale_core::{AddressId, CartTemplateId, ProductId, Role, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "ws-cli")]
#[command(author, version, about = "Wholesale storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the signed-in account
    Whoami,
    /// Browse the catalogue
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Saved cart templates
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },
    /// Order and payment history
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Place an order for the current cart
    Checkout {
        /// Shipping address ID (defaults to the default shipping address)
        #[arg(short, long)]
        address: Option<AddressId>,

        /// Notes for the order
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Request a quote for the current cart
    Quote {
        /// Notes for the quote request
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// Manage saved addresses
    Addresses {
        #[command(subcommand)]
        action: AddressesAction,
    },
    /// Back-office tools (admin accounts only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// Homepage products
    Home,
    /// Display page products
    Display,
    /// Products of one brand
    Brand { name: String },
    /// Products in one category
    Category { name: String },
    /// One product
    Show { id: ProductId },
    /// Every product
    All,
}

#[derive(Subcommand)]
enum CartAction {
    /// List cart lines
    Show,
    /// Add a product, or set the quantity of an existing line
    Add { product: ProductId, quantity: u32 },
    /// Remove a product's line
    Remove { product: ProductId },
    /// Save the cart as a named template
    Save { name: String },
}

#[derive(Subcommand)]
enum TemplatesAction {
    /// List saved templates
    List,
    /// Show one template's lines
    Show { id: CartTemplateId },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Order history
    List,
    /// Payment history
    Payments,
}

#[derive(Subcommand)]
enum AddressesAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add(commands::addresses::AddressArgs),
    /// Delete an address
    Remove {
        id: AddressId,

        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Make an address the default for its type
    Default { id: AddressId },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List accounts
    Users {
        /// Only accounts awaiting approval
        #[arg(long)]
        pending: bool,
    },
    /// Approve an account, optionally changing its role
    Approve {
        id: UserId,

        /// New role (`user`, `admin`, `subaccount`)
        #[arg(short, long)]
        role: Option<Role>,
    },
    /// Delete an account
    DeleteUser {
        id: UserId,

        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Page through the product table
    Products {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Create a product
    CreateProduct {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        brand: String,

        /// Wholesale unit price
        #[arg(short, long)]
        price: Option<Decimal>,

        #[arg(long)]
        sku: Option<String>,

        /// Category (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },
    /// Delete a product
    DeleteProduct {
        id: ProductId,

        /// Skip the confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Show store settings
    Settings,
    /// Point a homepage feature slot at a product or image
    Feature {
        key: String,

        #[arg(long)]
        product: Option<ProductId>,

        #[arg(long)]
        image_url: Option<String>,

        #[arg(long)]
        title: Option<String>,
    },
    /// Upload an image
    Upload {
        path: PathBuf,

        /// MIME type of the file
        #[arg(long, default_value = "image/jpeg")]
        mime: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Sentry must be initialized before the tracing subscriber
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wholesale_client=info,wholesale_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = Storefront::new(config, Host::default())?;
    commands::sign_in(&storefront).await?;

    match cli.command {
        Commands::Whoami => commands::whoami(&storefront)?,
        Commands::Products { action } => match action {
            ProductsAction::Home => commands::catalog::home(&storefront).await?,
            ProductsAction::Display => commands::catalog::display(&storefront).await?,
            ProductsAction::Brand { name } => commands::catalog::brand(&storefront, name).await?,
            ProductsAction::Category { name } => {
                commands::catalog::category(&storefront, name).await?;
            }
            ProductsAction::Show { id } => commands::catalog::show(&storefront, id).await?,
            ProductsAction::All => commands::catalog::all(&storefront).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront).await?,
            CartAction::Add { product, quantity } => {
                commands::cart::add(&storefront, product, quantity).await?;
            }
            CartAction::Remove { product } => commands::cart::remove(&storefront, product).await?,
            CartAction::Save { name } => commands::cart::save(&storefront, &name).await?,
        },
        Commands::Templates { action } => match action {
            TemplatesAction::List => commands::cart::templates(&storefront).await?,
            TemplatesAction::Show { id } => commands::cart::template(&storefront, id).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List => commands::orders::list(&storefront).await?,
            OrdersAction::Payments => commands::orders::payments(&storefront).await?,
        },
        Commands::Checkout { address, notes } => {
            commands::orders::checkout(&storefront, address, notes.as_deref()).await?;
        }
        Commands::Quote { notes } => commands::orders::quote(&storefront, notes.as_deref()).await?,
        Commands::Addresses { action } => match action {
            AddressesAction::List => commands::addresses::list(&storefront).await?,
            AddressesAction::Add(args) => commands::addresses::add(&storefront, args).await?,
            AddressesAction::Remove { id, yes } => {
                commands::addresses::remove(&storefront, id, yes).await?;
            }
            AddressesAction::Default { id } => {
                commands::addresses::make_default(&storefront, id).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Users { pending } => commands::admin::users(&storefront, pending).await?,
            AdminAction::Approve { id, role } => {
                commands::admin::approve(&storefront, id, role).await?;
            }
            AdminAction::DeleteUser { id, yes } => {
                commands::admin::delete_user(&storefront, id, yes).await?;
            }
            AdminAction::Products { search, page } => {
                commands::admin::products(&storefront, search.as_deref(), page).await?;
            }
            AdminAction::CreateProduct {
                title,
                brand,
                price,
                sku,
                categories,
            } => {
                let draft = wholesale_core::ProductDraft {
                    title,
                    brand,
                    price,
                    sku,
                    categories,
                    ..Default::default()
                };
                commands::admin::create_product(&storefront, &draft).await?;
            }
            AdminAction::DeleteProduct { id, yes } => {
                commands::admin::delete_product(&storefront, id, yes).await?;
            }
            AdminAction::Settings => commands::admin::settings(&storefront).await?,
            AdminAction::Feature {
                key,
                product,
                image_url,
                title,
            } => {
                let update = wholesale_core::FeatureUpdate {
                    key,
                    product_id: product,
                    image_url,
                    title,
                };
                commands::admin::feature(&storefront, &update).await?;
            }
            AdminAction::Upload { path, mime } => {
                commands::admin::upload(&storefront, &path, &mime).await?;
            }
        },
    }
    Ok(())
}
