//! Everything a host needs, shared behind one handle.

use std::sync::Arc;

use crate::admin::{AdminProductListing, ProductPageCache};
use crate::api::{AddressesApi, AdminApi, AuthApi, CartApi, OrdersApi, ProductsApi};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::hooks::{AddressBook, AdminSettings, AdminUsers, Checkout};
use crate::http::HttpClient;
use crate::session::SessionContext;
use crate::store::CartStore;
use crate::ui::{LoggingNavigator, LoggingNotifier, Navigator, Notifier};

/// Host callbacks the client is wired to.
#[derive(Clone)]
pub struct Host {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
}

impl Default for Host {
    fn default() -> Self {
        Self {
            navigator: Arc::new(LoggingNavigator),
            notifier: Arc::new(LoggingNotifier),
        }
    }
}

/// Client state shared across screens.
///
/// This struct is cheaply cloneable via `Arc`. All clones share one cookie
/// jar, one session, one cart store and one admin product cache.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    http: HttpClient,
    auth: AuthApi,
    products: ProductsApi,
    cart: CartApi,
    orders: OrdersApi,
    addresses: AddressesApi,
    admin: AdminApi,
    session: SessionContext,
    cart_store: CartStore,
    admin_cache: ProductPageCache,
    notifier: Arc<dyn Notifier>,
}

impl Storefront {
    /// Create the client state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: ClientConfig, host: Host) -> Result<Self> {
        let http = HttpClient::new(&config.api, host.navigator)?;
        let auth = AuthApi::new(http.clone());
        let cart = CartApi::new(http.clone());

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                session: SessionContext::new(auth.clone()),
                cart_store: CartStore::new(cart.clone()),
                products: ProductsApi::new(http.clone()),
                orders: OrdersApi::new(http.clone()),
                addresses: AddressesApi::new(http.clone()),
                admin: AdminApi::new(http.clone()),
                admin_cache: ProductPageCache::new(),
                notifier: host.notifier,
                config,
                http,
                auth,
                cart,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    #[must_use]
    pub fn auth(&self) -> &AuthApi {
        &self.inner.auth
    }

    #[must_use]
    pub fn products(&self) -> &ProductsApi {
        &self.inner.products
    }

    #[must_use]
    pub fn cart(&self) -> &CartApi {
        &self.inner.cart
    }

    #[must_use]
    pub fn orders(&self) -> &OrdersApi {
        &self.inner.orders
    }

    #[must_use]
    pub fn addresses(&self) -> &AddressesApi {
        &self.inner.addresses
    }

    #[must_use]
    pub fn admin(&self) -> &AdminApi {
        &self.inner.admin
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    #[must_use]
    pub fn cart_store(&self) -> &CartStore {
        &self.inner.cart_store
    }

    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    /// Admin product listing sharing this session's page cache.
    #[must_use]
    pub fn admin_listing(&self) -> AdminProductListing<AdminApi> {
        AdminProductListing::new(
            self.inner.admin.clone(),
            self.inner.admin_cache.clone(),
            Arc::clone(&self.inner.notifier),
            self.inner.config.listing,
        )
    }

    #[must_use]
    pub fn checkout(&self) -> Checkout {
        Checkout::new(
            self.inner.orders.clone(),
            self.inner.addresses.clone(),
            self.inner.cart_store.clone(),
            self.inner.session.clone(),
        )
    }

    #[must_use]
    pub fn address_book(&self) -> AddressBook {
        AddressBook::new(self.inner.addresses.clone())
    }

    #[must_use]
    pub fn admin_users(&self) -> AdminUsers {
        AdminUsers::new(self.inner.admin.clone(), Arc::clone(&self.inner.notifier))
    }

    #[must_use]
    pub fn admin_settings(&self) -> AdminSettings {
        AdminSettings::new(self.inner.admin.clone(), Arc::clone(&self.inner.notifier))
    }
}
