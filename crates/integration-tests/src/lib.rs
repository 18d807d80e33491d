//! Integration tests for the wholesale storefront client.
//!
//! [`TestServer`] runs an in-process fake of the storefront API on
//! `127.0.0.1:0`. It keeps accounts, carts, addresses, orders and the admin
//! catalogue in memory, issues a `session` cookie on login and counts every
//! request so tests can assert how many calls the client made.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p wholesale-integration-tests
//! ```
//!
//! # Seeded Accounts
//!
//! | Email | Password | Role |
//! |-------|----------|------|
//! | `buyer@example.com` | `wholesale123` | `USER` |
//! | `admin@example.com` | `admin123` | `ADMIN` |
//! | `sub@example.com` | `sub123` | `SUBACCOUNT` without ordering rights |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::task::JoinHandle;
use url::Url;
use wholesale_client::config::ListingTiming;
use wholesale_client::ui::{RecordingNavigator, RecordingNotifier};
use wholesale_client::{ClientConfig, Host, Storefront};
use wholesale_core::{
    Address, AddressId, AdminUser, CartItem, CartTemplate, CartTemplateDetails, CartTemplateId,
    Credentials, FeatureSlot, FeatureUpdate, NewAccount, NewAddress, Order, OrderId, OrderLine,
    OrderStatus, Product, ProductDraft, ProductId, ProductPage, ProductSnapshot, ProductUpdate,
    Role, StoreSettings, SubaccountPermissions, User, UserId, UserUpdate,
};

/// Products per admin listing page.
pub const ADMIN_PAGE_SIZE: usize = 10;

/// Products in the seeded catalogue.
pub const SEEDED_PRODUCTS: i32 = 25;

const SESSION_COOKIE: &str = "session";

pub const BUYER_EMAIL: &str = "buyer@example.com";
pub const BUYER_PASSWORD: &str = "wholesale123";
pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const SUBACCOUNT_EMAIL: &str = "sub@example.com";
pub const SUBACCOUNT_PASSWORD: &str = "sub123";

/// Listing timings short enough for real-time tests.
pub const FAST_TIMING: ListingTiming = ListingTiming {
    search_debounce: Duration::from_millis(40),
    prefetch_delay: Duration::from_millis(60),
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Backend state
// =============================================================================

struct Account {
    user: User,
    password: String,
    approved: bool,
}

#[derive(Default)]
struct Data {
    accounts: Vec<Account>,
    sessions: HashMap<String, UserId>,
    products: Vec<Product>,
    carts: HashMap<UserId, Vec<CartItem>>,
    templates: HashMap<UserId, Vec<(CartTemplate, Vec<CartItem>)>>,
    addresses: HashMap<UserId, Vec<Address>>,
    orders: HashMap<UserId, Vec<Order>>,
    settings: StoreSettings,
}

/// In-memory storefront backend.
pub struct Backend {
    data: Mutex<Data>,
    calls: Mutex<Vec<String>>,
    admin_queries: Mutex<Vec<(Option<String>, u32)>>,
    next_id: AtomicI32,
}

impl Backend {
    fn seeded() -> Self {
        let account = |id: i32, email: &str, password: &str, role: Role, can_place_orders: bool| {
            Account {
                user: User {
                    id: UserId::new(id),
                    email: email.to_string(),
                    name: format!("Account {id}"),
                    business_name: Some("Smoke Shop LLC".to_string()),
                    role,
                    permissions: SubaccountPermissions {
                        can_place_orders,
                        can_view_pricing: true,
                    },
                    parent_id: (role == Role::Subaccount).then_some(UserId::new(1)),
                },
                password: password.to_string(),
                approved: true,
            }
        };

        let data = Data {
            accounts: vec![
                account(1, BUYER_EMAIL, BUYER_PASSWORD, Role::User, true),
                account(2, ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin, true),
                account(3, SUBACCOUNT_EMAIL, SUBACCOUNT_PASSWORD, Role::Subaccount, false),
            ],
            products: (1..=SEEDED_PRODUCTS).map(seed_product).collect(),
            ..Data::default()
        };

        Self {
            data: Mutex::new(data),
            calls: Mutex::new(Vec::new()),
            admin_queries: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1000),
        }
    }

    fn next_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Every request received, as `METHOD /path`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Requests received for exactly `route` (e.g. `GET /cart`).
    #[must_use]
    pub fn count(&self, route: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == route).count()
    }

    /// `(search, page)` of every admin product listing request.
    #[must_use]
    pub fn admin_queries(&self) -> Vec<(Option<String>, u32)> {
        lock(&self.admin_queries).clone()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        lock(&self.data).sessions.len()
    }

    /// Drop every session, as if they all expired.
    pub fn expire_sessions(&self) {
        lock(&self.data).sessions.clear();
    }

    /// Server-side cart of an account.
    #[must_use]
    pub fn cart_of(&self, email: &str) -> Vec<CartItem> {
        let data = lock(&self.data);
        data.accounts
            .iter()
            .find(|a| a.user.email == email)
            .and_then(|a| data.carts.get(&a.user.id).cloned())
            .unwrap_or_default()
    }

    fn session_user(&self, headers: &HeaderMap) -> Result<User, Response> {
        let token = session_token(headers)
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
        let data = lock(&self.data);
        let user_id = data
            .sessions
            .get(&token)
            .copied()
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Session expired"))?;
        data.accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Not authenticated"))
    }

    fn admin_user(&self, headers: &HeaderMap) -> Result<User, Response> {
        let user = self.session_user(headers)?;
        if user.role != Role::Admin {
            return Err(error(StatusCode::FORBIDDEN, "Admin access required"));
        }
        Ok(user)
    }
}

fn seed_product(id: i32) -> Product {
    let brand = match id % 3 {
        0 => "Juul",
        1 => "Vuse",
        _ => "Geek Bar",
    };
    Product {
        id: ProductId::new(id),
        title: format!("{brand} Pod {id}"),
        brand: brand.to_string(),
        description: Some(format!("Seeded product {id}")),
        sku: Some(format!("SKU-{id:04}")),
        categories: vec![if id % 2 == 0 { "Disposables" } else { "Pods" }.to_string()],
        flavors: vec!["Mint".to_string()],
        url: Some(format!("https://cdn.example.com/products/{id}.jpg")),
        price: Some(Decimal::new(1000 + i64::from(id) * 50, 2)),
        created_at: None,
        updated_at: None,
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn data<T: Serialize>(value: &T) -> Response {
    Json(json!({ "data": value })).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

type Shared = State<Arc<Backend>>;

// =============================================================================
// Auth
// =============================================================================

async fn me(State(backend): Shared, headers: HeaderMap) -> Response {
    match backend.session_user(&headers) {
        Ok(user) => data(&user),
        Err(response) => response,
    }
}

async fn login(State(backend): Shared, Json(body): Json<Credentials>) -> Response {
    let user = {
        let data = lock(&backend.data);
        data.accounts
            .iter()
            .find(|a| a.user.email == body.email && a.password == body.password)
            .map(|a| (a.user.clone(), a.approved))
    };
    let Some((user, approved)) = user else {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };
    if !approved {
        return error(StatusCode::FORBIDDEN, "Account awaiting approval");
    }

    let token = format!("token-{}", backend.next_id());
    lock(&backend.data).sessions.insert(token.clone(), user.id);
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly"),
        )],
        data(&user),
    )
        .into_response()
}

async fn register(State(backend): Shared, Json(body): Json<NewAccount>) -> Response {
    let mut data = lock(&backend.data);
    if data.accounts.iter().any(|a| a.user.email == body.email) {
        return error(StatusCode::CONFLICT, "Email already registered");
    }
    let user = User {
        id: UserId::new(backend.next_id()),
        email: body.email,
        name: body.name,
        business_name: body.business_name,
        role: Role::User,
        permissions: SubaccountPermissions::default(),
        parent_id: None,
    };
    data.accounts.push(Account {
        user: user.clone(),
        password: body.password,
        approved: false,
    });
    drop(data);
    (StatusCode::CREATED, self::data(&user)).into_response()
}

async fn logout(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        lock(&backend.data).sessions.remove(&token);
    }
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"),
        )],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

// =============================================================================
// Products
// =============================================================================

/// Prices are only disclosed to signed-in accounts.
fn visible(products: impl Iterator<Item = Product>, signed_in: bool) -> Vec<Product> {
    products
        .map(|mut p| {
            if !signed_in {
                p.price = None;
            }
            p
        })
        .collect()
}

async fn all_products(State(backend): Shared, headers: HeaderMap) -> Response {
    let signed_in = backend.session_user(&headers).is_ok();
    let products = lock(&backend.data).products.clone();
    data(&visible(products.into_iter(), signed_in))
}

async fn home_products(State(backend): Shared, headers: HeaderMap) -> Response {
    let signed_in = backend.session_user(&headers).is_ok();
    let products = lock(&backend.data).products.clone();
    data(&visible(products.into_iter().take(8), signed_in))
}

async fn display_products(State(backend): Shared, headers: HeaderMap) -> Response {
    let signed_in = backend.session_user(&headers).is_ok();
    let products = lock(&backend.data).products.clone();
    data(&visible(products.into_iter().rev().take(4), signed_in))
}

async fn brand_products(
    State(backend): Shared,
    headers: HeaderMap,
    Path(brand): Path<String>,
) -> Response {
    let signed_in = backend.session_user(&headers).is_ok();
    let products = lock(&backend.data).products.clone();
    data(&visible(
        products
            .into_iter()
            .filter(|p| p.brand.eq_ignore_ascii_case(&brand)),
        signed_in,
    ))
}

async fn category_products(
    State(backend): Shared,
    headers: HeaderMap,
    Path(category): Path<String>,
) -> Response {
    let signed_in = backend.session_user(&headers).is_ok();
    let products = lock(&backend.data).products.clone();
    data(&visible(
        products.into_iter().filter(|p| p.in_category(&category)),
        signed_in,
    ))
}

async fn product(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Response {
    let signed_in = backend.session_user(&headers).is_ok();
    let found = lock(&backend.data)
        .products
        .iter()
        .find(|p| p.id == id)
        .cloned();
    match found {
        Some(product) => data(&visible(std::iter::once(product), signed_in).pop()),
        None => error(StatusCode::NOT_FOUND, "Product not found"),
    }
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Deserialize)]
struct AddToCart {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Deserialize)]
struct TemplateName {
    name: String,
}

async fn cart(State(backend): Shared, headers: HeaderMap) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let items = lock(&backend.data)
        .carts
        .get(&user.id)
        .cloned()
        .unwrap_or_default();
    data(&items)
}

/// Upserts the line. An existing line is answered with only the changed
/// columns, without the product join.
async fn add_to_cart(
    State(backend): Shared,
    headers: HeaderMap,
    Json(body): Json<AddToCart>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if body.quantity == 0 {
        return error(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }

    let mut data = lock(&backend.data);
    let Some(product) = data.products.iter().find(|p| p.id == body.product_id).cloned() else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    let now = Utc::now();
    let cart = data.carts.entry(user.id).or_default();

    if let Some(line) = cart.iter_mut().find(|l| l.product_id == body.product_id) {
        line.quantity = body.quantity;
        line.updated_at = Some(now);
        let partial = json!({
            "product_id": body.product_id,
            "quantity": body.quantity,
            "updated_at": now,
        });
        return Json(json!({ "data": partial })).into_response();
    }

    let line = CartItem {
        product_id: product.id,
        quantity: body.quantity,
        product: Some(ProductSnapshot {
            title: Some(product.title),
            brand: Some(product.brand),
            price: product.price,
            url: product.url,
        }),
        updated_at: Some(now),
    };
    cart.push(line.clone());
    drop(data);
    self::data(&line)
}

async fn remove_from_cart(
    State(backend): Shared,
    headers: HeaderMap,
    Path(product_id): Path<ProductId>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if let Some(cart) = lock(&backend.data).carts.get_mut(&user.id) {
        cart.retain(|l| l.product_id != product_id);
    }
    Json(json!({ "message": "Removed" })).into_response()
}

async fn save_template(
    State(backend): Shared,
    headers: HeaderMap,
    Json(body): Json<TemplateName>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut data = lock(&backend.data);
    let items = data.carts.get(&user.id).cloned().unwrap_or_default();
    if items.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Cart is empty");
    }
    let template = CartTemplate {
        id: CartTemplateId::new(backend.next_id()),
        name: body.name,
        created_at: Some(Utc::now()),
        item_count: u32::try_from(items.len()).unwrap_or(u32::MAX),
    };
    data.templates
        .entry(user.id)
        .or_default()
        .push((template.clone(), items));
    drop(data);
    (StatusCode::CREATED, self::data(&template)).into_response()
}

async fn templates(State(backend): Shared, headers: HeaderMap) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let templates: Vec<CartTemplate> = lock(&backend.data)
        .templates
        .get(&user.id)
        .map(|t| t.iter().map(|(template, _)| template.clone()).collect())
        .unwrap_or_default();
    data(&templates)
}

async fn template_details(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<CartTemplateId>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let found = lock(&backend.data)
        .templates
        .get(&user.id)
        .and_then(|t| t.iter().find(|(template, _)| template.id == id).cloned());
    match found {
        Some((template, items)) => data(&CartTemplateDetails { template, items }),
        None => error(StatusCode::NOT_FOUND, "Template not found"),
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Deserialize)]
struct CheckoutBody {
    address_id: AddressId,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct QuoteBody {
    notes: Option<String>,
}

fn order_from_cart(
    backend: &Backend,
    data: &mut Data,
    user: &User,
    shipping_address: Option<Address>,
    notes: Option<String>,
) -> Result<Order, Response> {
    let items = data.carts.remove(&user.id).unwrap_or_default();
    if items.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Cart is empty"));
    }
    let lines: Vec<OrderLine> = items
        .into_iter()
        .map(|item| OrderLine {
            product_id: item.product_id,
            title: item.product.as_ref().and_then(|p| p.title.clone()),
            quantity: item.quantity,
            price: item.unit_price(),
        })
        .collect();
    let total: Decimal = lines
        .iter()
        .filter_map(|l| l.price.map(|p| p * Decimal::from(l.quantity)))
        .sum();
    let order = Order {
        id: OrderId::new(backend.next_id()),
        created_at: Utc::now(),
        status: OrderStatus::Pending,
        shipping_address,
        items: lines,
        total: Some(total),
        notes,
    };
    data.orders.entry(user.id).or_default().push(order.clone());
    Ok(order)
}

async fn checkout(
    State(backend): Shared,
    headers: HeaderMap,
    Json(body): Json<CheckoutBody>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if !user.can_place_orders() {
        return error(StatusCode::FORBIDDEN, "Not allowed to place orders");
    }
    let mut data = lock(&backend.data);
    let address = data
        .addresses
        .get(&user.id)
        .and_then(|a| a.iter().find(|a| a.id == body.address_id).cloned());
    let Some(address) = address else {
        return error(StatusCode::BAD_REQUEST, "Address not found");
    };
    match order_from_cart(&backend, &mut data, &user, Some(address), body.notes) {
        Ok(order) => (StatusCode::CREATED, self::data(&order)).into_response(),
        Err(response) => response,
    }
}

async fn submit_quote(
    State(backend): Shared,
    headers: HeaderMap,
    Json(body): Json<QuoteBody>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut data = lock(&backend.data);
    match order_from_cart(&backend, &mut data, &user, None, body.notes) {
        Ok(order) => (StatusCode::CREATED, self::data(&order)).into_response(),
        Err(response) => response,
    }
}

async fn my_orders(State(backend): Shared, headers: HeaderMap) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let orders = lock(&backend.data)
        .orders
        .get(&user.id)
        .cloned()
        .unwrap_or_default();
    data(&orders)
}

async fn payment_history(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(response) = backend.session_user(&headers) {
        return response;
    }
    data(&Vec::<serde_json::Value>::new())
}

// =============================================================================
// Addresses
// =============================================================================

async fn addresses(State(backend): Shared, headers: HeaderMap) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let addresses = lock(&backend.data)
        .addresses
        .get(&user.id)
        .cloned()
        .unwrap_or_default();
    data(&addresses)
}

async fn create_address(
    State(backend): Shared,
    headers: HeaderMap,
    Json(body): Json<NewAddress>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut data = lock(&backend.data);
    let book = data.addresses.entry(user.id).or_default();
    let first_of_kind = !book.iter().any(|a| a.kind == body.kind);
    let is_default = body.is_default || first_of_kind;
    if is_default {
        for address in book.iter_mut().filter(|a| a.kind == body.kind) {
            address.is_default = false;
        }
    }
    let address = Address {
        id: AddressId::new(backend.next_id()),
        kind: body.kind,
        name: body.name,
        line1: body.line1,
        line2: body.line2,
        city: body.city,
        state: body.state,
        postal_code: body.postal_code,
        country: body.country,
        phone: body.phone,
        is_default,
    };
    book.push(address.clone());
    drop(data);
    (StatusCode::CREATED, self::data(&address)).into_response()
}

async fn delete_address(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<AddressId>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if let Some(book) = lock(&backend.data).addresses.get_mut(&user.id) {
        book.retain(|a| a.id != id);
    }
    Json(json!({ "message": "Deleted" })).into_response()
}

async fn set_default_address(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<AddressId>,
) -> Response {
    let user = match backend.session_user(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let mut data = lock(&backend.data);
    let Some(book) = data.addresses.get_mut(&user.id) else {
        return error(StatusCode::NOT_FOUND, "Address not found");
    };
    let Some(kind) = book.iter().find(|a| a.id == id).map(|a| a.kind) else {
        return error(StatusCode::NOT_FOUND, "Address not found");
    };
    for address in book.iter_mut().filter(|a| a.kind == kind) {
        address.is_default = address.id == id;
    }
    let updated = book.iter().find(|a| a.id == id).cloned();
    drop(data);
    self::data(&updated)
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Deserialize)]
struct AdminProductsQuery {
    search: Option<String>,
    page: Option<u32>,
}

async fn admin_products(
    State(backend): Shared,
    headers: HeaderMap,
    Query(query): Query<AdminProductsQuery>,
) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let page = query.page.unwrap_or(1).max(1);
    lock(&backend.admin_queries).push((query.search.clone(), page));

    let term = query.search.unwrap_or_default().to_lowercase();
    let matching: Vec<Product> = lock(&backend.data)
        .products
        .iter()
        .filter(|p| {
            term.is_empty()
                || p.title.to_lowercase().contains(&term)
                || p.brand.to_lowercase().contains(&term)
        })
        .cloned()
        .collect();

    let total_pages = u32::try_from(matching.len().div_ceil(ADMIN_PAGE_SIZE)).unwrap_or(u32::MAX);
    let skip = usize::try_from(page - 1).unwrap_or(usize::MAX).saturating_mul(ADMIN_PAGE_SIZE);
    let items = matching.into_iter().skip(skip).take(ADMIN_PAGE_SIZE).collect();
    Json(ProductPage { items, total_pages }).into_response()
}

async fn admin_product(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let found = lock(&backend.data)
        .products
        .iter()
        .find(|p| p.id == id)
        .cloned();
    found.map_or_else(
        || error(StatusCode::NOT_FOUND, "Product not found"),
        |p| Json(p).into_response(),
    )
}

async fn create_product(
    State(backend): Shared,
    headers: HeaderMap,
    Json(draft): Json<ProductDraft>,
) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let product = Product {
        id: ProductId::new(backend.next_id()),
        title: draft.title,
        brand: draft.brand,
        description: draft.description,
        sku: draft.sku,
        categories: draft.categories,
        flavors: draft.flavors,
        url: draft.url,
        price: draft.price,
        created_at: Some(Utc::now()),
        updated_at: None,
    };
    lock(&backend.data).products.insert(0, product.clone());
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn update_product(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
    Json(update): Json<ProductUpdate>,
) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let mut data = lock(&backend.data);
    let Some(product) = data.products.iter_mut().find(|p| p.id == id) else {
        return error(StatusCode::NOT_FOUND, "Product not found");
    };
    if let Some(title) = update.title {
        product.title = title;
    }
    if let Some(brand) = update.brand {
        product.brand = brand;
    }
    if update.price.is_some() {
        product.price = update.price;
    }
    if let Some(categories) = update.categories {
        product.categories = categories;
    }
    product.updated_at = Some(Utc::now());
    Json(product.clone()).into_response()
}

async fn delete_product(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let mut data = lock(&backend.data);
    let before = data.products.len();
    data.products.retain(|p| p.id != id);
    if data.products.len() == before {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }
    Json(json!({ "message": "Deleted" })).into_response()
}

async fn admin_users(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let users: Vec<AdminUser> = lock(&backend.data)
        .accounts
        .iter()
        .map(|a| AdminUser {
            user: a.user.clone(),
            approved: a.approved,
            created_at: None,
        })
        .collect();
    Json(users).into_response()
}

async fn update_user(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let mut data = lock(&backend.data);
    let Some(account) = data.accounts.iter_mut().find(|a| a.user.id == id) else {
        return error(StatusCode::NOT_FOUND, "User not found");
    };
    if let Some(role) = update.role {
        account.user.role = role;
    }
    if let Some(approved) = update.approved {
        account.approved = approved;
    }
    Json(AdminUser {
        user: account.user.clone(),
        approved: account.approved,
        created_at: None,
    })
    .into_response()
}

async fn delete_user(
    State(backend): Shared,
    headers: HeaderMap,
    Path(id): Path<UserId>,
) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let mut data = lock(&backend.data);
    data.accounts.retain(|a| a.user.id != id);
    data.sessions.retain(|_, user_id| *user_id != id);
    Json(json!({ "message": "Deleted" })).into_response()
}

async fn settings(State(backend): Shared, headers: HeaderMap) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let settings = lock(&backend.data).settings.clone();
    Json(settings).into_response()
}

async fn update_feature(
    State(backend): Shared,
    headers: HeaderMap,
    Json(update): Json<FeatureUpdate>,
) -> Response {
    if let Err(response) = backend.admin_user(&headers) {
        return response;
    }
    let slot = FeatureSlot {
        key: update.key,
        product_id: update.product_id,
        image_url: update.image_url,
        title: update.title,
    };
    let mut data = lock(&backend.data);
    let slots = &mut data.settings.feature_slots;
    match slots.iter_mut().find(|s| s.key == slot.key) {
        Some(existing) => *existing = slot.clone(),
        None => slots.push(slot.clone()),
    }
    drop(data);
    Json(slot).into_response()
}

// =============================================================================
// Server
// =============================================================================

async fn record(State(backend): Shared, request: Request, next: Next) -> Response {
    lock(&backend.calls).push(format!("{} {}", request.method(), request.uri().path()));
    next.run(request).await
}

fn router(backend: Arc<Backend>) -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/products", get(all_products))
        .route("/products/home", get(home_products))
        .route("/products/display", get(display_products))
        .route("/products/brand/{brand}", get(brand_products))
        .route("/products/category/{category}", get(category_products))
        .route("/products/product/{id}", get(product))
        .route("/cart", get(cart))
        .route("/cart/add", post(add_to_cart))
        .route("/cart/{product_id}", delete(remove_from_cart))
        .route("/cart/save-cart-template", post(save_template))
        .route("/cart/saved-cart-templates", get(templates))
        .route("/cart/saved-cart-templates-details/{id}", get(template_details))
        .route("/orders/my-orders", get(my_orders))
        .route("/orders/checkout", post(checkout))
        .route("/orders/submit-quote", post(submit_quote))
        .route("/orders/payment-history", get(payment_history))
        .route("/addresses", get(addresses))
        .route("/address", post(create_address))
        .route("/address/{id}", delete(delete_address))
        .route("/address/{id}/default", patch(set_default_address))
        .route("/admin/products", get(admin_products).post(create_product))
        .route(
            "/admin/products/{id}",
            get(admin_product).patch(update_product).delete(delete_product),
        )
        .route("/admin/users", get(admin_users))
        .route("/admin/users/{id}", patch(update_user).delete(delete_user))
        .route("/admin/settings", get(settings))
        .route("/admin/update-feature", patch(update_feature))
        .layer(middleware::from_fn_with_state(Arc::clone(&backend), record))
        .with_state(backend)
}

/// A running fake backend. Stops when dropped.
pub struct TestServer {
    addr: SocketAddr,
    backend: Arc<Backend>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let backend = Arc::new(Backend::seeded());
        let app = router(Arc::clone(&backend));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            addr,
            backend,
            task,
        }
    }

    #[must_use]
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Base URL the client should talk to.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a URL.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("Invalid test server URL")
    }

    /// A fresh client (empty cookie jar) with recording host seams.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client(&self) -> TestClient {
        self.client_with_timing(FAST_TIMING)
    }

    /// Like [`TestServer::client`] with custom listing timings.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn client_with_timing(&self, timing: ListingTiming) -> TestClient {
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let mut config = ClientConfig::for_base_url(self.url());
        config.listing = timing;
        let storefront = Storefront::new(
            config,
            Host {
                navigator: Arc::clone(&navigator) as _,
                notifier: Arc::clone(&notifier) as _,
            },
        )
        .expect("Failed to build storefront client");
        TestClient {
            storefront,
            navigator,
            notifier,
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A client wired to recording seams.
pub struct TestClient {
    pub storefront: Storefront,
    pub navigator: Arc<RecordingNavigator>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestClient {
    /// Sign in through the session context.
    ///
    /// # Panics
    ///
    /// Panics if the credentials are rejected.
    pub async fn sign_in(&self, email: &str, password: &str) -> User {
        self.storefront
            .session()
            .login(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .expect("Sign-in failed")
    }
}
