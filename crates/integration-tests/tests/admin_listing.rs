//! Admin product table: page cache, prefetch, debounced search and
//! cache invalidation after edits.
//!
//! These run in real time with short listing delays. Background prefetches
//! are awaited by polling with a bounded number of attempts.

use std::time::Duration;

use wholesale_client::admin::ProductQuery;
use wholesale_client::ui::AutoConfirm;
use wholesale_core::{ProductDraft, ProductId, ProductUpdate};
use wholesale_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, BUYER_EMAIL, BUYER_PASSWORD, TestServer,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const POLL_ATTEMPTS: u32 = 100;

/// Poll `done` until it holds or the attempts run out.
async fn eventually(mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..POLL_ATTEMPTS {
        if done() {
            return true;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    done()
}

fn listed(server: &TestServer) -> usize {
    server.backend().count("GET /admin/products")
}

fn requests_for(server: &TestServer, search: Option<&str>, page: u32) -> usize {
    server
        .backend()
        .admin_queries()
        .iter()
        .filter(|(s, p)| s.as_deref() == search && *p == page)
        .count()
}

// ============================================================================
// Paging and prefetch
// ============================================================================

#[tokio::test]
async fn test_mount_loads_page_one_then_prefetches_page_two() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();

    listing.mount().await;
    let state = listing.settled().await;
    assert_eq!(state.items().len(), 10);
    assert_eq!(state.total_pages(), 3);

    let page_two = ProductQuery::new(None, 2);
    assert!(eventually(|| listing.cache().contains(&page_two)).await);
    assert_eq!(requests_for(&server, None, 2), 1);
}

#[tokio::test]
async fn test_prefetched_page_is_shown_without_a_request() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();
    listing.mount().await;
    listing.settled().await;
    let page_two = ProductQuery::new(None, 2);
    assert!(eventually(|| listing.cache().contains(&page_two)).await);
    let before = listed(&server);

    listing.set_page(2).await;

    let state = listing.state();
    assert!(!state.loading);
    assert_eq!(state.query.page(), 2);
    assert_eq!(state.items().len(), 10);
    assert_eq!(listed(&server), before);
}

#[tokio::test]
async fn test_returning_to_a_visited_page_uses_the_cache() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();
    listing.mount().await;
    listing.settled().await;
    listing.set_page(2).await;
    listing.settled().await;
    let page_three = ProductQuery::new(None, 3);
    assert!(eventually(|| listing.cache().contains(&page_three)).await);
    let page_one_requests = requests_for(&server, None, 1);

    listing.set_page(1).await;

    let state = listing.state();
    assert_eq!(state.query.page(), 1);
    assert!(!state.loading);
    assert_eq!(requests_for(&server, None, 1), page_one_requests);
}

#[tokio::test]
async fn test_last_page_prefetches_nothing() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();

    listing.set_page(3).await;
    let state = listing.settled().await;
    assert_eq!(state.items().len(), 5);

    assert!(!eventually(|| requests_for(&server, None, 4) > 0).await);
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_typing_a_search_sends_only_the_final_term() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();

    listing.set_search("j").await;
    listing.set_search("ju").await;
    listing.set_search("juul").await;
    let state = listing.settled().await;

    let searches: Vec<_> = server
        .backend()
        .admin_queries()
        .into_iter()
        .filter_map(|(search, _)| search)
        .collect();
    assert_eq!(searches, vec!["juul".to_string()]);
    assert_eq!(state.query.search(), Some("juul"));
    assert!(state.items().iter().all(|p| p.brand == "Juul"));
}

#[tokio::test]
async fn test_blank_search_is_the_unfiltered_listing() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();
    listing.mount().await;
    listing.settled().await;
    let before = listed(&server);

    listing.set_search("   ").await;

    assert_eq!(listing.state().query, ProductQuery::default());
    assert_eq!(listed(&server), before);
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_create_clears_cache_and_reloads_page_one() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();
    listing.mount().await;
    listing.settled().await;
    let page_two = ProductQuery::new(None, 2);
    assert!(eventually(|| listing.cache().contains(&page_two)).await);
    listing.set_page(2).await;
    listing.settled().await;

    let draft = ProductDraft {
        title: "Elf Bar BC5000".to_string(),
        brand: "Elf Bar".to_string(),
        ..ProductDraft::default()
    };
    let created = listing.create_product(&draft).await.expect("create failed");
    let state = listing.settled().await;

    assert_eq!(state.query.page(), 1);
    assert_eq!(state.items().first().map(|p| p.id), Some(created.id));
    assert_eq!(state.total_pages(), 3);
    assert!(
        client
            .notifier
            .notifications()
            .iter()
            .any(|n| n.message == "Product created")
    );

    // Page 2 was dropped from the cache and is fetched again
    assert!(eventually(|| requests_for(&server, None, 2) == 2).await);
    assert!(eventually(|| listing.cache().contains(&page_two)).await);
}

#[tokio::test]
async fn test_update_refreshes_the_listing() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();
    listing.mount().await;
    listing.settled().await;

    let update = ProductUpdate {
        title: Some("Vuse Pod 1 (new)".to_string()),
        ..ProductUpdate::default()
    };
    listing
        .update_product(ProductId::new(1), &update)
        .await
        .expect("update failed");
    let state = listing.settled().await;

    assert!(state.items().iter().any(|p| p.title == "Vuse Pod 1 (new)"));
}

#[tokio::test]
async fn test_declined_delete_sends_nothing() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();

    let deleted = listing
        .delete_product(ProductId::new(1), &AutoConfirm(false))
        .await
        .expect("declined delete errored");

    assert!(!deleted);
    assert_eq!(server.backend().count("DELETE /admin/products/1"), 0);
}

#[tokio::test]
async fn test_confirmed_delete_removes_the_product() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let listing = client.storefront.admin_listing();
    listing.mount().await;
    listing.settled().await;

    let deleted = listing
        .delete_product(ProductId::new(1), &AutoConfirm(true))
        .await
        .expect("delete failed");
    let state = listing.settled().await;

    assert!(deleted);
    assert!(state.items().iter().all(|p| p.id != ProductId::new(1)));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_non_admin_listing_shows_the_error() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(BUYER_EMAIL, BUYER_PASSWORD).await;
    let listing = client.storefront.admin_listing();

    listing.mount().await;
    let state = listing.settled().await;

    assert!(state.page.is_none());
    assert_eq!(state.error.as_deref(), Some("Admin access required"));
    assert_eq!(
        client.notifier.errors(),
        vec!["Admin access required".to_string()]
    );
}

#[tokio::test]
async fn test_listings_share_one_cache() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let first = client.storefront.admin_listing();
    first.mount().await;
    first.settled().await;
    drop(first);
    let before = listed(&server);

    let second = client.storefront.admin_listing();
    second.mount().await;

    assert_eq!(second.state().items().len(), 10);
    assert_eq!(listed(&server), before);
}
