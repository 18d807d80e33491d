//! Controller for the admin product table.
//!
//! Every transition (new search, new page, refresh, mutation) cancels the
//! pending debounce and prefetch timers, then either serves a cached page
//! at once or schedules a fetch. Searches wait for the debounce; plain
//! pagination fetches immediately. Once a page is shown, the next page is
//! warmed in the background after the prefetch delay.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use wholesale_core::{Product, ProductDraft, ProductId, ProductPage, ProductUpdate};

use super::cache::{ProductPageCache, ProductQuery};
use crate::api::AdminApi;
use crate::config::ListingTiming;
use crate::error::{ApiError, Result};
use crate::ui::{Confirmation, Notification, Notifier};

/// Product endpoints the listing drives.
pub trait ProductBackend: Send + Sync + 'static {
    fn list_products(
        &self,
        query: &ProductQuery,
    ) -> impl Future<Output = Result<ProductPage>> + Send;

    fn create_product(
        &self,
        draft: &ProductDraft,
    ) -> impl Future<Output = Result<Product>> + Send;

    fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> impl Future<Output = Result<Product>> + Send;

    fn delete_product(&self, id: ProductId) -> impl Future<Output = Result<()>> + Send;
}

impl ProductBackend for AdminApi {
    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        self.products(&query.to_params()).await
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<Product> {
        Self::create_product(self, draft).await
    }

    async fn update_product(&self, id: ProductId, update: &ProductUpdate) -> Result<Product> {
        Self::update_product(self, id, update).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<()> {
        Self::delete_product(self, id).await
    }
}

/// What the admin product table renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingState {
    pub query: ProductQuery,
    /// Last page shown. Kept when a later fetch fails.
    pub page: Option<ProductPage>,
    pub loading: bool,
    pub error: Option<String>,
}

impl ListingState {
    #[must_use]
    pub fn items(&self) -> &[Product] {
        self.page.as_ref().map_or(&[], |p| p.items.as_slice())
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.page.as_ref().map_or(0, |p| p.total_pages)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    /// Cache first, then fetch after the debounce if searching.
    Debounced,
    /// Cache first, then fetch at once.
    Immediate,
    /// Skip the cache and fetch at once.
    Fresh,
}

/// Admin product listing. Dropping it cancels its timers.
pub struct AdminProductListing<B: ProductBackend> {
    inner: Arc<ListingInner<B>>,
}

struct ListingInner<B> {
    backend: B,
    cache: ProductPageCache,
    state: watch::Sender<ListingState>,
    timers: Mutex<CancellationToken>,
    notifier: Arc<dyn Notifier>,
    timing: ListingTiming,
}

impl<B: ProductBackend> AdminProductListing<B> {
    #[must_use]
    pub fn new(
        backend: B,
        cache: ProductPageCache,
        notifier: Arc<dyn Notifier>,
        timing: ListingTiming,
    ) -> Self {
        let (state, _) = watch::channel(ListingState::default());
        Self {
            inner: Arc::new(ListingInner {
                backend,
                cache,
                state,
                timers: Mutex::new(CancellationToken::new()),
                notifier,
                timing,
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> ListingState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListingState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn cache(&self) -> &ProductPageCache {
        &self.inner.cache
    }

    /// Show the first unfiltered page.
    pub async fn mount(&self) {
        self.transition(ProductQuery::default(), Fetch::Debounced).await;
    }

    /// Filter by `search` and go back to page 1.
    pub async fn set_search(&self, search: &str) {
        self.transition(ProductQuery::new(Some(search), 1), Fetch::Debounced)
            .await;
    }

    /// Move to `page` keeping the current search.
    pub async fn set_page(&self, page: u32) {
        let query = self.inner.state.borrow().query.with_page(page);
        self.transition(query, Fetch::Debounced).await;
    }

    /// Refetch the current page, bypassing the cache.
    pub async fn refresh(&self) {
        let query = self.inner.state.borrow().query.clone();
        self.transition(query, Fetch::Fresh).await;
    }

    /// Wait until no fetch is pending and return the state.
    pub async fn settled(&self) -> ListingState {
        let mut rx = self.inner.state.subscribe();
        match rx.wait_for(|s| !s.loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Create a product, then clear the cache and reload page 1.
    ///
    /// # Errors
    ///
    /// Returns the server's error after showing a notification.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product> {
        let product = self.mutate(self.inner.backend.create_product(draft)).await?;
        self.after_mutation("Product created").await;
        Ok(product)
    }

    /// Update a product, then clear the cache and reload page 1.
    ///
    /// # Errors
    ///
    /// Returns the server's error after showing a notification.
    #[instrument(skip(self, update))]
    pub async fn update_product(&self, id: ProductId, update: &ProductUpdate) -> Result<Product> {
        let product = self
            .mutate(self.inner.backend.update_product(id, update))
            .await?;
        self.after_mutation("Product updated").await;
        Ok(product)
    }

    /// Delete a product after confirmation, then clear the cache and reload
    /// page 1. Returns `false` if the confirmation was declined.
    ///
    /// # Errors
    ///
    /// Returns the server's error after showing a notification.
    #[instrument(skip(self, confirmation))]
    pub async fn delete_product(
        &self,
        id: ProductId,
        confirmation: &dyn Confirmation,
    ) -> Result<bool> {
        if !confirmation.confirm(&format!("Delete product #{id}? This cannot be undone.")) {
            debug!("Product deletion declined");
            return Ok(false);
        }
        self.mutate(self.inner.backend.delete_product(id)).await?;
        self.after_mutation("Product deleted").await;
        Ok(true)
    }

    async fn mutate<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        call.await.inspect_err(|err| self.inner.fail(err))
    }

    async fn after_mutation(&self, message: &str) {
        self.inner.cancel_timers();
        self.inner.cache.invalidate_all();
        self.inner.notifier.notify(Notification::success(message));
        let query = self.inner.state.borrow().query.with_page(1);
        self.transition(query, Fetch::Immediate).await;
    }

    async fn transition(&self, query: ProductQuery, mode: Fetch) {
        let token = self.inner.restart_timers();
        self.inner.state.send_modify(|s| {
            s.query = query.clone();
            s.error = None;
        });

        if mode != Fetch::Fresh {
            if let Some(page) = self.inner.cache.get(&query).await {
                if token.is_cancelled() {
                    return;
                }
                self.inner.commit(&query, page.clone());
                self.inner.schedule_prefetch(&token, &query, &page);
                return;
            }
        }

        self.inner.state.send_modify(|s| s.loading = true);
        let delay = (mode == Fetch::Debounced && query.search().is_some())
            .then_some(self.inner.timing.search_debounce);
        tokio::spawn(Arc::clone(&self.inner).fetch(token, query, delay));
    }
}

impl<B> ListingInner<B> {
    fn restart_timers(&self) -> CancellationToken {
        let mut timers = self.timers.lock().unwrap_or_else(PoisonError::into_inner);
        timers.cancel();
        *timers = CancellationToken::new();
        timers.clone()
    }

    fn cancel_timers(&self) {
        self.timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    /// Show `page` if `query` is still the current one.
    fn commit(&self, query: &ProductQuery, page: ProductPage) {
        self.state.send_modify(|s| {
            if s.query == *query {
                s.page = Some(page);
                s.loading = false;
                s.error = None;
            }
        });
    }

    fn fail(&self, err: &ApiError) {
        err.report();
        self.notifier.notify(Notification::error(err.user_message()));
    }
}

impl<B: ProductBackend> ListingInner<B> {
    async fn fetch(
        self: Arc<Self>,
        token: CancellationToken,
        query: ProductQuery,
        delay: Option<Duration>,
    ) {
        if let Some(delay) = delay {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                () = tokio::time::sleep(delay) => {}
            }
        }

        let generation = self.cache.generation();
        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!(key = %query.cache_key(), "Discarding superseded admin product fetch");
                return;
            }
            result = self.backend.list_products(&query) => result,
        };

        match result {
            Ok(page) => {
                self.cache.fill(&query, page.clone(), generation).await;
                if token.is_cancelled() {
                    return;
                }
                self.commit(&query, page.clone());
                self.schedule_prefetch(&token, &query, &page);
            }
            Err(err) => {
                self.fail(&err);
                let message = err.user_message();
                self.state.send_modify(|s| {
                    if s.query == query {
                        s.loading = false;
                        s.error = Some(message);
                    }
                });
            }
        }
    }

    /// Warm `page + 1` after the prefetch delay unless it is out of range or
    /// already cached. A prefetch still in flight when the timers are
    /// cancelled stores nothing. Failures are only logged.
    fn schedule_prefetch(
        self: &Arc<Self>,
        token: &CancellationToken,
        query: &ProductQuery,
        page: &ProductPage,
    ) {
        let next = query.with_page(query.page() + 1);
        if !page.has_page(next.page()) {
            return;
        }

        let inner = Arc::clone(self);
        let token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => return,
                () = tokio::time::sleep(inner.timing.prefetch_delay) => {}
            }
            if inner.cache.contains(&next) {
                debug!(key = %next.cache_key(), "Next admin product page already cached");
                return;
            }
            let generation = inner.cache.generation();
            let result = tokio::select! {
                biased;
                () = token.cancelled() => {
                    debug!(key = %next.cache_key(), "Abandoning admin product prefetch");
                    return;
                }
                result = inner.backend.list_products(&next) => result,
            };
            match result {
                Ok(page) => {
                    if token.is_cancelled() {
                        return;
                    }
                    if inner.cache.fill(&next, page, generation).await {
                        debug!(key = %next.cache_key(), "Prefetched admin product page");
                    }
                }
                Err(err) => {
                    warn!(error = %err, key = %next.cache_key(), "Admin product prefetch failed");
                }
            }
        });
    }
}

impl<B: ProductBackend> Drop for AdminProductListing<B> {
    fn drop(&mut self) {
        self.inner.cancel_timers();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    use super::*;
    use crate::ui::{AutoConfirm, RecordingNotifier};

    #[derive(Default)]
    struct FakeState {
        listed: Mutex<Vec<String>>,
        failing: Mutex<HashSet<u32>>,
        slow: Mutex<HashSet<u32>>,
        total_pages: AtomicU32,
        mutations: AtomicUsize,
    }

    #[derive(Clone, Default)]
    struct FakeBackend {
        state: Arc<FakeState>,
    }

    impl FakeBackend {
        fn with_pages(total_pages: u32) -> Self {
            let backend = Self::default();
            backend.state.total_pages.store(total_pages, Ordering::SeqCst);
            backend
        }

        fn fail_page(&self, page: u32) {
            self.state.failing.lock().unwrap().insert(page);
        }

        /// Responses for `page` take 200 ms.
        fn slow_page(&self, page: u32) {
            self.state.slow.lock().unwrap().insert(page);
        }

        fn listed(&self) -> Vec<String> {
            self.state.listed.lock().unwrap().clone()
        }

        fn product(id: i32, title: &str) -> Product {
            serde_json::from_value(serde_json::json!({
                "id": id,
                "title": title,
                "brand": "Test",
            }))
            .unwrap()
        }
    }

    impl ProductBackend for FakeBackend {
        async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
            self.state.listed.lock().unwrap().push(query.cache_key());
            // Titles carry the number of mutations seen when the request arrived
            let title = match self.state.mutations.load(Ordering::SeqCst) {
                0 => query.cache_key(),
                n => format!("{}@{n}", query.cache_key()),
            };
            let slow = self.state.slow.lock().unwrap().contains(&query.page());
            if slow {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            if self.state.failing.lock().unwrap().contains(&query.page()) {
                return Err(crate::hooks::server_error());
            }
            let id = i32::try_from(query.page()).unwrap() * 100;
            Ok(ProductPage {
                items: vec![Self::product(id, &title)],
                total_pages: self.state.total_pages.load(Ordering::SeqCst),
            })
        }

        async fn create_product(&self, draft: &ProductDraft) -> Result<Product> {
            self.state.mutations.fetch_add(1, Ordering::SeqCst);
            Ok(Self::product(1, &draft.title))
        }

        async fn update_product(&self, id: ProductId, _update: &ProductUpdate) -> Result<Product> {
            self.state.mutations.fetch_add(1, Ordering::SeqCst);
            Ok(Self::product(id.as_i32(), "Updated"))
        }

        async fn delete_product(&self, _id: ProductId) -> Result<()> {
            self.state.mutations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn listing(
        backend: &FakeBackend,
        notifier: &Arc<RecordingNotifier>,
    ) -> AdminProductListing<FakeBackend> {
        AdminProductListing::new(
            backend.clone(),
            ProductPageCache::new(),
            Arc::clone(notifier) as Arc<dyn Notifier>,
            ListingTiming::default(),
        )
    }

    async fn advance(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn shown_title(listing: &AdminProductListing<FakeBackend>) -> String {
        listing.state().items().first().unwrap().title.clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_pagination_fetches_immediately() {
        let backend = FakeBackend::with_pages(1);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        assert!(listing.state().loading);
        advance(1).await;

        assert_eq!(backend.listed(), vec!["page-1"]);
        let state = listing.state();
        assert!(!state.loading);
        assert_eq!(state.total_pages(), 1);
        assert_eq!(shown_title(&listing), "page-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_is_debounced() {
        let backend = FakeBackend::with_pages(1);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.set_search("j").await;
        advance(100).await;
        listing.set_search("ju").await;
        advance(100).await;
        listing.set_search("juul").await;
        advance(399).await;
        assert!(backend.listed().is_empty());

        advance(2).await;
        assert_eq!(backend.listed(), vec!["search-juul-1"]);
        assert_eq!(shown_title(&listing), "search-juul-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_cached_page_makes_no_call() {
        let backend = FakeBackend::with_pages(2);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.set_search("juul").await;
        advance(450).await;
        listing.set_page(2).await;
        advance(450).await;
        listing.set_page(1).await;

        let state = listing.state();
        assert!(!state.loading);
        assert_eq!(state.query, ProductQuery::new(Some("juul"), 1));
        assert_eq!(shown_title(&listing), "search-juul-1");

        advance(1000).await;
        assert_eq!(backend.listed(), vec!["search-juul-1", "search-juul-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_query_is_served_from_cache() {
        let backend = FakeBackend::with_pages(1);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(10).await;
        listing.set_search("vuse").await;
        advance(450).await;
        listing.set_search("  ").await;

        assert_eq!(shown_title(&listing), "page-1");
        assert!(!listing.state().loading);
        assert_eq!(backend.listed(), vec!["page-1", "search-vuse-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_page_is_prefetched() {
        let backend = FakeBackend::with_pages(3);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(599).await;
        assert_eq!(backend.listed(), vec!["page-1"]);

        advance(2).await;
        assert_eq!(backend.listed(), vec!["page-1", "page-2"]);

        listing.set_page(2).await;
        assert_eq!(shown_title(&listing), "page-2");
        assert_eq!(backend.listed().len(), 2);

        advance(601).await;
        assert_eq!(backend.listed(), vec!["page-1", "page-2", "page-3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_prefetch_past_last_page() {
        let backend = FakeBackend::with_pages(1);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(2000).await;

        assert_eq!(backend.listed(), vec!["page-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_failure_is_silent() {
        let backend = FakeBackend::with_pages(2);
        backend.fail_page(2);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(700).await;

        assert_eq!(backend.listed(), vec!["page-1", "page-2"]);
        assert!(notifier.errors().is_empty());
        assert!(listing.state().error.is_none());
        assert!(!listing.cache().contains(&ProductQuery::new(None, 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure_notifies_and_keeps_page() {
        let backend = FakeBackend::with_pages(3);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(1).await;
        backend.fail_page(2);
        listing.set_page(2).await;
        advance(1).await;

        assert_eq!(notifier.errors(), vec!["Internal server error".to_string()]);
        let state = listing.state();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Internal server error"));
        assert_eq!(shown_title(&listing), "page-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_clears_cache_and_refetches_first_page() {
        let backend = FakeBackend::with_pages(3);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(700).await;
        listing.set_page(2).await;
        assert_eq!(backend.listed(), vec!["page-1", "page-2"]);

        let deleted = listing
            .delete_product(ProductId::new(7), &AutoConfirm(true))
            .await
            .unwrap();
        assert!(deleted);
        advance(1).await;

        assert_eq!(backend.listed(), vec!["page-1", "page-2", "page-1"]);
        assert_eq!(listing.state().query.page(), 1);
        assert!(listing.cache().get(&ProductQuery::new(None, 2)).await.is_none());
        assert!(
            notifier
                .notifications()
                .contains(&Notification::success("Product deleted"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetch_in_flight_during_mutation_is_not_cached() {
        let backend = FakeBackend::with_pages(3);
        backend.slow_page(2);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);
        let page_two = ProductQuery::new(None, 2);

        listing.mount().await;
        advance(650).await;
        assert_eq!(backend.listed(), vec!["page-1", "page-2"]);

        listing
            .delete_product(ProductId::new(7), &AutoConfirm(true))
            .await
            .unwrap();
        advance(300).await;
        assert!(listing.cache().get(&page_two).await.is_none());

        advance(600).await;
        assert_eq!(backend.listed(), vec!["page-1", "page-2", "page-1", "page-2"]);
        listing.set_page(2).await;
        assert_eq!(shown_title(&listing), "page-2@1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_refetch_skips_debounce() {
        let backend = FakeBackend::with_pages(1);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.set_search("geek").await;
        advance(450).await;
        listing
            .update_product(ProductId::new(3), &ProductUpdate::default())
            .await
            .unwrap();
        advance(1).await;

        assert_eq!(backend.listed(), vec!["search-geek-1", "search-geek-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_declined_delete_makes_no_call() {
        let backend = FakeBackend::with_pages(1);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(1).await;
        let deleted = listing
            .delete_product(ProductId::new(7), &AutoConfirm(false))
            .await
            .unwrap();

        assert!(!deleted);
        assert_eq!(backend.state.mutations.load(Ordering::SeqCst), 0);
        assert!(listing.cache().contains(&ProductQuery::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_bypasses_cache() {
        let backend = FakeBackend::with_pages(1);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(1).await;
        listing.refresh().await;
        let state = listing.settled().await;

        assert!(!state.loading);
        assert_eq!(backend.listed(), vec!["page-1", "page-1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timers() {
        let backend = FakeBackend::with_pages(3);
        let notifier = Arc::new(RecordingNotifier::default());
        let listing = listing(&backend, &notifier);

        listing.mount().await;
        advance(1).await;
        drop(listing);
        advance(1000).await;

        assert_eq!(backend.listed(), vec!["page-1"]);
    }
}
