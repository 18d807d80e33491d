//! In-memory cache of admin product pages.
//!
//! Entries never expire on their own. Any product mutation clears the whole
//! cache, since a created or deleted product shifts every page after it.
//! Each clear also bumps a generation so a response requested before the
//! clear is never stored after it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::future::Cache;
use tracing::debug;
use wholesale_core::ProductPage;

use crate::api::ProductListParams;

/// What the admin listing is showing: an optional search term and a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    search: Option<String>,
    page: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
        }
    }
}

impl ProductQuery {
    /// A blank search is the same as no search. Pages start at 1.
    #[must_use]
    pub fn new(search: Option<&str>, page: u32) -> Self {
        Self {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            page: page.max(1),
        }
    }

    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Same search, different page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            search: self.search.clone(),
            page: page.max(1),
        }
    }

    /// `search-{term}-{page}` or `page-{page}`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match &self.search {
            Some(term) => format!("search-{term}-{}", self.page),
            None => format!("page-{}", self.page),
        }
    }

    #[must_use]
    pub fn to_params(&self) -> ProductListParams {
        ProductListParams {
            search: self.search.clone(),
            page: self.page,
        }
    }
}

/// Shared page cache. Clones share entries.
#[derive(Clone)]
pub struct ProductPageCache {
    pages: Cache<String, ProductPage>,
    generation: Arc<AtomicU64>,
}

impl Default for ProductPageCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductPageCache {
    /// An unbounded cache with no expiry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: Cache::builder().build(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, query: &ProductQuery) -> Option<ProductPage> {
        let key = query.cache_key();
        let page = self.pages.get(&key).await;
        debug!(key = %key, hit = page.is_some(), "Admin product cache lookup");
        page
    }

    pub async fn insert(&self, query: &ProductQuery, page: ProductPage) {
        self.pages.insert(query.cache_key(), page).await;
    }

    /// Bumped by every [`invalidate_all`](Self::invalidate_all).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Store a page fetched while `generation` was current. Returns `false`
    /// and stores nothing if the cache was cleared since.
    pub async fn fill(&self, query: &ProductQuery, page: ProductPage, generation: u64) -> bool {
        let key = query.cache_key();
        if self.generation() != generation {
            debug!(key = %key, "Dropping admin product page from before invalidation");
            return false;
        }
        self.pages.insert(key.clone(), page).await;
        // A clear that raced the insert above must still win.
        if self.generation() != generation {
            self.pages.invalidate(&key).await;
            debug!(key = %key, "Dropping admin product page from before invalidation");
            return false;
        }
        true
    }

    #[must_use]
    pub fn contains(&self, query: &ProductQuery) -> bool {
        self.pages.contains_key(&query.cache_key())
    }

    /// Drop every page.
    pub fn invalidate_all(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "Invalidating admin product cache");
        self.pages.invalidate_all();
    }
}
