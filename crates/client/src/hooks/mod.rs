//! Per-screen data hooks.
//!
//! A hook owns `{data, loading, error}` for one screen and refetches when its
//! dependency changes. State is published through a `watch` channel so the
//! host re-renders on every change.
//!
//! Every load runs under a `CancellationToken`. Starting a newer load,
//! changing the dependency, or unmounting cancels the token, and a cancelled
//! load never writes state.

pub mod addresses;
pub mod admin;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;

pub use addresses::AddressBook;
pub use admin::{AdminSettings, AdminUsers};
pub use checkout::Checkout;

/// What a screen renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    /// User-facing message from the last failed load.
    pub error: Option<String>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// How a load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// New data was committed.
    Loaded,
    /// The error was committed; previous data is untouched.
    Failed,
    /// A newer load or an unmount superseded this one.
    Cancelled,
    /// Nothing to do (dependency unchanged or never mounted).
    Skipped,
}

/// Request-lifecycle wrapper around one piece of fetched state.
pub struct Resource<T> {
    state: watch::Sender<ResourceState<T>>,
    scope: Mutex<CancellationToken>,
}

impl<T> Default for Resource<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Resource<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            state,
            scope: Mutex::new(CancellationToken::new()),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    /// Receiver that wakes on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    /// Cancel the previous load and hand out a token for the next one.
    fn begin(&self) -> CancellationToken {
        let mut scope = self.scope.lock().unwrap_or_else(PoisonError::into_inner);
        scope.cancel();
        *scope = CancellationToken::new();
        scope.clone()
    }

    /// Run `fetch` and commit its result unless cancelled first.
    pub async fn load<F>(&self, fetch: F) -> Outcome
    where
        F: Future<Output = Result<T>>,
    {
        let token = self.begin();
        self.state.send_modify(|s| s.loading = true);

        let result = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!("Discarding result of cancelled load");
                return Outcome::Cancelled;
            }
            result = fetch => result,
        };

        match result {
            Ok(data) => {
                self.state.send_modify(|s| {
                    s.data = Some(data);
                    s.error = None;
                    s.loading = false;
                });
                Outcome::Loaded
            }
            Err(err) => {
                err.report();
                let message = err.user_message();
                self.state.send_modify(|s| {
                    s.error = Some(message);
                    s.loading = false;
                });
                Outcome::Failed
            }
        }
    }

    /// Replace the data without a request, e.g. after a mutation returned it.
    pub fn set(&self, data: T) {
        self.state.send_modify(|s| {
            s.data = Some(data);
            s.error = None;
        });
    }

    /// Cancel any in-flight load. Called on unmount and on drop.
    pub fn cancel(&self) {
        self.scope
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        self.state.send_modify(|s| s.loading = false);
    }
}

impl<T> Drop for Resource<T> {
    fn drop(&mut self) {
        self.scope
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

type Fetcher<D, T> = Box<dyn Fn(D) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// A [`Resource`] bound to a dependency value and a fetch function.
pub struct Query<D, T> {
    resource: Resource<T>,
    deps: Mutex<Option<D>>,
    fetch: Fetcher<D, T>,
}

impl<D, T> Query<D, T>
where
    D: Clone + PartialEq + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(D) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            resource: Resource::new(),
            deps: Mutex::new(None),
            fetch: Box::new(move |deps| fetch(deps).boxed()),
        }
    }

    /// First load with `deps`.
    pub async fn mount(&self, deps: D) -> Outcome {
        self.set_deps(deps).await
    }

    /// Refetch if `deps` differs from the current dependency.
    pub async fn set_deps(&self, deps: D) -> Outcome {
        {
            let mut current = self.deps.lock().unwrap_or_else(PoisonError::into_inner);
            if current.as_ref() == Some(&deps) {
                return Outcome::Skipped;
            }
            *current = Some(deps.clone());
        }
        self.resource.load((self.fetch)(deps)).await
    }

    /// Reload with the current dependency.
    pub async fn refetch(&self) -> Outcome {
        let deps = self
            .deps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match deps {
            Some(deps) => self.resource.load((self.fetch)(deps)).await,
            None => Outcome::Skipped,
        }
    }

    /// Current dependency, if mounted.
    #[must_use]
    pub fn deps(&self) -> Option<D> {
        self.deps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<T> {
        self.resource.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.resource.subscribe()
    }

    /// Replace the data without a request.
    pub fn set(&self, data: T) {
        self.resource.set(data);
    }

    /// Cancel any in-flight load and forget the dependency.
    pub fn unmount(&self) {
        self.resource.cancel();
        *self.deps.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Shorthand used by error-path tests across the hooks.
#[cfg(test)]
pub(crate) fn server_error() -> crate::error::ApiError {
    crate::error::ApiError::Status {
        status: 500,
        message: "Internal server error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_load_commits_data() {
        let resource = Resource::<Vec<u32>>::new();

        let outcome = resource.load(async { Ok(vec![1, 2, 3]) }).await;

        assert_eq!(outcome, Outcome::Loaded);
        let state = resource.state();
        assert_eq!(state.data, Some(vec![1, 2, 3]));
        assert!(!state.loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_data() {
        let resource = Resource::<u32>::new();
        resource.load(async { Ok(7) }).await;

        let outcome = resource.load(async { Err(server_error()) }).await;

        assert_eq!(outcome, Outcome::Failed);
        let state = resource.state();
        assert_eq!(state.data, Some(7));
        assert_eq!(state.error.as_deref(), Some("Internal server error"));
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_load_cancels_older() {
        let resource = Arc::new(Resource::<&'static str>::new());

        let slow = {
            let resource = Arc::clone(&resource);
            tokio::spawn(async move {
                resource
                    .load(async {
                        tokio::time::sleep(Duration::from_secs(1)).await;
                        Ok("stale")
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        assert_eq!(resource.load(async { Ok("fresh") }).await, Outcome::Loaded);
        assert_eq!(slow.await.ok(), Some(Outcome::Cancelled));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(resource.state().data, Some("fresh"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_in_flight_load() {
        let resource = Arc::new(Resource::<u32>::new());

        let slow = {
            let resource = Arc::clone(&resource);
            tokio::spawn(async move {
                resource
                    .load(async {
                        tokio::time::sleep(Duration::from_millis(250)).await;
                        Ok(1)
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert!(resource.state().loading);

        resource.cancel();

        assert_eq!(slow.await.ok(), Some(Outcome::Cancelled));
        let state = resource.state();
        assert_eq!(state.data, None);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_query_refetches_only_on_dependency_change() {
        let calls = Arc::new(AtomicUsize::new(0));
        let query = {
            let calls = Arc::clone(&calls);
            Query::new(move |brand: String| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(format!("products for {brand}")) }
            })
        };

        assert_eq!(query.mount("Juul".to_string()).await, Outcome::Loaded);
        assert_eq!(query.set_deps("Juul".to_string()).await, Outcome::Skipped);
        assert_eq!(query.set_deps("Vuse".to_string()).await, Outcome::Loaded);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(query.state().data.as_deref(), Some("products for Vuse"));
    }

    #[tokio::test]
    async fn test_refetch_requires_mount() {
        let query = Query::new(|(): ()| async { Ok(1_u32) });
        assert_eq!(query.refetch().await, Outcome::Skipped);

        query.mount(()).await;
        assert_eq!(query.refetch().await, Outcome::Loaded);

        query.unmount();
        assert_eq!(query.deps(), None);
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let resource = Resource::<u32>::new();
        let mut rx = resource.subscribe();

        resource.load(async { Ok(5) }).await;

        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(rx.borrow_and_update().data, Some(5));
    }
}
