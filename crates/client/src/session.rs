//! Who is signed in.
//!
//! The session is probed once at startup via `/auth/me`. Login and logout
//! change it explicitly; nothing else writes to it.

use std::sync::Arc;

use tokio::sync::{OnceCell, watch};
use tracing::{info, instrument};
use wholesale_core::{Credentials, NewAccount, User};

use crate::api::AuthApi;
use crate::error::{Result, clear_sentry_user, set_sentry_user};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
    /// Set once the startup probe has finished, whatever its result.
    pub initialized: bool,
    /// Message from the last failed login or registration.
    pub error: Option<String>,
}

/// Shared session context. Clones observe the same state.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: AuthApi,
    state: watch::Sender<SessionState>,
    probe: OnceCell<()>,
}

impl SessionContext {
    #[must_use]
    pub fn new(api: AuthApi) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(SessionInner {
                api,
                state,
                probe: OnceCell::new(),
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner
            .state
            .borrow()
            .user
            .as_ref()
            .is_some_and(User::is_admin)
    }

    /// Whether the signed-in account may check out or submit quotes.
    #[must_use]
    pub fn can_place_orders(&self) -> bool {
        self.inner
            .state
            .borrow()
            .user
            .as_ref()
            .is_some_and(User::can_place_orders)
    }

    /// Probe `/auth/me`. Only the first call reaches the server; later calls
    /// return the current user.
    pub async fn init(&self) -> Option<User> {
        self.inner
            .probe
            .get_or_init(|| async {
                self.inner.state.send_modify(|s| s.loading = true);
                let user = match self.inner.api.me().await {
                    Ok(user) => user,
                    Err(err) => {
                        err.report();
                        None
                    }
                };
                if let Some(user) = &user {
                    set_sentry_user(&user.id, Some(&user.email));
                    info!(user_id = %user.id, role = %user.role, "Session restored");
                }
                self.inner.state.send_modify(|s| {
                    s.user = user;
                    s.loading = false;
                    s.initialized = true;
                });
            })
            .await;
        self.current_user()
    }

    /// Sign in. The user is stored only when the server accepts.
    ///
    /// # Errors
    ///
    /// Returns the validation or server error; its message is also kept in
    /// [`SessionState::error`].
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        self.inner.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        match self.inner.api.login(credentials).await {
            Ok(user) => {
                set_sentry_user(&user.id, Some(&user.email));
                info!(user_id = %user.id, "Signed in");
                self.inner.state.send_modify(|s| {
                    s.user = Some(user.clone());
                    s.loading = false;
                    s.initialized = true;
                });
                Ok(user)
            }
            Err(err) => {
                err.report();
                let message = err.user_message();
                self.inner.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(message);
                });
                Err(err)
            }
        }
    }

    /// Create an account. The new account still has to sign in, usually
    /// after an admin approves it.
    ///
    /// # Errors
    ///
    /// Returns the validation or server error; its message is also kept in
    /// [`SessionState::error`].
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, account: &NewAccount) -> Result<User> {
        self.inner.state.send_modify(|s| s.error = None);
        match self.inner.api.register(account).await {
            Ok(user) => {
                info!(user_id = %user.id, "Account registered");
                Ok(user)
            }
            Err(err) => {
                err.report();
                let message = err.user_message();
                self.inner.state.send_modify(|s| s.error = Some(message));
                Err(err)
            }
        }
    }

    /// Sign out. A 401 means the session was already gone and still clears
    /// local state.
    ///
    /// # Errors
    ///
    /// Returns the server error for anything but a 401; the user stays
    /// signed in locally.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        match self.inner.api.logout().await {
            Ok(()) => {}
            Err(err) if err.is_unauthorized() => {}
            Err(err) => {
                err.report();
                return Err(err);
            }
        }
        clear_sentry_user();
        self.inner.state.send_modify(|s| {
            s.user = None;
            s.error = None;
        });
        info!("Signed out");
        Ok(())
    }
}
