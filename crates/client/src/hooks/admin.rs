//! Back-office hooks for accounts and store settings.

use std::sync::Arc;

use tracing::instrument;
use wholesale_core::{AdminUser, FeatureSlot, FeatureUpdate, StoreSettings, UserId, UserUpdate};

use super::{Outcome, Query, ResourceState};
use crate::api::AdminApi;
use crate::error::{ApiError, Result};
use crate::ui::{Confirmation, Notification, Notifier};

/// The account list on the admin users screen.
pub struct AdminUsers {
    api: AdminApi,
    list: Query<(), Vec<AdminUser>>,
    notifier: Arc<dyn Notifier>,
}

impl AdminUsers {
    #[must_use]
    pub fn new(api: AdminApi, notifier: Arc<dyn Notifier>) -> Self {
        let list = {
            let api = api.clone();
            Query::new(move |()| {
                let api = api.clone();
                async move { api.users().await }
            })
        };
        Self {
            api,
            list,
            notifier,
        }
    }

    pub async fn mount(&self) -> Outcome {
        self.list.mount(()).await
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<Vec<AdminUser>> {
        self.list.state()
    }

    /// Accounts still waiting for approval.
    #[must_use]
    pub fn pending_approval(&self) -> Vec<AdminUser> {
        self.list
            .state()
            .data
            .unwrap_or_default()
            .into_iter()
            .filter(|u| !u.approved)
            .collect()
    }

    /// Delete an account after confirmation. Returns `false` if declined.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a notification has already
    /// been shown.
    #[instrument(skip(self, confirmation))]
    pub async fn delete(&self, id: UserId, confirmation: &dyn Confirmation) -> Result<bool> {
        if !confirmation.confirm(&format!("Delete user #{id}? This cannot be undone.")) {
            return Ok(false);
        }
        if let Err(err) = self.api.delete_user(id).await {
            self.fail(&err);
            return Err(err);
        }
        self.notifier.notify(Notification::success("User deleted"));
        self.list.refetch().await;
        Ok(true)
    }

    /// Change an account's role or approval, then reload the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a notification has already
    /// been shown.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: UserId, update: &UserUpdate) -> Result<AdminUser> {
        match self.api.update_user(id, update).await {
            Ok(user) => {
                self.notifier.notify(Notification::success("User updated"));
                self.list.refetch().await;
                Ok(user)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    fn fail(&self, err: &ApiError) {
        err.report();
        self.notifier.notify(Notification::error(err.user_message()));
    }

    pub fn unmount(&self) {
        self.list.unmount();
    }
}

/// Store settings with feature slot editing.
pub struct AdminSettings {
    api: AdminApi,
    settings: Query<(), StoreSettings>,
    notifier: Arc<dyn Notifier>,
}

impl AdminSettings {
    #[must_use]
    pub fn new(api: AdminApi, notifier: Arc<dyn Notifier>) -> Self {
        let settings = {
            let api = api.clone();
            Query::new(move |()| {
                let api = api.clone();
                async move { api.settings().await }
            })
        };
        Self {
            api,
            settings,
            notifier,
        }
    }

    pub async fn mount(&self) -> Outcome {
        self.settings.mount(()).await
    }

    #[must_use]
    pub fn state(&self) -> ResourceState<StoreSettings> {
        self.settings.state()
    }

    /// Point a feature slot somewhere new, then reload settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; a notification has already
    /// been shown.
    #[instrument(skip(self, update), fields(key = %update.key))]
    pub async fn update_feature(&self, update: &FeatureUpdate) -> Result<FeatureSlot> {
        match self.api.update_feature(update).await {
            Ok(slot) => {
                self.notifier.notify(Notification::success("Feature updated"));
                self.settings.refetch().await;
                Ok(slot)
            }
            Err(err) => {
                err.report();
                self.notifier.notify(Notification::error(err.user_message()));
                Err(err)
            }
        }
    }

    pub fn unmount(&self) {
        self.settings.unmount();
    }
}
