//! Admin account approval and store settings screens.

use wholesale_client::hooks::Outcome;
use wholesale_client::ui::AutoConfirm;
use wholesale_core::{FeatureUpdate, NewAccount, ProductId, Role, UserId, UserUpdate};
use wholesale_integration_tests::{ADMIN_EMAIL, ADMIN_PASSWORD, TestServer};

#[tokio::test]
async fn test_new_registration_waits_for_approval() {
    let server = TestServer::start().await;

    let applicant = server.client();
    let registered = applicant
        .storefront
        .session()
        .register(&NewAccount {
            email: "vapes@example.com".to_string(),
            password: "cloud9".to_string(),
            name: "Cloud Nine Vapes".to_string(),
            ..NewAccount::default()
        })
        .await
        .expect("register failed");

    let admin = server.client();
    admin.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let users = admin.storefront.admin_users();
    assert_eq!(users.mount().await, Outcome::Loaded);

    let pending: Vec<UserId> = users.pending_approval().iter().map(|u| u.user.id).collect();
    assert_eq!(pending, vec![registered.id]);

    let update = UserUpdate {
        approved: Some(true),
        role: Some(Role::User),
    };
    let approved = users.update(registered.id, &update).await.expect("approve failed");

    assert!(approved.approved);
    assert!(users.pending_approval().is_empty());
    assert!(
        admin
            .notifier
            .notifications()
            .iter()
            .any(|n| n.message == "User updated")
    );
}

#[tokio::test]
async fn test_confirmed_delete_reloads_the_list() {
    let server = TestServer::start().await;
    let admin = server.client();
    admin.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let users = admin.storefront.admin_users();
    users.mount().await;
    let before = users.state().data.map_or(0, |u| u.len());

    assert!(
        !users
            .delete(UserId::new(3), &AutoConfirm(false))
            .await
            .expect("declined delete errored")
    );
    assert_eq!(server.backend().count("DELETE /admin/users/3"), 0);

    assert!(
        users
            .delete(UserId::new(3), &AutoConfirm(true))
            .await
            .expect("delete failed")
    );
    assert_eq!(users.state().data.map_or(0, |u| u.len()), before - 1);
}

#[tokio::test]
async fn test_feature_update_is_reflected_in_settings() {
    let server = TestServer::start().await;
    let admin = server.client();
    admin.sign_in(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let settings = admin.storefront.admin_settings();
    assert_eq!(settings.mount().await, Outcome::Loaded);

    let slot = settings
        .update_feature(&FeatureUpdate {
            key: "hero".to_string(),
            product_id: Some(ProductId::new(5)),
            image_url: None,
            title: Some("Summer restock".to_string()),
        })
        .await
        .expect("feature update failed");

    assert_eq!(slot.product_id, Some(ProductId::new(5)));
    let loaded = settings.state().data.expect("settings not loaded");
    assert_eq!(
        loaded.feature("hero").and_then(|s| s.title.as_deref()),
        Some("Summer restock")
    );
}
