//! Session lifecycle: startup probe, login, registration and logout.

use wholesale_client::ApiError;
use wholesale_core::{Credentials, NewAccount, ValidationError};
use wholesale_integration_tests::{
    BUYER_EMAIL, BUYER_PASSWORD, SUBACCOUNT_EMAIL, SUBACCOUNT_PASSWORD, TestServer,
};

#[tokio::test]
async fn test_guest_probe_finishes_without_user_or_redirect() {
    let server = TestServer::start().await;
    let client = server.client();
    let session = client.storefront.session();

    assert!(session.init().await.is_none());

    let state = session.state();
    assert!(state.initialized);
    assert!(!state.loading);
    assert!(client.navigator.redirects().is_empty());
}

#[tokio::test]
async fn test_probe_reaches_the_server_once() {
    let server = TestServer::start().await;
    let client = server.client();

    client.storefront.session().init().await;
    client.storefront.session().init().await;

    assert_eq!(server.backend().count("GET /auth/me"), 1);
}

#[tokio::test]
async fn test_login_stores_the_user_and_cookie() {
    let server = TestServer::start().await;
    let client = server.client();

    let user = client.sign_in(BUYER_EMAIL, BUYER_PASSWORD).await;

    assert_eq!(client.storefront.session().current_user(), Some(user.clone()));
    assert_eq!(server.backend().session_count(), 1);

    // The cookie rides along on later requests
    let me = client.storefront.auth().me().await.expect("probe failed");
    assert_eq!(me.map(|u| u.id), Some(user.id));
}

#[tokio::test]
async fn test_rejected_login_leaves_no_session() {
    let server = TestServer::start().await;
    let client = server.client();
    let session = client.storefront.session();

    let err = session
        .login(&Credentials {
            email: BUYER_EMAIL.to_string(),
            password: "wrong".to_string(),
        })
        .await
        .expect_err("wrong password accepted");

    assert!(err.is_unauthorized());
    assert!(session.current_user().is_none());
    assert_eq!(session.state().error.as_deref(), Some("Invalid credentials"));
    assert_eq!(server.backend().session_count(), 0);
}

#[tokio::test]
async fn test_blank_credentials_are_rejected_before_the_request() {
    let server = TestServer::start().await;
    let client = server.client();

    let err = client
        .storefront
        .session()
        .login(&Credentials::default())
        .await
        .expect_err("blank credentials accepted");

    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(server.backend().count("POST /auth/login"), 0);
}

#[tokio::test]
async fn test_registration_does_not_sign_in() {
    let server = TestServer::start().await;
    let client = server.client();
    let session = client.storefront.session();

    let account = NewAccount {
        email: "new@example.com".to_string(),
        password: "s3cret".to_string(),
        name: "New Shop".to_string(),
        ..NewAccount::default()
    };
    let user = session.register(&account).await.expect("register failed");

    assert_eq!(user.email, "new@example.com");
    assert!(session.current_user().is_none());

    // Unapproved accounts cannot sign in yet
    let err = session
        .login(&Credentials {
            email: account.email.clone(),
            password: account.password.clone(),
        })
        .await
        .expect_err("unapproved account signed in");
    assert_eq!(err.status(), Some(403));
    assert_eq!(session.state().error.as_deref(), Some("Account awaiting approval"));
}

#[tokio::test]
async fn test_duplicate_registration_keeps_the_message() {
    let server = TestServer::start().await;
    let client = server.client();
    let session = client.storefront.session();

    let err = session
        .register(&NewAccount {
            email: BUYER_EMAIL.to_string(),
            password: "whatever".to_string(),
            name: "Dup".to_string(),
            ..NewAccount::default()
        })
        .await
        .expect_err("duplicate email accepted");

    assert_eq!(err.status(), Some(409));
    assert_eq!(session.state().error.as_deref(), Some("Email already registered"));
}

#[tokio::test]
async fn test_logout_clears_both_sides() {
    let server = TestServer::start().await;
    let client = server.client();
    client.sign_in(BUYER_EMAIL, BUYER_PASSWORD).await;

    client.storefront.session().logout().await.expect("logout failed");

    assert!(client.storefront.session().current_user().is_none());
    assert_eq!(server.backend().session_count(), 0);
    let me = client.storefront.auth().me().await.expect("probe failed");
    assert!(me.is_none());
}

#[tokio::test]
async fn test_subaccount_without_rights_cannot_check_out() {
    let server = TestServer::start().await;
    let client = server.client();
    let user = client.sign_in(SUBACCOUNT_EMAIL, SUBACCOUNT_PASSWORD).await;
    assert!(!user.can_place_orders());

    let checkout = client.storefront.checkout();
    let err = checkout
        .submit_quote(None)
        .await
        .expect_err("subaccount submitted a quote");

    assert!(matches!(
        err,
        ApiError::Validation(ValidationError::NotPermitted(_))
    ));
    assert_eq!(server.backend().count("POST /orders/submit-quote"), 0);
}
