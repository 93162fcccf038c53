//! Tests for behavior when the session store is unavailable.
//!
//! The gate fails closed: no store, no admin access.

use std::sync::Arc;

use axum::http::StatusCode;
use integration_tests::fixtures::FIREFOX_UA;
use integration_tests::mocks::FailingSessionStore;
use integration_tests::setup::{Browser, TestContext};
use telemetry::metrics;

fn failing_context() -> (TestContext, FailingSessionStore) {
    let store = FailingSessionStore::new();
    let ctx = TestContext::with_store(Arc::new(store.clone()));
    (ctx, store)
}

#[tokio::test]
async fn test_login_with_store_down_returns_generic_500() {
    let (ctx, store) = failing_context();
    let server = ctx.server();
    store.set_should_fail(true);
    let errors_before = metrics().login_errors.get();

    let mut browser = Browser::new(FIREFOX_UA);
    let response = browser.login(&server).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "An error occurred during login. Please try again."
    );
    assert!(browser.cookie("staffdir_session").is_none());
    assert!(metrics().login_errors.get() > errors_before);
}

#[tokio::test]
async fn test_guard_fails_closed_when_store_goes_down() {
    let (ctx, store) = failing_context();
    let server = ctx.server();
    let mut browser = Browser::new(FIREFOX_UA);
    browser.login(&server).await.assert_status_ok();
    browser
        .get(&server, "/admin/index.php")
        .await
        .assert_status_ok();

    store.set_should_fail(true);

    let response = browser.get(&server, "/admin/index.php").await;
    response.assert_status(StatusCode::SEE_OTHER);

    let response = browser
        .get(&server, "/admin/index.php")
        .add_header("x-requested-with", "XMLHttpRequest")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = browser.get(&server, "/admin/session").await.json();
    assert_eq!(body["logged_in"], false);
}

#[tokio::test]
async fn test_logout_still_redirects_when_store_down() {
    let (ctx, store) = failing_context();
    let server = ctx.server();
    let mut browser = Browser::new(FIREFOX_UA);
    browser.login(&server).await.assert_status_ok();

    store.set_should_fail(true);

    let response = browser.get(&server, "/admin/logout").await;
    response.assert_status(StatusCode::SEE_OTHER);
    browser.absorb(&response);
    assert!(browser.cookie("staffdir_session").is_none());
    assert!(browser.cookie("staffdir_auth_check").is_none());
}

#[tokio::test]
async fn test_ready_reports_unavailable_store() {
    let (ctx, store) = failing_context();
    let server = ctx.server();
    store.set_should_fail(true);

    server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = server.get("/health").await.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["session_store_healthy"], false);
}
