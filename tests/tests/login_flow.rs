//! End-to-end tests for login, session check and logout.

use axum::http::StatusCode;
use integration_tests::fixtures::{self, ADMIN_PASSWORD, ADMIN_USERNAME, FIREFOX_UA};
use integration_tests::setup::{set_cookies, Browser, TestContext};
use telemetry::metrics;

const SESSION_COOKIE: &str = "staffdir_session";
const AUTH_CHECK_COOKIE: &str = "staffdir_auth_check";

#[tokio::test]
async fn test_login_success_sets_cookies_and_session() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let mut browser = Browser::new(FIREFOX_UA);

    let response = browser.login(&server).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["returnUrl"], "/admin/index.php");

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2, "Expected session and auth-check cookies");
    for cookie in &cookies {
        assert!(cookie.contains("HttpOnly"), "Cookie should be HttpOnly: {}", cookie);
        assert!(cookie.contains("Max-Age=3600"), "Cookie should live 3600s: {}", cookie);
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"), "Plain HTTP should not get Secure");
    }
    assert_eq!(browser.cookie(SESSION_COOKIE).map(str::len), Some(64));
    assert_eq!(browser.cookie(AUTH_CHECK_COOKIE).map(str::len), Some(64));

    let check = browser.get(&server, "/admin/session").await;
    check.assert_status_ok();
    let body: serde_json::Value = check.json();
    assert_eq!(body["logged_in"], true);
    assert_eq!(body["timestamp"], ctx.clock_now_secs());
}

#[tokio::test]
async fn test_login_honours_local_return_url() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    let response = browser
        .post(&server, "/admin/login")
        .json(&fixtures::login_body_with_return(
            ADMIN_USERNAME,
            ADMIN_PASSWORD,
            "/admin/staff.php?id=7",
        ))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["returnUrl"], "/admin/staff.php?id=7");
}

#[tokio::test]
async fn test_login_rejects_external_return_url() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    for target in ["//evil.example/phish", "https://evil.example/", "/\\evil.example"] {
        let response = browser
            .post(&server, "/admin/login")
            .json(&fixtures::login_body_with_return(
                ADMIN_USERNAME,
                ADMIN_PASSWORD,
                target,
            ))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(
            body["returnUrl"], "/admin/index.php",
            "Return URL {} should fall back to the default",
            target
        );
    }
}

#[tokio::test]
async fn test_wrong_password_returns_401_without_cookies() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);
    let failures_before = metrics().login_failures.get();

    let response = browser
        .post(&server, "/admin/login")
        .json(&fixtures::login_body(ADMIN_USERNAME, "not the password"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid username or password");
    assert!(set_cookies(&response).is_empty(), "Failed login must not set cookies");
    assert!(metrics().login_failures.get() > failures_before);
}

#[tokio::test]
async fn test_wrong_username_gets_same_message() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    let response = browser
        .post(&server, "/admin/login")
        .json(&fixtures::login_body("root", ADMIN_PASSWORD))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_whitespace_padded_username_is_rejected() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    let response = browser
        .post(&server, "/admin/login")
        .json(&fixtures::login_body("  admin\t", ADMIN_PASSWORD))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Invalid username or password");
    assert!(set_cookies(&response).is_empty());
}

#[tokio::test]
async fn test_password_over_byte_limit_returns_400() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    // 600 characters, 1800 bytes.
    let password = "\u{20ac}".repeat(600);
    let response = browser
        .post(&server, "/admin/login")
        .json(&fixtures::login_body(ADMIN_USERNAME, &password))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid request");
}

#[tokio::test]
async fn test_missing_credentials_returns_400() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    let response = browser
        .post(&server, "/admin/login")
        .json(&serde_json::json!({ "username": ADMIN_USERNAME }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Username and password are required");
}

#[tokio::test]
async fn test_malformed_body_returns_400() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    let response = browser
        .post(&server, "/admin/login")
        .text("username=admin&password=secret")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_session_check_when_anonymous() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    let response = browser.get(&server, "/admin/session").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["logged_in"], false);
    assert_eq!(body["timestamp"], ctx.clock_now_secs());
    assert_eq!(
        response.headers().get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-store, no-cache, must-revalidate, max-age=0")
    );
}

#[tokio::test]
async fn test_login_replaces_existing_session_id() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let mut browser = Browser::new(FIREFOX_UA);

    // Being bounced from an admin page hands out an anonymous session.
    let bounced = browser.get(&server, "/admin/index.php").await;
    browser.absorb(&bounced);
    let before = browser
        .cookie(SESSION_COOKIE)
        .expect("Bounce should set a session cookie")
        .to_string();

    browser.login(&server).await.assert_status_ok();
    let after = browser.cookie(SESSION_COOKIE).expect("Login sets a session cookie");
    assert_ne!(before, after, "Login must issue a new session id");

    // The pre-login id no longer means anything.
    let mut stale = browser.clone();
    stale.set_cookie(SESSION_COOKIE, &before);
    let body: serde_json::Value = stale.get(&server, "/admin/session").await.json();
    assert_eq!(body["logged_in"], false);
}

#[tokio::test]
async fn test_logout_redirects_and_invalidates_session() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let mut browser = Browser::new(FIREFOX_UA);
    browser.login(&server).await.assert_status_ok();
    let replay = browser.clone();

    let response = browser.get(&server, "/admin/logout").await;
    response.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/?logged_out=1")
    );

    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("staffdir_session=;") && c.contains("Max-Age=0")));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("staffdir_auth_check=;") && c.contains("Max-Age=0")));

    browser.absorb(&response);
    assert!(browser.cookie(SESSION_COOKIE).is_none());

    // Replaying the old cookies finds nothing server-side.
    let body: serde_json::Value = replay.get(&server, "/admin/session").await.json();
    assert_eq!(body["logged_in"], false);
    replay
        .get(&server, "/admin/index.php")
        .await
        .assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let mut browser = Browser::new(FIREFOX_UA);
    browser.login(&server).await.assert_status_ok();

    let first = browser.get(&server, "/admin/logout").await;
    first.assert_status(StatusCode::SEE_OTHER);
    let second = browser.get(&server, "/admin/logout").await;
    second.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(set_cookies(&first), set_cookies(&second));

    // Without any session at all.
    Browser::new(FIREFOX_UA)
        .post(&server, "/admin/logout")
        .await
        .assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_login_over_forwarded_https_sets_secure_cookies() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let browser = Browser::new(FIREFOX_UA);

    let response = browser
        .post(&server, "/admin/login")
        .add_header("x-forwarded-proto", "https")
        .json(&fixtures::admin_login())
        .await;
    response.assert_status_ok();

    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("; Secure")));
}

#[tokio::test]
async fn test_login_counts_attempts() {
    let ctx = TestContext::new();
    let server = ctx.server();
    let mut browser = Browser::new(FIREFOX_UA);
    let attempts_before = metrics().login_attempts.get();
    let successes_before = metrics().login_successes.get();

    browser.login(&server).await.assert_status_ok();

    assert!(metrics().login_attempts.get() > attempts_before);
    assert!(metrics().login_successes.get() > successes_before);
    assert!(metrics().login_latency_ms.count() >= 1);
}
