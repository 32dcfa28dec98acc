//! Registration, login and session tests.

use axum::http::StatusCode;
use bookstore_core::Role;
use bookstore_integration_tests::{PASSWORD, TestApp};
use bookstore_server::store::UserStore;
use serde_json::json;

fn registration(email: &str, password: &str, repeat: &str) -> serde_json::Value {
    json!({
        "email": email,
        "password": password,
        "repeatPassword": repeat,
        "firstName": "Ada",
        "lastName": "Reader",
    })
}

#[tokio::test]
async fn test_register_returns_user_with_user_role() {
    let app = TestApp::new();
    let response = app
        .post(
            "/auth/register",
            registration("Ada@Example.com", PASSWORD, PASSWORD),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["email"], "ada@example.com");
    assert_eq!(response.body["firstName"], "Ada");
    assert_eq!(response.body["roles"], json!(["USER"]));
    assert!(response.body.get("password").is_none());
    assert!(response.body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::new();
    app.register("reader@example.com").await;

    let response = app
        .post(
            "/auth/register",
            registration("reader@example.com", PASSWORD, PASSWORD),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.message(), "Can't register user");
}

#[tokio::test]
async fn test_register_password_mismatch() {
    let app = TestApp::new();
    let response = app
        .post(
            "/auth/register",
            registration("reader@example.com", PASSWORD, "something-else"),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Passwords do not match");
}

#[tokio::test]
async fn test_register_rejects_invalid_fields() {
    let app = TestApp::new();

    let response = app
        .post(
            "/auth/register",
            registration("not-an-email", PASSWORD, PASSWORD),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("email"));

    let response = app
        .post(
            "/auth/register",
            registration("reader@example.com", "short", "short"),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.message().contains("password"));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new();
    app.register("reader@example.com").await;

    let response = app
        .post(
            "/auth/login",
            json!({ "email": "reader@example.com", "password": "wrong-password" }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), "Invalid credentials");
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = TestApp::new();
    let response = app
        .post(
            "/auth/login",
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_grants_access_until_logout() {
    let app = TestApp::new();
    let cookie = app.customer("reader@example.com").await;

    let response = app.get("/cart", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request(axum::http::Method::POST, "/auth/logout", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let response = app.get("/cart", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_without_session() {
    let app = TestApp::new();
    let response = app.get("/orders", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], 401);
    assert_eq!(response.message(), "Authentication required");
}

#[tokio::test]
async fn test_revoked_admin_loses_access_on_live_session() {
    let app = TestApp::new();
    let id = app.register("admin@example.com").await;
    app.store.grant_role(id, Role::Admin).await.unwrap();
    let cookie = app.login("admin@example.com").await;

    let response = app
        .post("/categories", json!({ "name": "Poetry" }), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    assert!(app.store.revoke_role(id, Role::Admin).await.unwrap());

    let response = app
        .post("/categories", json!({ "name": "Drama" }), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.message(), "Access denied");

    // Plain customer routes keep working.
    let response = app.get("/cart", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_granted_admin_gains_access_without_relogin() {
    let app = TestApp::new();
    let id = app.register("reader@example.com").await;
    let cookie = app.login("reader@example.com").await;

    let response = app
        .post("/categories", json!({ "name": "Poetry" }), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    app.store.grant_role(id, Role::Admin).await.unwrap();

    let response = app
        .post("/categories", json!({ "name": "Poetry" }), Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}
