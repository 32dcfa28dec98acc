//! Integration test harness for the bookstore API.
//!
//! [`TestApp`] builds the full router over the in-memory store and an
//! in-memory session store, then drives it with `tower::ServiceExt::oneshot`.
//! No database or network is needed:
//!
//! ```bash
//! cargo test -p bookstore-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use bookstore_core::{Role, UserId};
use bookstore_server::middleware::configure_session_layer;
use bookstore_server::state::AppState;
use bookstore_server::store::UserStore;
use bookstore_server::store::memory::MemoryStore;

/// Password used by every test account.
pub const PASSWORD: &str = "correct-horse";

/// A response with its body parsed as JSON.
///
/// Non-JSON bodies are kept as a JSON string; empty bodies become `null`.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `name=value` part of the session cookie, if one was set.
    #[must_use]
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("bookstore_session="))
            .and_then(|value| value.split(';').next())
            .map(str::to_owned)
    }

    /// The `message` field of an error body.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// The application under test.
pub struct TestApp {
    router: Router,
    pub store: MemoryStore,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let session_layer =
            configure_session_layer(tower_sessions::MemoryStore::default(), false);
        let state = AppState::new(store.clone());
        let router = bookstore_server::app(state, session_layer);
        Self { router, store }
    }

    /// Send a request, optionally with a JSON body and a session cookie.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, None, cookie).await
    }

    pub async fn post(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::POST, uri, Some(body), cookie).await
    }

    pub async fn put(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::PUT, uri, Some(body), cookie).await
    }

    pub async fn patch(&self, uri: &str, body: Value, cookie: Option<&str>) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body), cookie).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, None, cookie).await
    }

    /// Register an account and return its id.
    pub async fn register(&self, email: &str) -> UserId {
        let response = self
            .post(
                "/auth/register",
                json!({
                    "email": email,
                    "password": PASSWORD,
                    "repeatPassword": PASSWORD,
                    "firstName": "Test",
                    "lastName": "Reader",
                    "shippingAddress": "1 Main St",
                }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        UserId::new(response.body["id"].as_i64().unwrap())
    }

    /// Log in and return the session cookie.
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .post(
                "/auth/login",
                json!({ "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.session_cookie().unwrap()
    }

    /// Register and log in a plain customer.
    pub async fn customer(&self, email: &str) -> String {
        self.register(email).await;
        self.login(email).await
    }

    /// Register a user, grant `ADMIN`, and log in.
    pub async fn admin(&self, email: &str) -> String {
        let id = self.register(email).await;
        self.store.grant_role(id, Role::Admin).await.unwrap();
        self.login(email).await
    }

    /// Create a category as `admin` and return its id.
    pub async fn create_category(&self, admin: &str, name: &str) -> i64 {
        let response = self
            .post("/categories", json!({ "name": name }), Some(admin))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    /// Create a book as `admin` and return its id.
    pub async fn create_book(
        &self,
        admin: &str,
        title: &str,
        isbn: &str,
        price: f64,
        category_id: i64,
    ) -> i64 {
        let response = self
            .post(
                "/books",
                json!({
                    "title": title,
                    "author": "Test Author",
                    "isbn": isbn,
                    "price": price,
                    "categoriesIds": [category_id],
                }),
                Some(admin),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }
}
