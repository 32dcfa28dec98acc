//! Session middleware configuration.
//!
//! Sessions live in `PostgreSQL` in production; tests plug in any other
//! `SessionStore` through [`configure_session_layer`].

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::BookstoreConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "bookstore_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with `PostgreSQL` store.
///
/// The session table is created by `bookstore-cli migrate`.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &BookstoreConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());
    configure_session_layer(store, config.secure_cookies())
}

/// Wrap a session store with the cookie settings used by the API.
#[must_use]
pub fn configure_session_layer<SS: SessionStore>(store: SS, secure: bool) -> SessionManagerLayer<SS> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
