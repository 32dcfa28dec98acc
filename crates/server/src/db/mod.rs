//! Database operations for the bookstore `PostgreSQL`.
//!
//! # Schema: `bookstore`
//!
//! ## Tables
//!
//! - `category`, `book`, `book_category` - Catalog (soft delete via `is_deleted`)
//! - `user`, `user_role` - Customer accounts and granted roles
//! - `shopping_cart`, `cart_item` - One cart per user, one line per (cart, book)
//! - `order`, `order_item` - Placed orders with price snapshots
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! Query functions take `&mut PgConnection` so the same code runs on a pooled
//! connection or inside a transaction.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p bookstore-cli -- migrate
//! ```

pub mod books;
pub mod carts;
pub mod categories;
pub mod orders;
mod store;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use store::{PgStore, PgTransaction};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate ISBN or email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(2.min(max_connections))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
fn unique_violation(e: sqlx::Error, message: impl FnOnce() -> String) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message());
    }
    RepositoryError::Database(e)
}

/// Convert a `COUNT(*)` result.
fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}
