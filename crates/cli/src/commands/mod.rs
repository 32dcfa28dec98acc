//! CLI command implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use sqlx::PgPool;
use thiserror::Error;

use bookstore_core::{EmailError, PriceError};
use bookstore_server::config::{BookstoreConfig, ConfigError};
use bookstore_server::db::{self, RepositoryError};
use bookstore_server::services::ServiceError;

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),

    #[error("No user registered with email {0}")]
    UserNotFound(String),
}

/// Load configuration and open a small pool.
async fn connect() -> Result<PgPool, CommandError> {
    let config = BookstoreConfig::from_env()?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&config.database_url, 2).await?)
}
