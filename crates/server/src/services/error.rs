//! Service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors raised by the catalog, cart and order services.
///
/// The message of the domain variants is returned to the client verbatim.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced entity does not exist.
    #[error("{0}")]
    EntityNotFound(String),

    /// The request is well-formed but conflicts with the current data.
    #[error("{0}")]
    DataProcessing(String),

    /// A value is out of the accepted range.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
