//! User role management.

use bookstore_core::{Email, Role, UserId};
use bookstore_server::db::PgStore;
use bookstore_server::store::UserStore;

use super::{CommandError, connect};

async fn find_user(store: &PgStore, email: &str) -> Result<UserId, CommandError> {
    let email = Email::parse(email)?;
    store
        .find_user_by_email(&email)
        .await?
        .map(|user| user.id)
        .ok_or_else(|| CommandError::UserNotFound(email.to_string()))
}

/// Grant the `ADMIN` role.
///
/// # Errors
///
/// Returns an error if the email is invalid, unknown, or the database fails.
pub async fn grant_admin(email: &str) -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);
    let user_id = find_user(&store, email).await?;

    store.grant_role(user_id, Role::Admin).await?;
    tracing::info!(user_id = %user_id, email, "ADMIN role granted");
    Ok(())
}

/// Revoke the `ADMIN` role.
///
/// # Errors
///
/// Returns an error if the email is invalid, unknown, or the database fails.
pub async fn revoke_admin(email: &str) -> Result<(), CommandError> {
    let store = PgStore::new(connect().await?);
    let user_id = find_user(&store, email).await?;

    if store.revoke_role(user_id, Role::Admin).await? {
        tracing::info!(user_id = %user_id, email, "ADMIN role revoked");
    } else {
        tracing::warn!(user_id = %user_id, email, "user did not hold the ADMIN role");
    }
    Ok(())
}
