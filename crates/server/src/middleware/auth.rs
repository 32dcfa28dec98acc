//! Authentication extractors.
//!
//! The session holds a [`CurrentUser`] after login. Handlers declare the
//! access they need through their arguments:
//!
//! ```rust,ignore
//! async fn view_cart(RequireAuth(user): RequireAuth) -> Result<Json<ShoppingCart>> { ... }
//! async fn create_book(RequireAdmin(admin): RequireAdmin, ...) -> Result<...> { ... }
//! ```
//!
//! [`RequireAdmin`] reloads the principal from the store on every request, so
//! granting or revoking `ADMIN` applies to sessions that are already open.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use bookstore_core::Role;

use crate::error::AppError;
use crate::models::{CurrentUser, User, session_keys};
use crate::state::AppState;
use crate::store::{Store, UserStore};

const AUTHENTICATION_REQUIRED: &str = "Authentication required";
const ACCESS_DENIED: &str = "Access denied";

/// Extractor that requires a logged-in user.
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in user currently holding the `ADMIN` role.
pub struct RequireAdmin(pub User);

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

fn unauthorized() -> AppError {
    AppError::Unauthorized(AUTHENTICATION_REQUIRED.to_owned())
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts).await.map(Self).ok_or_else(unauthorized)
    }
}

impl<S: Store> FromRequestParts<AppState<S>> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let principal = current_user(parts).await.ok_or_else(unauthorized)?;

        let Some(user) = state.store().find_user_by_id(principal.id).await? else {
            tracing::warn!(user_id = %principal.id, "session user no longer exists");
            return Err(unauthorized());
        };

        if !user.has_role(Role::Admin) {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "admin route denied");
            return Err(AppError::Forbidden(ACCESS_DENIED.to_owned()));
        }

        Ok(Self(user))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
