//! Authentication route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;
use tower_sessions::Session;
use validator::Validate;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::ValidatedJson;
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::{AuthService, Registration};
use crate::state::AppState;
use crate::store::Store;

// =============================================================================
// Request Types
// =============================================================================

/// Registration body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "must be a well-formed email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 64, message = "must be 8 to 64 characters"))]
    pub password: String,
    pub repeat_password: String,
    #[validate(length(min = 1, message = "must not be blank"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "must not be blank"))]
    pub last_name: String,
    pub shipping_address: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(request: RegisterRequest) -> Self {
        Self {
            email: request.email,
            password: request.password,
            repeat_password: request.repeat_password,
            first_name: request.first_name,
            last_name: request.last_name,
            shipping_address: request.shipping_address,
        }
    }
}

/// Login body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "must not be blank"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be blank"))]
    pub password: String,
}

// =============================================================================
// Routes
// =============================================================================

/// Auth routes.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/auth/register", post(register::<S>))
        .route("/auth/login", post(login::<S>))
        .route("/auth/logout", post(logout))
}

/// Create an account with the `USER` role and an empty cart.
async fn register<S: Store>(
    State(state): State<AppState<S>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.store())
        .register(request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Check credentials and bind the user to the session.
///
/// The session id is rotated on login.
async fn login<S: Store>(
    State(state): State<AppState<S>>,
    session: Session,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.store())
        .login(&request.email, &request.password)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(Json(user))
}

/// End the session.
async fn logout(session: Session) -> StatusCode {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }

    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {}", e);
    }

    clear_sentry_user();
    StatusCode::NO_CONTENT
}
