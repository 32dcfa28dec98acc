//! Shopping cart route handlers.
//!
//! All routes act on the cart of the logged-in user.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;
use validator::Validate;

use bookstore_core::{BookId, CartItemId};

use crate::error::Result;
use crate::extract::{ApiPath, ValidatedJson};
use crate::middleware::RequireAuth;
use crate::models::ShoppingCart;
use crate::services::CartService;
use crate::state::AppState;
use crate::store::Store;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub book_id: BookId,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub quantity: i32,
}

/// Cart routes.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/cart", get(show::<S>).post(add_item::<S>))
        .route(
            "/cart/cart-items/{id}",
            put(update_quantity::<S>).delete(remove_item::<S>),
        )
}

async fn show<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ShoppingCart>> {
    let cart = CartService::new(state.store()).get_cart(user.id).await?;
    Ok(Json(cart))
}

async fn add_item<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    ValidatedJson(request): ValidatedJson<AddCartItemRequest>,
) -> Result<(StatusCode, Json<ShoppingCart>)> {
    let cart = CartService::new(state.store())
        .add_item(user.id, request.book_id, request.quantity)
        .await?;
    Ok((StatusCode::CREATED, Json(cart)))
}

async fn update_quantity<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(_user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
    ValidatedJson(request): ValidatedJson<UpdateQuantityRequest>,
) -> Result<Json<ShoppingCart>> {
    let cart = CartService::new(state.store())
        .update_quantity(id, request.quantity)
        .await?;
    Ok(Json(cart))
}

async fn remove_item<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<CartItemId>,
) -> Result<StatusCode> {
    CartService::new(state.store()).remove_item(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
