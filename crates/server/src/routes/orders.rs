//! Order route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use serde::Deserialize;
use validator::Validate;

use bookstore_core::{OrderId, OrderItemId, OrderStatus};

use super::PageParams;
use crate::error::Result;
use crate::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, OrderItem, Page};
use crate::services::OrderService;
use crate::state::AppState;
use crate::store::Store;

pub const SORTABLE: &[(&str, &str)] = &[
    ("id", "id"),
    ("orderDate", "order_date"),
    ("total", "total"),
];

/// Checkout body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[validate(length(min = 1, message = "must not be blank"))]
    pub shipping_address: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Order routes.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/orders", get(list::<S>).post(create::<S>))
        .route("/orders/{order_id}", patch(update_status::<S>))
        .route("/orders/{order_id}/items", get(items::<S>))
        .route("/orders/{order_id}/items/{item_id}", get(item::<S>))
}

async fn list<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<Order>>> {
    let page = params.into_page_request(SORTABLE)?;
    let orders = OrderService::new(state.store())
        .list_orders(user.id, &page)
        .await?;
    Ok(Json(orders))
}

async fn create<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    ValidatedJson(request): ValidatedJson<OrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderService::new(state.store())
        .create_order(user.id, &request.shipping_address)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn update_status<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(order_id): ApiPath<OrderId>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    tracing::debug!(admin_id = %admin.id, order_id = %order_id, "status change requested");
    let order = OrderService::new(state.store())
        .update_status(order_id, request.status)
        .await?;
    Ok(Json(order))
}

async fn items<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<Vec<OrderItem>>> {
    let items = OrderService::new(state.store())
        .order_items(user.id, order_id)
        .await?;
    Ok(Json(items))
}

async fn item<S: Store>(
    State(state): State<AppState<S>>,
    RequireAuth(user): RequireAuth,
    ApiPath((order_id, item_id)): ApiPath<(OrderId, OrderItemId)>,
) -> Result<Json<OrderItem>> {
    let item = OrderService::new(state.store())
        .order_item(user.id, order_id, item_id)
        .await?;
    Ok(Json(item))
}
