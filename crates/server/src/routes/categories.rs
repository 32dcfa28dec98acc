//! Category route handlers.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use validator::Validate;

use bookstore_core::CategoryId;

use super::PageParams;
use crate::error::Result;
use crate::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::middleware::RequireAdmin;
use crate::models::{BookSummary, Category, CategoryDraft, Page};
use crate::services::CatalogService;
use crate::state::AppState;
use crate::store::Store;

pub const SORTABLE: &[(&str, &str)] = &[("id", "id"), ("name", "name")];

/// Category create/replace body.
#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, message = "must not be blank"))]
    pub name: String,
    pub description: Option<String>,
}

impl From<CategoryRequest> for CategoryDraft {
    fn from(request: CategoryRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
        }
    }
}

/// Category routes.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/categories", get(list::<S>).post(create::<S>))
        .route(
            "/categories/{id}",
            get(show::<S>).put(update::<S>).delete(delete::<S>),
        )
        .route("/categories/{id}/books", get(books::<S>))
}

async fn list<S: Store>(
    State(state): State<AppState<S>>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<Category>>> {
    let page = params.into_page_request(SORTABLE)?;
    let categories = CatalogService::new(state.store())
        .list_categories(&page)
        .await?;
    Ok(Json(categories))
}

async fn show<S: Store>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Category>> {
    let category = CatalogService::new(state.store()).get_category(id).await?;
    Ok(Json(category))
}

/// Books of a category, without their category links.
async fn books<S: Store>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Vec<BookSummary>>> {
    let books = CatalogService::new(state.store())
        .books_by_category(id)
        .await?;
    Ok(Json(books))
}

async fn create<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = CatalogService::new(state.store())
        .create_category(&request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
    ValidatedJson(request): ValidatedJson<CategoryRequest>,
) -> Result<Json<Category>> {
    let category = CatalogService::new(state.store())
        .update_category(id, &request.into())
        .await?;
    Ok(Json(category))
}

async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode> {
    CatalogService::new(state.store()).delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
