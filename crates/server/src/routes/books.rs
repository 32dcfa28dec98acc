//! Book route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use validator::Validate;

use bookstore_core::{BookId, CategoryId, Price};

use super::PageParams;
use crate::error::Result;
use crate::extract::{ApiPath, ApiQuery, ValidatedJson};
use crate::middleware::RequireAdmin;
use crate::models::{Book, BookDraft, BookSearch, Page};
use crate::services::CatalogService;
use crate::state::AppState;
use crate::store::Store;

/// Fields a book page may be sorted by.
pub const SORTABLE: &[(&str, &str)] = &[
    ("id", "id"),
    ("title", "title"),
    ("author", "author"),
    ("price", "price"),
    ("isbn", "isbn"),
];

/// Book create/replace body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    #[validate(length(min = 1, message = "must not be blank"))]
    pub title: String,
    #[validate(length(min = 1, message = "must not be blank"))]
    pub author: String,
    #[validate(length(min = 1, message = "must not be blank"))]
    pub isbn: String,
    pub price: Price,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    #[serde(rename = "categoriesIds", default)]
    pub category_ids: Vec<CategoryId>,
}

impl BookRequest {
    fn into_parts(self) -> (BookDraft, Vec<CategoryId>) {
        let draft = BookDraft {
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            price: self.price,
            description: self.description,
            cover_image: self.cover_image,
        };
        (draft, self.category_ids)
    }
}

/// Search query: comma-separated exact titles and authors.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub titles: Option<String>,
    pub authors: Option<String>,
}

impl From<SearchParams> for BookSearch {
    fn from(params: SearchParams) -> Self {
        Self {
            titles: split_list(params.titles.as_deref()),
            authors: split_list(params.authors.as_deref()),
        }
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// Book routes.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/books", get(list::<S>).post(create::<S>))
        .route("/books/search", get(search::<S>))
        .route(
            "/books/{id}",
            get(show::<S>).put(update::<S>).delete(delete::<S>),
        )
}

/// List books one page at a time.
async fn list<S: Store>(
    State(state): State<AppState<S>>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<Book>>> {
    let page = params.into_page_request(SORTABLE)?;
    let books = CatalogService::new(state.store()).list_books(&page).await?;
    Ok(Json(books))
}

/// Find books whose title or author exactly matches one of the given values.
async fn search<S: Store>(
    State(state): State<AppState<S>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<Vec<Book>>> {
    let search = BookSearch::from(params);
    let books = CatalogService::new(state.store())
        .search_books(&search)
        .await?;
    Ok(Json(books))
}

async fn show<S: Store>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<BookId>,
) -> Result<Json<Book>> {
    let book = CatalogService::new(state.store()).get_book(id).await?;
    Ok(Json(book))
}

async fn create<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> Result<(StatusCode, Json<Book>)> {
    let (draft, category_ids) = request.into_parts();
    let book = CatalogService::new(state.store())
        .create_book(&draft, &category_ids)
        .await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<BookId>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> Result<Json<Book>> {
    let (draft, category_ids) = request.into_parts();
    let book = CatalogService::new(state.store())
        .update_book(id, &draft, &category_ids)
        .await?;
    Ok(Json(book))
}

async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<BookId>,
) -> Result<StatusCode> {
    CatalogService::new(state.store()).delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_split_and_trim() {
        let search = BookSearch::from(SearchParams {
            titles: Some("Dune, Emma ,,".to_owned()),
            authors: None,
        });
        assert_eq!(search.titles, vec!["Dune", "Emma"]);
        assert!(search.authors.is_empty());
    }

    #[test]
    fn test_book_request_reads_categories_ids() {
        let request: BookRequest = serde_json::from_str(
            r#"{"title":"Dune","author":"Frank Herbert","isbn":"978-0441013593",
                "price":9.99,"coverImage":"dune.png","categoriesIds":[1,2]}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());

        let (draft, category_ids) = request.into_parts();
        assert_eq!(draft.cover_image.as_deref(), Some("dune.png"));
        assert_eq!(category_ids, vec![CategoryId::new(1), CategoryId::new(2)]);
    }

    #[test]
    fn test_book_request_rejects_blank_title() {
        let request: BookRequest = serde_json::from_str(
            r#"{"title":"","author":"A","isbn":"1","price":1}"#,
        )
        .unwrap();
        assert!(request.validate().is_err());
    }
}
