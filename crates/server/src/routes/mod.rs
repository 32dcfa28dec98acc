//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /auth/register                     - Create an account (public)
//! POST   /auth/login                        - Start a session (public)
//! POST   /auth/logout                       - End the session
//!
//! # Books
//! GET    /books                             - Page of books
//! GET    /books/search                      - Exact title/author search
//! GET    /books/{id}                        - One book
//! POST   /books                             - Create (admin)
//! PUT    /books/{id}                        - Replace (admin)
//! DELETE /books/{id}                        - Soft delete (admin)
//!
//! # Categories
//! GET    /categories                        - Page of categories
//! GET    /categories/{id}                   - One category
//! GET    /categories/{id}/books             - Books of a category
//! POST   /categories                        - Create (admin)
//! PUT    /categories/{id}                   - Replace (admin)
//! DELETE /categories/{id}                   - Soft delete (admin)
//!
//! # Cart (requires auth)
//! GET    /cart                              - Current cart
//! POST   /cart                              - Add a book
//! PUT    /cart/cart-items/{id}              - Set a line's quantity
//! DELETE /cart/cart-items/{id}              - Remove a line
//!
//! # Orders (requires auth)
//! GET    /orders                            - Page of own orders
//! POST   /orders                            - Check out the cart
//! GET    /orders/{orderId}/items            - Items of an own order
//! GET    /orders/{orderId}/items/{itemId}   - One item of an own order
//! PATCH  /orders/{orderId}                  - Change status (admin)
//! ```

pub mod auth;
pub mod books;
pub mod cart;
pub mod categories;
pub mod orders;

use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{PageRequest, Sort};
use crate::state::AppState;
use crate::store::Store;

/// Paging query parameters: `page` (0-based), `size`, `sort=field[,asc|desc]`.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl PageParams {
    /// Build a page request, accepting only the `sortable` fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown sort field or direction.
    pub fn into_page_request(
        self,
        sortable: &[(&str, &'static str)],
    ) -> Result<PageRequest, AppError> {
        let request = PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        );

        match self.sort.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let sort = Sort::parse(raw, sortable).map_err(AppError::BadRequest)?;
                Ok(request.with_sort(sort))
            }
            None => Ok(request),
        }
    }
}

/// Create all API routes.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .merge(auth::routes())
        .merge(books::routes())
        .merge(categories::routes())
        .merge(cart::routes())
        .merge(orders::routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::SortDirection;

    const SORTABLE: &[(&str, &str)] = &[("id", "id"), ("title", "title")];

    #[test]
    fn test_page_params_defaults() {
        let request = PageParams::default().into_page_request(SORTABLE).unwrap();
        assert_eq!(request, PageRequest::default());
    }

    #[test]
    fn test_page_params_with_sort() {
        let params = PageParams {
            page: Some(2),
            size: Some(500),
            sort: Some("title,desc".to_owned()),
        };
        let request = params.into_page_request(SORTABLE).unwrap();
        assert_eq!(request.page, 2);
        assert_eq!(request.size, PageRequest::MAX_SIZE);
        assert_eq!(request.sort.unwrap().direction, SortDirection::Desc);
    }

    #[test]
    fn test_page_params_unknown_sort() {
        let params = PageParams {
            sort: Some("password".to_owned()),
            ..PageParams::default()
        };
        assert!(matches!(
            params.into_page_request(SORTABLE),
            Err(AppError::BadRequest(_))
        ));
    }
}
