//! Catalog service: books and categories.

use bookstore_core::{BookId, CategoryId};

use super::ServiceError;
use crate::models::{
    Book, BookDraft, BookSearch, BookSummary, Category, CategoryDraft, Page, PageRequest,
};
use crate::store::CatalogStore;

/// Book and category management.
pub struct CatalogService<'a, S> {
    store: &'a S,
}

fn book_not_found(id: BookId) -> ServiceError {
    ServiceError::EntityNotFound(format!("Can't find book by id {id}"))
}

fn category_not_found(id: CategoryId) -> ServiceError {
    ServiceError::EntityNotFound(format!("Can't find category by id {id}"))
}

impl<'a, S: CatalogStore + Sync> CatalogService<'a, S> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// List live books.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_books(&self, page: &PageRequest) -> Result<Page<Book>, ServiceError> {
        Ok(self.store.list_books(page).await?)
    }

    /// Get a book by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the book does not exist.
    pub async fn get_book(&self, id: BookId) -> Result<Book, ServiceError> {
        self.store
            .get_book(id)
            .await?
            .ok_or_else(|| book_not_found(id))
    }

    /// Create a book linked to the given categories.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if `category_ids` is empty.
    /// Returns `ServiceError::Repository` with a conflict if the ISBN is taken.
    pub async fn create_book(
        &self,
        draft: &BookDraft,
        category_ids: &[CategoryId],
    ) -> Result<Book, ServiceError> {
        let categories = self.resolve_categories(category_ids).await?;
        let book = self.store.insert_book(draft, &categories).await?;
        tracing::info!(book_id = %book.id, isbn = %book.isbn, "book created");
        Ok(book)
    }

    /// Replace every field and category link of a book.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the book does not exist or
    /// `category_ids` is empty.
    pub async fn update_book(
        &self,
        id: BookId,
        draft: &BookDraft,
        category_ids: &[CategoryId],
    ) -> Result<Book, ServiceError> {
        if !self.store.book_exists(id).await? {
            return Err(book_not_found(id));
        }
        let categories = self.resolve_categories(category_ids).await?;
        let book = self
            .store
            .update_book(id, draft, &categories)
            .await?
            .ok_or_else(|| book_not_found(id))?;
        tracing::info!(book_id = %id, "book updated");
        Ok(book)
    }

    /// Soft delete a book.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the book does not exist.
    pub async fn delete_book(&self, id: BookId) -> Result<(), ServiceError> {
        if !self.store.soft_delete_book(id).await? {
            return Err(book_not_found(id));
        }
        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }

    /// Exact-match search over titles and authors.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn search_books(&self, search: &BookSearch) -> Result<Vec<Book>, ServiceError> {
        tracing::debug!(titles = ?search.titles, authors = ?search.authors, "searching books");
        Ok(self.store.search_books(search).await?)
    }

    /// Books linked to a category, without their category ids.
    ///
    /// The existence check looks the id up among books, not categories.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if no book has the id.
    pub async fn books_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<BookSummary>, ServiceError> {
        if !self
            .store
            .book_exists(BookId::new(category_id.as_i64()))
            .await?
        {
            return Err(ServiceError::EntityNotFound(format!(
                "Can't find category by category id {category_id}"
            )));
        }
        let books = self.store.books_by_category(category_id).await?;
        Ok(books.into_iter().map(BookSummary::from).collect())
    }

    /// Keep the ids that name live categories, in ascending order.
    async fn resolve_categories(
        &self,
        category_ids: &[CategoryId],
    ) -> Result<Vec<CategoryId>, ServiceError> {
        if category_ids.is_empty() {
            return Err(ServiceError::EntityNotFound(
                "Can't find categories by empty ids list".to_owned(),
            ));
        }
        let found = self.store.find_categories(category_ids).await?;
        if found.len() < category_ids.len() {
            tracing::debug!(
                requested = category_ids.len(),
                found = found.len(),
                "dropping unknown category ids"
            );
        }
        Ok(found.into_iter().map(|c| c.id).collect())
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List live categories.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_categories(
        &self,
        page: &PageRequest,
    ) -> Result<Page<Category>, ServiceError> {
        Ok(self.store.list_categories(page).await?)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the category does not exist.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, ServiceError> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| category_not_found(id))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<Category, ServiceError> {
        let category = self.store.insert_category(draft).await?;
        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    /// Replace a category's name and description.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the category does not exist.
    pub async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, ServiceError> {
        self.store
            .update_category(id, draft)
            .await?
            .ok_or_else(|| category_not_found(id))
    }

    /// Soft delete a category.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the category does not exist.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), ServiceError> {
        if !self.store.soft_delete_category(id).await? {
            return Err(category_not_found(id));
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}
