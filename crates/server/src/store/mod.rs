//! Storage abstraction used by the services.
//!
//! Each trait groups the persistence operations of one aggregate. [`Store`]
//! ties them together and opens transactions; checkout runs entirely on a
//! [`Store::Transaction`] so that either the order is written and the cart is
//! emptied, or nothing changes.
//!
//! Implementations:
//! - [`crate::db::PgStore`] - `PostgreSQL` via sqlx (production)
//! - [`memory::MemoryStore`] - in-process maps (tests, `memory-store` feature)

#[cfg(any(test, feature = "memory-store"))]
pub mod memory;

use std::future::Future;

use bookstore_core::{
    BookId, CartId, CartItemId, CategoryId, Email, OrderId, OrderStatus, Role, UserId,
};

use crate::db::RepositoryError;
use crate::models::{
    Book, BookDraft, BookSearch, CartItemRecord, Category, CategoryDraft, NewOrder, NewUser,
    Order, Page, PageRequest, ShoppingCart, User,
};

/// Books and categories.
///
/// Soft-deleted rows are invisible to every operation here.
pub trait CatalogStore {
    fn list_books(
        &self,
        page: &PageRequest,
    ) -> impl Future<Output = Result<Page<Book>, RepositoryError>> + Send;

    fn get_book(&self, id: BookId)
    -> impl Future<Output = Result<Option<Book>, RepositoryError>> + Send;

    fn book_exists(&self, id: BookId) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn search_books(
        &self,
        search: &BookSearch,
    ) -> impl Future<Output = Result<Vec<Book>, RepositoryError>> + Send;

    fn books_by_category(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Vec<Book>, RepositoryError>> + Send;

    /// Insert a book linked to `categories`.
    ///
    /// Fails with [`RepositoryError::Conflict`] if a live book has the same ISBN.
    fn insert_book(
        &self,
        draft: &BookDraft,
        categories: &[CategoryId],
    ) -> impl Future<Output = Result<Book, RepositoryError>> + Send;

    /// Replace every field and category link of a book. `None` if it does not exist.
    fn update_book(
        &self,
        id: BookId,
        draft: &BookDraft,
        categories: &[CategoryId],
    ) -> impl Future<Output = Result<Option<Book>, RepositoryError>> + Send;

    /// Mark a book deleted. `false` if it did not exist.
    fn soft_delete_book(&self, id: BookId)
    -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// The categories among `ids` that exist; unknown ids are dropped.
    fn find_categories(
        &self,
        ids: &[CategoryId],
    ) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    fn list_categories(
        &self,
        page: &PageRequest,
    ) -> impl Future<Output = Result<Page<Category>, RepositoryError>> + Send;

    fn get_category(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    fn insert_category(
        &self,
        draft: &CategoryDraft,
    ) -> impl Future<Output = Result<Category, RepositoryError>> + Send;

    fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    fn soft_delete_category(
        &self,
        id: CategoryId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Shopping carts and their line items.
pub trait CartStore {
    /// The user's cart. On a [`Store::Transaction`] the cart and its lines stay
    /// locked against concurrent writers until the transaction ends.
    fn cart_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<ShoppingCart>, RepositoryError>> + Send;

    fn cart_by_id(
        &self,
        cart_id: CartId,
    ) -> impl Future<Output = Result<Option<ShoppingCart>, RepositoryError>> + Send;

    fn cart_item(
        &self,
        item_id: CartItemId,
    ) -> impl Future<Output = Result<Option<CartItemRecord>, RepositoryError>> + Send;

    /// Add `quantity` of a book to a cart.
    ///
    /// If the cart already holds the book, the quantities are summed instead of
    /// creating a second line, even when two requests race on the same pair.
    fn add_cart_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i32,
    ) -> impl Future<Output = Result<CartItemId, RepositoryError>> + Send;

    /// Overwrite a line item's quantity. `false` if the item does not exist.
    fn set_cart_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn delete_cart_item(
        &self,
        item_id: CartItemId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete every line item of a cart, returning how many were removed.
    fn clear_cart(&self, cart_id: CartId)
    -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Orders and their item snapshots.
pub trait OrderStore {
    fn insert_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    fn orders_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> impl Future<Output = Result<Page<Order>, RepositoryError>> + Send;

    fn get_order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Overwrite an order's status. `false` if the order does not exist.
    fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Customer accounts.
pub trait UserStore {
    /// Create a user with the `USER` role and an empty cart, atomically.
    ///
    /// Fails with [`RepositoryError::Conflict`] if the email is taken.
    fn create_user(&self, user: &NewUser)
    -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// A user together with their password hash, for login.
    fn user_credentials(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    fn find_user_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// A user with their current roles.
    fn find_user_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Grant a role. Granting a role the user already holds is a no-op.
    fn grant_role(
        &self,
        user_id: UserId,
        role: Role,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Revoke a role, returning whether the user held it.
    fn revoke_role(
        &self,
        user_id: UserId,
        role: Role,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// A unit of work. Dropping it without calling [`commit`](Self::commit) rolls back.
pub trait StoreTransaction {
    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// The complete store handed to [`crate::state::AppState`].
pub trait Store:
    CatalogStore + CartStore + OrderStore + UserStore + Clone + Send + Sync + 'static
{
    type Transaction: CartStore + OrderStore + StoreTransaction + Send + Sync;

    /// Start a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, RepositoryError>> + Send;

    /// Check that the backing storage is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
