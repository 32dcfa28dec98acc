//! `PostgreSQL` implementation of the store traits.

use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use bookstore_core::{
    BookId, CartId, CartItemId, CategoryId, Email, OrderId, OrderStatus, Role, UserId,
};

use super::{RepositoryError, books, carts, categories, orders, users};
use crate::models::{
    Book, BookDraft, BookSearch, CartItemRecord, Category, CategoryDraft, NewOrder, NewUser,
    Order, Page, PageRequest, ShoppingCart, User,
};
use crate::store::{CartStore, CatalogStore, OrderStore, Store, StoreTransaction, UserStore};

/// Store backed by a `PostgreSQL` connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CatalogStore for PgStore {
    async fn list_books(&self, page: &PageRequest) -> Result<Page<Book>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        books::list_books(&mut conn, page).await
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        books::get_book(&mut conn, id).await
    }

    async fn book_exists(&self, id: BookId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        books::book_exists(&mut conn, id).await
    }

    async fn search_books(&self, search: &BookSearch) -> Result<Vec<Book>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        books::search_books(&mut conn, search).await
    }

    async fn books_by_category(&self, id: CategoryId) -> Result<Vec<Book>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        books::books_by_category(&mut conn, id).await
    }

    async fn insert_book(
        &self,
        draft: &BookDraft,
        categories: &[CategoryId],
    ) -> Result<Book, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let book = books::insert_book(&mut tx, draft, categories).await?;
        tx.commit().await?;
        Ok(book)
    }

    async fn update_book(
        &self,
        id: BookId,
        draft: &BookDraft,
        categories: &[CategoryId],
    ) -> Result<Option<Book>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let book = books::update_book(&mut tx, id, draft, categories).await?;
        tx.commit().await?;
        Ok(book)
    }

    async fn soft_delete_book(&self, id: BookId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        books::soft_delete_book(&mut conn, id).await
    }

    async fn find_categories(&self, ids: &[CategoryId]) -> Result<Vec<Category>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        categories::find_categories(&mut conn, ids).await
    }

    async fn list_categories(&self, page: &PageRequest) -> Result<Page<Category>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        categories::list_categories(&mut conn, page).await
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        categories::get_category(&mut conn, id).await
    }

    async fn insert_category(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        categories::insert_category(&mut conn, draft).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Option<Category>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        categories::update_category(&mut conn, id, draft).await
    }

    async fn soft_delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        categories::soft_delete_category(&mut conn, id).await
    }
}

impl CartStore for PgStore {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<ShoppingCart>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        carts::cart_for_user(&mut conn, user_id).await
    }

    async fn cart_by_id(&self, cart_id: CartId) -> Result<Option<ShoppingCart>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        carts::cart_by_id(&mut conn, cart_id).await
    }

    async fn cart_item(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        carts::cart_item(&mut conn, item_id).await
    }

    async fn add_cart_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<CartItemId, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        carts::add_cart_item(&mut conn, cart_id, book_id, quantity).await
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        carts::set_cart_item_quantity(&mut conn, item_id, quantity).await
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        carts::delete_cart_item(&mut conn, item_id).await
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        carts::clear_cart(&mut conn, cart_id).await
    }
}

impl OrderStore for PgStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(&mut tx, order).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn orders_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        orders::orders_for_user(&mut conn, user_id, page).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        orders::get_order(&mut conn, id).await
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_order_status(&mut conn, id, status).await
    }
}

impl UserStore for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let user = users::create_user(&mut tx, user).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        users::user_credentials(&mut conn, email).await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.user_credentials(email).await?.map(|(user, _)| user))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        users::get_user(&mut conn, id).await
    }

    async fn grant_role(&self, user_id: UserId, role: Role) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        users::grant_role(&mut conn, user_id, role).await
    }

    async fn revoke_role(&self, user_id: UserId, role: Role) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        users::revoke_role(&mut conn, user_id, role).await
    }
}

impl Store for PgStore {
    type Transaction = PgTransaction;

    async fn begin(&self) -> Result<PgTransaction, RepositoryError> {
        Ok(PgTransaction {
            tx: Mutex::new(self.pool.begin().await?),
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A `PostgreSQL` transaction usable through the store traits.
///
/// Rolled back on drop unless committed.
pub struct PgTransaction {
    tx: Mutex<Transaction<'static, Postgres>>,
}

impl CartStore for PgTransaction {
    // Reading a cart inside a transaction locks it until commit or rollback.
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<ShoppingCart>, RepositoryError> {
        let mut tx = self.tx.lock().await;
        carts::lock_cart_for_user(&mut tx, user_id).await
    }

    async fn cart_by_id(&self, cart_id: CartId) -> Result<Option<ShoppingCart>, RepositoryError> {
        let mut tx = self.tx.lock().await;
        carts::cart_by_id(&mut tx, cart_id).await
    }

    async fn cart_item(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>, RepositoryError> {
        let mut tx = self.tx.lock().await;
        carts::cart_item(&mut tx, item_id).await
    }

    async fn add_cart_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<CartItemId, RepositoryError> {
        let mut tx = self.tx.lock().await;
        carts::add_cart_item(&mut tx, cart_id, book_id, quantity).await
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.tx.lock().await;
        carts::set_cart_item_quantity(&mut tx, item_id, quantity).await
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let mut tx = self.tx.lock().await;
        carts::delete_cart_item(&mut tx, item_id).await
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let mut tx = self.tx.lock().await;
        carts::clear_cart(&mut tx, cart_id).await
    }
}

impl OrderStore for PgTransaction {
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.tx.lock().await;
        orders::insert_order(&mut tx, order).await
    }

    async fn orders_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let mut tx = self.tx.lock().await;
        orders::orders_for_user(&mut tx, user_id, page).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.tx.lock().await;
        orders::get_order(&mut tx, id).await
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.tx.lock().await;
        orders::set_order_status(&mut tx, id, status).await
    }
}

impl StoreTransaction for PgTransaction {
    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.into_inner().commit().await?;
        Ok(())
    }
}
