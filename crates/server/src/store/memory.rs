//! In-process store.
//!
//! Mirrors the `PostgreSQL` semantics closely enough for the service and HTTP
//! tests: soft-deleted rows are invisible, ISBNs are unique among live books,
//! emails are unique, and adding a book already in a cart merges the lines.
//!
//! A transaction locks the whole store and works on a copy that replaces the
//! live state on commit.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use bookstore_core::{
    BookId, CartId, CartItemId, CategoryId, Email, OrderId, OrderItemId, OrderStatus, Role,
    UserId,
};

use super::{CartStore, CatalogStore, OrderStore, Store, StoreTransaction, UserStore};
use crate::db::RepositoryError;
use crate::models::{
    Book, BookDraft, BookSearch, CartItem, CartItemRecord, Category, CategoryDraft, NewOrder,
    NewUser, Order, OrderItem, Page, PageRequest, ShoppingCart, Sort, SortDirection, User,
};

#[derive(Debug, Clone)]
struct StoredBook {
    draft: BookDraft,
    is_deleted: bool,
}

#[derive(Debug, Clone)]
struct StoredCategory {
    draft: CategoryDraft,
    is_deleted: bool,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    book: i64,
    category: i64,
    user: i64,
    cart: i64,
    cart_item: i64,
    order: i64,
    order_item: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    seq: Sequences,
    books: BTreeMap<BookId, StoredBook>,
    categories: BTreeMap<CategoryId, StoredCategory>,
    book_categories: BTreeSet<(BookId, CategoryId)>,
    users: BTreeMap<UserId, StoredUser>,
    carts: BTreeMap<CartId, UserId>,
    cart_items: BTreeMap<CartItemId, CartItemRecord>,
    orders: BTreeMap<OrderId, Order>,
}

/// Sort rows by a whitelisted column name, falling back to ascending ids.
fn sort_rows<T>(
    rows: &mut [T],
    sort: Option<Sort>,
    id: impl Fn(&T) -> i64,
    by_column: impl Fn(&T, &T, &str) -> Ordering,
) {
    rows.sort_by(|a, b| {
        let ordering = sort.map_or(Ordering::Equal, |sort| {
            let ordering = by_column(a, b, sort.column);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        ordering.then_with(|| id(a).cmp(&id(b)))
    });
}

impl MemoryState {
    fn is_live_category(&self, id: CategoryId) -> bool {
        self.categories.get(&id).is_some_and(|c| !c.is_deleted)
    }

    fn isbn_taken(&self, isbn: &str, except: Option<BookId>) -> bool {
        self.books
            .iter()
            .any(|(id, b)| Some(*id) != except && !b.is_deleted && b.draft.isbn == isbn)
    }

    fn book(&self, id: BookId) -> Option<Book> {
        let stored = self.books.get(&id).filter(|b| !b.is_deleted)?;
        let category_ids = self
            .book_categories
            .iter()
            .filter(|(book_id, category_id)| *book_id == id && self.is_live_category(*category_id))
            .map(|(_, category_id)| *category_id)
            .collect();
        let draft = stored.draft.clone();
        Some(Book {
            id,
            title: draft.title,
            author: draft.author,
            isbn: draft.isbn,
            price: draft.price,
            description: draft.description,
            cover_image: draft.cover_image,
            category_ids,
        })
    }

    fn live_books(&self) -> Vec<Book> {
        self.books.keys().filter_map(|id| self.book(*id)).collect()
    }

    fn link_categories(&mut self, book_id: BookId, categories: &[CategoryId]) {
        for category_id in categories {
            self.book_categories.insert((book_id, *category_id));
        }
    }

    fn insert_book(&mut self, draft: &BookDraft, categories: &[CategoryId]) -> Result<Book, RepositoryError> {
        if self.isbn_taken(&draft.isbn, None) {
            return Err(RepositoryError::Conflict(format!("isbn {} already exists", draft.isbn)));
        }
        let id = BookId::new(next(&mut self.seq.book));
        self.books.insert(
            id,
            StoredBook {
                draft: draft.clone(),
                is_deleted: false,
            },
        );
        self.link_categories(id, categories);
        self.book(id).ok_or(RepositoryError::NotFound)
    }

    fn update_book(
        &mut self,
        id: BookId,
        draft: &BookDraft,
        categories: &[CategoryId],
    ) -> Result<Option<Book>, RepositoryError> {
        if !self.books.get(&id).is_some_and(|b| !b.is_deleted) {
            return Ok(None);
        }
        if self.isbn_taken(&draft.isbn, Some(id)) {
            return Err(RepositoryError::Conflict(format!("isbn {} already exists", draft.isbn)));
        }
        if let Some(stored) = self.books.get_mut(&id) {
            stored.draft = draft.clone();
        }
        self.book_categories.retain(|(book_id, _)| *book_id != id);
        self.link_categories(id, categories);
        Ok(self.book(id))
    }

    fn category(&self, id: CategoryId) -> Option<Category> {
        let stored = self.categories.get(&id).filter(|c| !c.is_deleted)?;
        Some(Category {
            id,
            name: stored.draft.name.clone(),
            description: stored.draft.description.clone(),
        })
    }

    fn cart(&self, cart_id: CartId) -> Option<ShoppingCart> {
        let user_id = *self.carts.get(&cart_id)?;
        let cart_items = self
            .cart_items
            .values()
            .filter(|item| item.cart_id == cart_id)
            .filter_map(|item| {
                // Cart lines keep pointing at books even after a soft delete.
                let book = &self.books.get(&item.book_id)?.draft;
                Some(CartItem {
                    id: item.id,
                    book_id: item.book_id,
                    book_title: book.title.clone(),
                    quantity: item.quantity,
                    book_price: book.price,
                })
            })
            .collect();
        Some(ShoppingCart {
            id: cart_id,
            user_id,
            cart_items,
        })
    }

    fn add_cart_item(&mut self, cart_id: CartId, book_id: BookId, quantity: i32) -> CartItemId {
        if let Some(existing) = self
            .cart_items
            .values_mut()
            .find(|item| item.cart_id == cart_id && item.book_id == book_id)
        {
            existing.quantity = existing.quantity.saturating_add(quantity);
            return existing.id;
        }
        let id = CartItemId::new(next(&mut self.seq.cart_item));
        self.cart_items.insert(
            id,
            CartItemRecord {
                id,
                cart_id,
                book_id,
                quantity,
            },
        );
        id
    }

    fn set_cart_item_quantity(&mut self, item_id: CartItemId, quantity: i32) -> bool {
        let Some(item) = self.cart_items.get_mut(&item_id) else {
            return false;
        };
        item.quantity = quantity;
        true
    }

    fn clear_cart(&mut self, cart_id: CartId) -> u64 {
        let before = self.cart_items.len();
        self.cart_items.retain(|_, item| item.cart_id != cart_id);
        (before - self.cart_items.len()) as u64
    }

    fn insert_order(&mut self, new_order: &NewOrder) -> Order {
        let id = OrderId::new(next(&mut self.seq.order));
        let order_items = new_order
            .items
            .iter()
            .map(|item| OrderItem {
                id: OrderItemId::new(next(&mut self.seq.order_item)),
                book_id: item.book_id,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();
        let order = Order {
            id,
            user_id: new_order.user_id,
            status: new_order.status,
            total: new_order.total,
            shipping_address: new_order.shipping_address.clone(),
            order_date: new_order.order_date,
            order_items,
        };
        self.orders.insert(id, order.clone());
        order
    }

    fn orders_for_user(&self, user_id: UserId, page: &PageRequest) -> Page<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|order| order.user_id == user_id)
            .cloned()
            .collect();
        sort_rows(&mut orders, page.sort, |o| o.id.as_i64(), |a, b, column| match column {
            "order_date" => a.order_date.cmp(&b.order_date),
            "total" => a.total.cmp(&b.total),
            _ => Ordering::Equal,
        });
        page.slice(orders)
    }

    fn set_order_status(&mut self, id: OrderId, status: OrderStatus) -> bool {
        let Some(order) = self.orders.get_mut(&id) else {
            return false;
        };
        order.status = status;
        true
    }

    fn create_user(&mut self, new_user: &NewUser) -> Result<User, RepositoryError> {
        if self.users.values().any(|u| u.user.email == new_user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let id = UserId::new(next(&mut self.seq.user));
        let user = User {
            id,
            email: new_user.email.clone(),
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            shipping_address: new_user.shipping_address.clone(),
            roles: vec![Role::User],
        };
        self.users.insert(
            id,
            StoredUser {
                user: user.clone(),
                password_hash: new_user.password_hash.clone(),
            },
        );
        let cart_id = CartId::new(next(&mut self.seq.cart));
        self.carts.insert(cart_id, id);
        Ok(user)
    }

    fn user_credentials(&self, email: &Email) -> Option<(User, String)> {
        self.users
            .values()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone()))
    }
}

/// In-memory [`Store`] for tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStore for MemoryStore {
    async fn list_books(&self, page: &PageRequest) -> Result<Page<Book>, RepositoryError> {
        let state = self.state.lock().await;
        let mut books = state.live_books();
        sort_rows(&mut books, page.sort, |b| b.id.as_i64(), |a, b, column| match column {
            "title" => a.title.cmp(&b.title),
            "author" => a.author.cmp(&b.author),
            "price" => a.price.cmp(&b.price),
            "isbn" => a.isbn.cmp(&b.isbn),
            _ => Ordering::Equal,
        });
        Ok(page.slice(books))
    }

    async fn get_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.state.lock().await.book(id))
    }

    async fn book_exists(&self, id: BookId) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().await.book(id).is_some())
    }

    async fn search_books(&self, search: &BookSearch) -> Result<Vec<Book>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .live_books()
            .into_iter()
            .filter(|b| search.matches(&b.title, &b.author))
            .collect())
    }

    async fn books_by_category(&self, id: CategoryId) -> Result<Vec<Book>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .live_books()
            .into_iter()
            .filter(|b| b.category_ids.contains(&id))
            .collect())
    }

    async fn insert_book(
        &self,
        draft: &BookDraft,
        categories: &[CategoryId],
    ) -> Result<Book, RepositoryError> {
        self.state.lock().await.insert_book(draft, categories)
    }

    async fn update_book(
        &self,
        id: BookId,
        draft: &BookDraft,
        categories: &[CategoryId],
    ) -> Result<Option<Book>, RepositoryError> {
        self.state.lock().await.update_book(id, draft, categories)
    }

    async fn soft_delete_book(&self, id: BookId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(match state.books.get_mut(&id) {
            Some(book) if !book.is_deleted => {
                book.is_deleted = true;
                true
            }
            _ => false,
        })
    }

    async fn find_categories(&self, ids: &[CategoryId]) -> Result<Vec<Category>, RepositoryError> {
        let state = self.state.lock().await;
        let wanted: BTreeSet<CategoryId> = ids.iter().copied().collect();
        Ok(wanted.into_iter().filter_map(|id| state.category(id)).collect())
    }

    async fn list_categories(&self, page: &PageRequest) -> Result<Page<Category>, RepositoryError> {
        let state = self.state.lock().await;
        let mut categories: Vec<Category> = state
            .categories
            .keys()
            .filter_map(|id| state.category(*id))
            .collect();
        sort_rows(&mut categories, page.sort, |c| c.id.as_i64(), |a, b, column| match column {
            "name" => a.name.cmp(&b.name),
            _ => Ordering::Equal,
        });
        Ok(page.slice(categories))
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        Ok(self.state.lock().await.category(id))
    }

    async fn insert_category(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        let mut state = self.state.lock().await;
        let id = CategoryId::new(next(&mut state.seq.category));
        state.categories.insert(
            id,
            StoredCategory {
                draft: draft.clone(),
                is_deleted: false,
            },
        );
        state.category(id).ok_or(RepositoryError::NotFound)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Option<Category>, RepositoryError> {
        let mut state = self.state.lock().await;
        match state.categories.get_mut(&id) {
            Some(category) if !category.is_deleted => category.draft = draft.clone(),
            _ => return Ok(None),
        }
        Ok(state.category(id))
    }

    async fn soft_delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        Ok(match state.categories.get_mut(&id) {
            Some(category) if !category.is_deleted => {
                category.is_deleted = true;
                true
            }
            _ => false,
        })
    }
}

impl CartStore for MemoryStore {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<ShoppingCart>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(cart_for_user(&state, user_id))
    }

    async fn cart_by_id(&self, cart_id: CartId) -> Result<Option<ShoppingCart>, RepositoryError> {
        Ok(self.state.lock().await.cart(cart_id))
    }

    async fn cart_item(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>, RepositoryError> {
        Ok(self.state.lock().await.cart_items.get(&item_id).copied())
    }

    async fn add_cart_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<CartItemId, RepositoryError> {
        Ok(self.state.lock().await.add_cart_item(cart_id, book_id, quantity))
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().await.set_cart_item_quantity(item_id, quantity))
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().await.cart_items.remove(&item_id).is_some())
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        Ok(self.state.lock().await.clear_cart(cart_id))
    }
}

fn cart_for_user(state: &MemoryState, user_id: UserId) -> Option<ShoppingCart> {
    let cart_id = state
        .carts
        .iter()
        .find(|(_, owner)| **owner == user_id)
        .map(|(id, _)| *id)?;
    state.cart(cart_id)
}

impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        Ok(self.state.lock().await.insert_order(order))
    }

    async fn orders_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        Ok(self.state.lock().await.orders_for_user(user_id, page))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.state.lock().await.orders.get(&id).cloned())
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().await.set_order_status(id, status))
    }
}

impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        self.state.lock().await.create_user(user)
    }

    async fn user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        Ok(self.state.lock().await.user_credentials(email))
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .user_credentials(email)
            .map(|(user, _)| user))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .state
            .lock()
            .await
            .users
            .get(&id)
            .map(|stored| stored.user.clone()))
    }

    async fn grant_role(&self, user_id: UserId, role: Role) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if let Some(stored) = state.users.get_mut(&user_id)
            && !stored.user.roles.contains(&role)
        {
            stored.user.roles.push(role);
            stored.user.roles.sort();
        }
        Ok(())
    }

    async fn revoke_role(&self, user_id: UserId, role: Role) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.users.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = stored.user.roles.len();
        stored.user.roles.retain(|r| *r != role);
        Ok(stored.user.roles.len() < before)
    }
}

impl Store for MemoryStore {
    type Transaction = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTx {
            inner: Mutex::new(TxState { guard, staged }),
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

struct TxState {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

/// Transaction over a [`MemoryStore`].
///
/// Holds the store lock until committed or dropped.
pub struct MemoryTx {
    inner: Mutex<TxState>,
}

impl CartStore for MemoryTx {
    async fn cart_for_user(&self, user_id: UserId) -> Result<Option<ShoppingCart>, RepositoryError> {
        Ok(cart_for_user(&self.inner.lock().await.staged, user_id))
    }

    async fn cart_by_id(&self, cart_id: CartId) -> Result<Option<ShoppingCart>, RepositoryError> {
        Ok(self.inner.lock().await.staged.cart(cart_id))
    }

    async fn cart_item(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<CartItemRecord>, RepositoryError> {
        Ok(self.inner.lock().await.staged.cart_items.get(&item_id).copied())
    }

    async fn add_cart_item(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<CartItemId, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .await
            .staged
            .add_cart_item(cart_id, book_id, quantity))
    }

    async fn set_cart_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .await
            .staged
            .set_cart_item_quantity(item_id, quantity))
    }

    async fn delete_cart_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        Ok(self
            .inner
            .lock()
            .await
            .staged
            .cart_items
            .remove(&item_id)
            .is_some())
    }

    async fn clear_cart(&self, cart_id: CartId) -> Result<u64, RepositoryError> {
        Ok(self.inner.lock().await.staged.clear_cart(cart_id))
    }
}

impl OrderStore for MemoryTx {
    async fn insert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        Ok(self.inner.lock().await.staged.insert_order(order))
    }

    async fn orders_for_user(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        Ok(self.inner.lock().await.staged.orders_for_user(user_id, page))
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.inner.lock().await.staged.orders.get(&id).cloned())
    }

    async fn set_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        Ok(self.inner.lock().await.staged.set_order_status(id, status))
    }
}

impl StoreTransaction for MemoryTx {
    async fn commit(self) -> Result<(), RepositoryError> {
        let TxState { mut guard, staged } = self.inner.into_inner();
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::Price;

    use super::*;

    fn draft(title: &str, isbn: &str) -> BookDraft {
        BookDraft {
            title: title.to_owned(),
            author: "Author".to_owned(),
            isbn: isbn.to_owned(),
            price: Price::from_cents(1_000).unwrap(),
            description: None,
            cover_image: None,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            shipping_address: None,
        }
    }

    #[tokio::test]
    async fn test_isbn_unique_among_live_books() {
        let store = MemoryStore::new();
        let book = store.insert_book(&draft("A", "1"), &[]).await.unwrap();

        let err = store.insert_book(&draft("B", "1"), &[]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        assert!(store.soft_delete_book(book.id).await.unwrap());
        assert!(store.insert_book(&draft("B", "1"), &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_category_hidden_from_book() {
        let store = MemoryStore::new();
        let category = store
            .insert_category(&CategoryDraft {
                name: "Fiction".to_owned(),
                description: None,
            })
            .await
            .unwrap();
        let book = store
            .insert_book(&draft("A", "1"), &[category.id])
            .await
            .unwrap();
        assert_eq!(book.category_ids, vec![category.id]);

        store.soft_delete_category(category.id).await.unwrap();
        let book = store.get_book(book.id).await.unwrap().unwrap();
        assert!(book.category_ids.is_empty());
    }

    #[tokio::test]
    async fn test_add_cart_item_merges_lines() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a@example.com")).await.unwrap();
        let book = store.insert_book(&draft("A", "1"), &[]).await.unwrap();
        let cart = store.cart_for_user(user.id).await.unwrap().unwrap();

        let first = store.add_cart_item(cart.id, book.id, 2).await.unwrap();
        let second = store.add_cart_item(cart.id, book.id, 3).await.unwrap();
        assert_eq!(first, second);

        let cart = store.cart_by_id(cart.id).await.unwrap().unwrap();
        assert_eq!(cart.cart_items.len(), 1);
        assert_eq!(cart.cart_items[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(&new_user("a@example.com")).await.unwrap();
        let err = store
            .create_user(&new_user("A@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_revoked_role_visible_by_id() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a@example.com")).await.unwrap();
        store.grant_role(user.id, Role::Admin).await.unwrap();
        assert!(
            store
                .find_user_by_id(user.id)
                .await
                .unwrap()
                .unwrap()
                .has_role(Role::Admin)
        );

        assert!(store.revoke_role(user.id, Role::Admin).await.unwrap());
        let user = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.roles, vec![Role::User]);

        assert!(store.find_user_by_id(UserId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = MemoryStore::new();
        let user = store.create_user(&new_user("a@example.com")).await.unwrap();
        let book = store.insert_book(&draft("A", "1"), &[]).await.unwrap();
        let cart = store.cart_for_user(user.id).await.unwrap().unwrap();

        {
            let tx = store.begin().await.unwrap();
            tx.add_cart_item(cart.id, book.id, 1).await.unwrap();
        }
        assert!(store.cart_by_id(cart.id).await.unwrap().unwrap().is_empty());

        let tx = store.begin().await.unwrap();
        tx.add_cart_item(cart.id, book.id, 1).await.unwrap();
        tx.commit().await.unwrap();
        assert!(!store.cart_by_id(cart.id).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_books_sorted_desc() {
        let store = MemoryStore::new();
        store.insert_book(&draft("Alpha", "1"), &[]).await.unwrap();
        store.insert_book(&draft("Gamma", "2"), &[]).await.unwrap();
        store.insert_book(&draft("Beta", "3"), &[]).await.unwrap();

        let sort = Sort::parse("title,desc", &[("title", "title")]).unwrap();
        let page = store
            .list_books(&PageRequest::new(0, 2).with_sort(sort))
            .await
            .unwrap();
        let titles: Vec<_> = page.content.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Gamma", "Beta"]);
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 2);
    }
}
