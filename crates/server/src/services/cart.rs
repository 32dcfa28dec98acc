//! Shopping cart service.

use bookstore_core::{BookId, CartId, CartItemId, UserId};

use super::ServiceError;
use crate::models::ShoppingCart;
use crate::store::{CartStore, CatalogStore};

/// Operations on a user's shopping cart.
pub struct CartService<'a, S> {
    store: &'a S,
}

fn cart_item_not_found(id: CartItemId) -> ServiceError {
    ServiceError::EntityNotFound(format!("Can't find cart item by id {id}"))
}

impl<'a, S: CartStore + Sync> CartService<'a, S> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Get the user's cart with its items.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the user has no cart.
    pub async fn get_cart(&self, user_id: UserId) -> Result<ShoppingCart, ServiceError> {
        self.store.cart_for_user(user_id).await?.ok_or_else(|| {
            ServiceError::EntityNotFound(format!("Can't find shopping cart for user {user_id}"))
        })
    }

    async fn cart_by_id(&self, cart_id: CartId) -> Result<ShoppingCart, ServiceError> {
        self.store.cart_by_id(cart_id).await?.ok_or_else(|| {
            ServiceError::EntityNotFound(format!("Can't find shopping cart by id {cart_id}"))
        })
    }

    /// Overwrite a line item's quantity and return the owning cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the item does not exist.
    pub async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<ShoppingCart, ServiceError> {
        let item = self
            .store
            .cart_item(item_id)
            .await?
            .ok_or_else(|| cart_item_not_found(item_id))?;

        if !self.store.set_cart_item_quantity(item_id, quantity).await? {
            return Err(cart_item_not_found(item_id));
        }

        self.cart_by_id(item.cart_id).await
    }

    /// Remove a line item from the user's own cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the item or the cart does not exist.
    /// Returns `ServiceError::DataProcessing` if the item belongs to another cart.
    pub async fn remove_item(&self, user_id: UserId, item_id: CartItemId) -> Result<(), ServiceError> {
        let item = self
            .store
            .cart_item(item_id)
            .await?
            .ok_or_else(|| cart_item_not_found(item_id))?;
        let cart = self.get_cart(user_id).await?;

        if item.cart_id != cart.id {
            tracing::warn!(
                user_id = %user_id,
                cart_item_id = %item_id,
                "attempt to remove an item from another user's cart"
            );
            return Err(ServiceError::DataProcessing(format!(
                "Can't find cart item with id {item_id} in your cart"
            )));
        }

        self.store.delete_cart_item(item_id).await?;
        Ok(())
    }

    /// Delete every item of a cart.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn clear_cart(&self, cart_id: CartId) -> Result<u64, ServiceError> {
        Ok(self.store.clear_cart(cart_id).await?)
    }
}

impl<S: CatalogStore + CartStore + Sync> CartService<'_, S> {
    /// Add a book to the user's cart, merging with an existing line for it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the cart or the book does not exist.
    /// Returns `ServiceError::Validation` if the merged quantity overflows.
    pub async fn add_item(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<ShoppingCart, ServiceError> {
        let cart = self.get_cart(user_id).await?;

        if self.store.get_book(book_id).await?.is_none() {
            return Err(ServiceError::EntityNotFound(format!(
                "Can't find book by id {book_id}"
            )));
        }

        if let Some(existing) = cart.item_for_book(book_id)
            && existing.quantity.checked_add(quantity).is_none()
        {
            return Err(ServiceError::Validation(format!(
                "quantity for book {book_id} is too large"
            )));
        }

        self.store.add_cart_item(cart.id, book_id, quantity).await?;
        tracing::debug!(cart_id = %cart.id, book_id = %book_id, quantity, "added to cart");

        self.cart_by_id(cart.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::{Email, Price};

    use super::*;
    use crate::models::{BookDraft, NewUser, User};
    use crate::store::UserStore;
    use crate::store::memory::MemoryStore;

    async fn user(store: &MemoryStore, email: &str) -> User {
        store
            .create_user(&NewUser {
                email: Email::parse(email).unwrap(),
                password_hash: "hash".to_owned(),
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
                shipping_address: None,
            })
            .await
            .unwrap()
    }

    async fn book(store: &MemoryStore, isbn: &str) -> BookId {
        store
            .insert_book(
                &BookDraft {
                    title: format!("Book {isbn}"),
                    author: "Author".to_owned(),
                    isbn: isbn.to_owned(),
                    price: Price::from_cents(1_000).unwrap(),
                    description: None,
                    cover_image: None,
                },
                &[],
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_add_same_book_twice_merges() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let book_id = book(&store, "1").await;
        let carts = CartService::new(&store);

        carts.add_item(ada.id, book_id, 2).await.unwrap();
        let cart = carts.add_item(ada.id, book_id, 3).await.unwrap();

        assert_eq!(cart.cart_items.len(), 1);
        assert_eq!(cart.cart_items[0].quantity, 5);
        assert_eq!(cart.cart_items[0].book_title, "Book 1");
    }

    #[tokio::test]
    async fn test_add_unknown_book() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let carts = CartService::new(&store);

        let err = carts.add_item(ada.id, BookId::new(42), 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::EntityNotFound(ref m) if m == "Can't find book by id 42"));
    }

    #[tokio::test]
    async fn test_add_overflowing_quantity() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let book_id = book(&store, "1").await;
        let carts = CartService::new(&store);

        carts.add_item(ada.id, book_id, i32::MAX).await.unwrap();
        assert!(matches!(
            carts.add_item(ada.id, book_id, 1).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_quantity_overwrites() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let book_id = book(&store, "1").await;
        let carts = CartService::new(&store);

        let cart = carts.add_item(ada.id, book_id, 2).await.unwrap();
        let item_id = cart.cart_items[0].id;
        let cart = carts.update_quantity(item_id, 7).await.unwrap();
        assert_eq!(cart.cart_items[0].quantity, 7);

        assert!(matches!(
            carts.update_quantity(CartItemId::new(99), 1).await,
            Err(ServiceError::EntityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_item_from_other_cart_is_rejected() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let book_id = book(&store, "1").await;
        let carts = CartService::new(&store);

        let cart = carts.add_item(ada.id, book_id, 1).await.unwrap();
        let item_id = cart.cart_items[0].id;

        let err = carts.remove_item(bob.id, item_id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DataProcessing(ref m) if m == &format!("Can't find cart item with id {item_id} in your cart")
        ));
        assert_eq!(carts.get_cart(ada.id).await.unwrap().cart_items.len(), 1);

        carts.remove_item(ada.id, item_id).await.unwrap();
        assert!(carts.get_cart(ada.id).await.unwrap().is_empty());
    }
}
