//! Order service: checkout, history and status changes.

use chrono::Utc;

use bookstore_core::{OrderId, OrderItemId, OrderStatus, Price, UserId};

use super::{CartService, ServiceError};
use crate::models::{NewOrder, NewOrderItem, Order, OrderItem, Page, PageRequest};
use crate::store::{OrderStore, Store, StoreTransaction};

/// Order placement and retrieval.
pub struct OrderService<'a, S> {
    store: &'a S,
}

fn order_not_found(id: OrderId) -> ServiceError {
    ServiceError::EntityNotFound(format!("Order not found for id {id}"))
}

impl<'a, S: Store> OrderService<'a, S> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Turn the user's cart into a `PENDING` order and empty the cart.
    ///
    /// Runs in one transaction. The total is the sum of the current book
    /// prices of the cart lines; quantities do not scale it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the user has no cart.
    /// Returns `ServiceError::DataProcessing` if the cart is empty.
    /// Returns `ServiceError::Validation` if the total is `10^10` or more.
    pub async fn create_order(
        &self,
        user_id: UserId,
        shipping_address: &str,
    ) -> Result<Order, ServiceError> {
        let tx = self.store.begin().await?;
        let carts = CartService::new(&tx);

        let cart = carts.get_cart(user_id).await?;
        if cart.is_empty() {
            tracing::warn!(user_id = %user_id, "checkout with an empty cart");
            return Err(ServiceError::DataProcessing(
                "Can't create order. Shopping cart is empty.".to_owned(),
            ));
        }

        let total = Price::try_sum(cart.cart_items.iter().map(|item| item.book_price))
            .map_err(|err| {
                tracing::warn!(user_id = %user_id, error = %err, "order total out of range");
                ServiceError::Validation(format!("Can't create order. Order total {err}"))
            })?;
        let items = cart
            .cart_items
            .iter()
            .map(|item| NewOrderItem {
                book_id: item.book_id,
                quantity: item.quantity,
                price: item.book_price,
            })
            .collect();

        let new_order = NewOrder {
            user_id,
            status: OrderStatus::Pending,
            total,
            shipping_address: shipping_address.to_owned(),
            order_date: Utc::now(),
            items,
        };

        let order = tx.insert_order(&new_order).await?;
        carts.clear_cart(cart.id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total,
            items = order.order_items.len(),
            "order created"
        );
        Ok(order)
    }

    /// The user's orders, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list_orders(
        &self,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<Page<Order>, ServiceError> {
        Ok(self.store.orders_for_user(user_id, page).await?)
    }

    /// Set an order's status. Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the order does not exist.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        if !self.store.set_order_status(order_id, status).await? {
            return Err(order_not_found(order_id));
        }
        tracing::info!(order_id = %order_id, status = %status, "order status changed");

        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| order_not_found(order_id))
    }

    async fn owned_order(&self, user_id: UserId, order_id: OrderId) -> Result<Order, ServiceError> {
        self.store
            .get_order(order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| order_not_found(order_id))
    }

    /// Items of one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the order does not exist or
    /// belongs to another user.
    pub async fn order_items(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, ServiceError> {
        Ok(self.owned_order(user_id, order_id).await?.order_items)
    }

    /// One item of one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::EntityNotFound` if the order or the item does not resolve.
    pub async fn order_item(
        &self,
        user_id: UserId,
        order_id: OrderId,
        item_id: OrderItemId,
    ) -> Result<OrderItem, ServiceError> {
        let order = self.owned_order(user_id, order_id).await?;
        order.item(item_id).copied().ok_or_else(|| {
            ServiceError::EntityNotFound(format!(
                "Can't find item {item_id} in order {order_id}"
            ))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::{BookId, Email};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{BookDraft, NewUser, User};
    use crate::store::memory::MemoryStore;
    use crate::store::{CartStore, CatalogStore, UserStore};

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

    async fn book(store: &MemoryStore, isbn: &str, cents: i64) -> BookId {
        store
            .insert_book(
                &BookDraft {
                    title: format!("Book {isbn}"),
                    author: "Author".to_owned(),
                    isbn: isbn.to_owned(),
                    price: Price::from_cents(cents).unwrap(),
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
    async fn test_empty_cart_checkout_fails() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let orders = OrderService::new(&store);

        let err = orders.create_order(ada.id, "1 Main St").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DataProcessing(ref m) if m == "Can't create order. Shopping cart is empty."
        ));

        let page = orders
            .list_orders(ada.id, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn test_checkout_sums_prices_and_clears_cart() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let first = book(&store, "1", 1_000).await;
        let second = book(&store, "2", 1_500).await;
        let carts = CartService::new(&store);
        carts.add_item(ada.id, first, 1).await.unwrap();
        carts.add_item(ada.id, second, 2).await.unwrap();

        let order = OrderService::new(&store)
            .create_order(ada.id, "1 Main St")
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.amount(), Decimal::new(25, 0));
        assert_eq!(order.shipping_address, "1 Main St");
        assert_eq!(order.order_items.len(), 2);
        assert_eq!(order.order_items[1].quantity, 2);
        assert_eq!(order.order_items[1].price, Price::from_cents(1_500).unwrap());

        let cart = store.cart_for_user(ada.id).await.unwrap().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_total_out_of_range_rejected() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let max = book(&store, "1", 999_999_999_999).await;
        let cent = book(&store, "2", 1).await;
        let carts = CartService::new(&store);
        carts.add_item(ada.id, max, 1).await.unwrap();
        carts.add_item(ada.id, cent, 1).await.unwrap();

        let orders = OrderService::new(&store);
        let err = orders.create_order(ada.id, "1 Main St").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let cart = store.cart_for_user(ada.id).await.unwrap().unwrap();
        assert_eq!(cart.cart_items.len(), 2);
        let page = orders
            .list_orders(ada.id, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 0);
    }

    #[tokio::test]
    async fn test_second_checkout_finds_cart_empty() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let book_id = book(&store, "1", 1_000).await;
        CartService::new(&store)
            .add_item(ada.id, book_id, 1)
            .await
            .unwrap();

        let orders = OrderService::new(&store);
        let (first, second) = tokio::join!(
            orders.create_order(ada.id, "1 Main St"),
            orders.create_order(ada.id, "1 Main St"),
        );
        assert_eq!(usize::from(first.is_ok()) + usize::from(second.is_ok()), 1);
        assert!(matches!(
            first.err().or(second.err()),
            Some(ServiceError::DataProcessing(_))
        ));

        let page = orders
            .list_orders(ada.id, &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
    }

    #[tokio::test]
    async fn test_price_change_does_not_touch_order_items() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let book_id = book(&store, "1", 1_000).await;
        CartService::new(&store)
            .add_item(ada.id, book_id, 1)
            .await
            .unwrap();
        let order = OrderService::new(&store)
            .create_order(ada.id, "1 Main St")
            .await
            .unwrap();

        let draft = BookDraft {
            title: "Book 1".to_owned(),
            author: "Author".to_owned(),
            isbn: "1".to_owned(),
            price: Price::from_cents(5_000).unwrap(),
            description: None,
            cover_image: None,
        };
        store.update_book(book_id, &draft, &[]).await.unwrap();

        let items = OrderService::new(&store)
            .order_items(ada.id, order.id)
            .await
            .unwrap();
        assert_eq!(items[0].price, Price::from_cents(1_000).unwrap());
    }

    #[tokio::test]
    async fn test_status_update_is_unconditional() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let book_id = book(&store, "1", 1_000).await;
        CartService::new(&store)
            .add_item(ada.id, book_id, 1)
            .await
            .unwrap();
        let orders = OrderService::new(&store);
        let order = orders.create_order(ada.id, "1 Main St").await.unwrap();

        let order = orders
            .update_status(order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Delivered);
        let order = orders
            .update_status(order.id, OrderStatus::Pending)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);

        assert!(matches!(
            orders
                .update_status(OrderId::new(99), OrderStatus::Shipped)
                .await,
            Err(ServiceError::EntityNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_order_items_are_scoped_to_owner() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let book_id = book(&store, "1", 1_000).await;
        CartService::new(&store)
            .add_item(ada.id, book_id, 1)
            .await
            .unwrap();
        let orders = OrderService::new(&store);
        let order = orders.create_order(ada.id, "1 Main St").await.unwrap();
        let item_id = order.order_items[0].id;

        let item = orders.order_item(ada.id, order.id, item_id).await.unwrap();
        assert_eq!(item.book_id, book_id);

        assert!(matches!(
            orders.order_items(bob.id, order.id).await,
            Err(ServiceError::EntityNotFound(ref m)) if m == &format!("Order not found for id {}", order.id)
        ));
        assert!(matches!(
            orders
                .order_item(ada.id, order.id, OrderItemId::new(99))
                .await,
            Err(ServiceError::EntityNotFound(_))
        ));
    }
}
