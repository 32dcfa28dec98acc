//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookstore_core::{BookId, OrderId, OrderItemId, OrderStatus, Price, UserId};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Price,
    pub shipping_address: String,
    pub order_date: DateTime<Utc>,
    pub order_items: Vec<OrderItem>,
}

impl Order {
    /// The item with `item_id`, if it belongs to this order.
    #[must_use]
    pub fn item(&self, item_id: OrderItemId) -> Option<&OrderItem> {
        self.order_items.iter().find(|item| item.id == item_id)
    }
}

/// One line of an order. `price` is the book price when the order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub book_id: BookId,
    pub quantity: i32,
    pub price: Price,
}

/// An order ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Price,
    pub shipping_address: String,
    pub order_date: DateTime<Utc>,
    pub items: Vec<NewOrderItem>,
}

/// A line of a [`NewOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderItem {
    pub book_id: BookId,
    pub quantity: i32,
    pub price: Price,
}
