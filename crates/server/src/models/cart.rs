//! Shopping cart domain types.

use serde::Serialize;

use bookstore_core::{BookId, CartId, CartItemId, Price, UserId};

/// A user's shopping cart with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingCart {
    pub id: CartId,
    pub user_id: UserId,
    pub cart_items: Vec<CartItem>,
}

impl ShoppingCart {
    /// The line item referencing `book_id`, if the cart has one.
    #[must_use]
    pub fn item_for_book(&self, book_id: BookId) -> Option<&CartItem> {
        self.cart_items.iter().find(|item| item.book_id == book_id)
    }

    /// Whether the cart has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart_items.is_empty()
    }
}

/// A cart line item, joined with the book it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub book_id: BookId,
    pub book_title: String,
    pub quantity: i32,
    /// Current catalog price of the book; used at checkout, not returned.
    #[serde(skip)]
    pub book_price: Price,
}

/// A bare cart item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub book_id: BookId,
    pub quantity: i32,
}
