//! Shopping cart queries.

use sqlx::PgConnection;

use bookstore_core::{BookId, CartId, CartItemId, Price, UserId};

use super::RepositoryError;
use crate::models::{CartItem, CartItemRecord, ShoppingCart};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    book_id: BookId,
    book_title: String,
    quantity: i32,
    book_price: Price,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            book_id: row.book_id,
            book_title: row.book_title,
            quantity: row.quantity,
            book_price: row.book_price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRecordRow {
    id: CartItemId,
    cart_id: CartId,
    book_id: BookId,
    quantity: i32,
}

async fn with_items(
    conn: &mut PgConnection,
    cart: Option<CartRow>,
) -> Result<Option<ShoppingCart>, RepositoryError> {
    let Some(cart) = cart else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, CartItemRow>(
        r"
        SELECT ci.id, ci.book_id, b.title AS book_title, ci.quantity, b.price AS book_price
        FROM bookstore.cart_item ci
        JOIN bookstore.book b ON b.id = ci.book_id
        WHERE ci.cart_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(cart.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(ShoppingCart {
        id: cart.id,
        user_id: cart.user_id,
        cart_items: items.into_iter().map(Into::into).collect(),
    }))
}

/// Get a user's cart with its items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn cart_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<ShoppingCart>, RepositoryError> {
    let cart = sqlx::query_as::<_, CartRow>(
        "SELECT id, user_id FROM bookstore.shopping_cart WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    with_items(conn, cart).await
}

/// Get a user's cart with its items, holding row locks on the cart and its
/// lines until the surrounding transaction ends.
///
/// Concurrent checkouts of the same cart queue on the cart row, and new lines
/// can't be inserted under it until the lock is released.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn lock_cart_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<ShoppingCart>, RepositoryError> {
    let cart = sqlx::query_as::<_, CartRow>(
        "SELECT id, user_id FROM bookstore.shopping_cart WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(cart) = cart else {
        return Ok(None);
    };

    sqlx::query("SELECT id FROM bookstore.cart_item WHERE cart_id = $1 FOR UPDATE")
        .bind(cart.id)
        .execute(&mut *conn)
        .await?;

    with_items(conn, Some(cart)).await
}

/// Get a cart with its items by cart ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn cart_by_id(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Option<ShoppingCart>, RepositoryError> {
    let cart =
        sqlx::query_as::<_, CartRow>("SELECT id, user_id FROM bookstore.shopping_cart WHERE id = $1")
            .bind(cart_id)
            .fetch_optional(&mut *conn)
            .await?;

    with_items(conn, cart).await
}

/// Create an empty cart for a user.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the user already has a cart.
pub async fn create_cart(conn: &mut PgConnection, user_id: UserId) -> Result<CartId, RepositoryError> {
    sqlx::query_scalar("INSERT INTO bookstore.shopping_cart (user_id) VALUES ($1) RETURNING id")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| super::unique_violation(e, || format!("user {user_id} already has a cart")))
}

/// Get a bare cart item row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn cart_item(
    conn: &mut PgConnection,
    item_id: CartItemId,
) -> Result<Option<CartItemRecord>, RepositoryError> {
    let row = sqlx::query_as::<_, CartItemRecordRow>(
        "SELECT id, cart_id, book_id, quantity FROM bookstore.cart_item WHERE id = $1",
    )
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|r| CartItemRecord {
        id: r.id,
        cart_id: r.cart_id,
        book_id: r.book_id,
        quantity: r.quantity,
    }))
}

/// Insert a line item, or add to the quantity of the existing line for the book.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn add_cart_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    book_id: BookId,
    quantity: i32,
) -> Result<CartItemId, RepositoryError> {
    let id = sqlx::query_scalar(
        r"
        INSERT INTO bookstore.cart_item (cart_id, book_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, book_id)
        DO UPDATE SET quantity = bookstore.cart_item.quantity + EXCLUDED.quantity
        RETURNING id
        ",
    )
    .bind(cart_id)
    .bind(book_id)
    .bind(quantity)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Overwrite a line item's quantity.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_cart_item_quantity(
    conn: &mut PgConnection,
    item_id: CartItemId,
    quantity: i32,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("UPDATE bookstore.cart_item SET quantity = $2 WHERE id = $1")
        .bind(item_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a line item.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_cart_item(
    conn: &mut PgConnection,
    item_id: CartItemId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM bookstore.cart_item WHERE id = $1")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every line item of a cart.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear_cart(conn: &mut PgConnection, cart_id: CartId) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM bookstore.cart_item WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
