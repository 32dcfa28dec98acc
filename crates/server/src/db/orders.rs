//! Order queries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use bookstore_core::{BookId, OrderId, OrderItemId, OrderStatus, Price, UserId};

use super::{RepositoryError, count_to_u64};
use crate::models::{NewOrder, Order, OrderItem, Page, PageRequest};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    total: Price,
    shipping_address: String,
    order_date: DateTime<Utc>,
}

impl OrderRow {
    fn with_items(self, order_items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            status: self.status,
            total: self.total,
            shipping_address: self.shipping_address,
            order_date: self.order_date,
            order_items,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    book_id: BookId,
    quantity: i32,
    price: Price,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            book_id: row.book_id,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

async fn items_for_orders(
    conn: &mut PgConnection,
    order_ids: &[OrderId],
) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
    let ids: Vec<i64> = order_ids.iter().map(OrderId::as_i64).collect();
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, order_id, book_id, quantity, price
        FROM bookstore.order_item
        WHERE order_id = ANY($1)
        ORDER BY id
        ",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        by_order.entry(row.order_id).or_default().push(row.into());
    }
    Ok(by_order)
}

/// Insert an order and its items. Run inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn insert_order(conn: &mut PgConnection, order: &NewOrder) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        INSERT INTO bookstore."order" (user_id, status, total, shipping_address, order_date)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, status, total, shipping_address, order_date
        "#,
    )
    .bind(order.user_id)
    .bind(order.status)
    .bind(order.total)
    .bind(&order.shipping_address)
    .bind(order.order_date)
    .fetch_one(&mut *conn)
    .await?;

    let mut items = Vec::with_capacity(order.items.len());
    for item in &order.items {
        let item_row = sqlx::query_as::<_, OrderItemRow>(
            r"
            INSERT INTO bookstore.order_item (order_id, book_id, quantity, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, book_id, quantity, price
            ",
        )
        .bind(row.id)
        .bind(item.book_id)
        .bind(item.quantity)
        .bind(item.price)
        .fetch_one(&mut *conn)
        .await?;
        items.push(item_row.into());
    }

    Ok(row.with_items(items))
}

/// List a user's orders, one page at a time.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn orders_for_user(
    conn: &mut PgConnection,
    user_id: UserId,
    page: &PageRequest,
) -> Result<Page<Order>, RepositoryError> {
    let total: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM bookstore."order" WHERE user_id = $1"#)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

    let sql = format!(
        r#"
        SELECT o.id, o.user_id, o.status, o.total, o.shipping_address, o.order_date
        FROM bookstore."order" o
        WHERE o.user_id = $1
        ORDER BY {}
        LIMIT $2 OFFSET $3
        "#,
        page.order_by("o")
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
    let mut items = items_for_orders(conn, &ids).await?;
    let orders = rows
        .into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            row.with_items(order_items)
        })
        .collect();

    Ok(Page::new(orders, page, count_to_u64(total)))
}

/// Get an order with its items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn get_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT id, user_id, status, total, shipping_address, order_date
        FROM bookstore."order"
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut items = items_for_orders(conn, &[row.id]).await?;
    let order_items = items.remove(&row.id).unwrap_or_default();
    Ok(Some(row.with_items(order_items)))
}

/// Overwrite an order's status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn set_order_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(r#"UPDATE bookstore."order" SET status = $2 WHERE id = $1"#)
        .bind(id)
        .bind(status)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
