//! Book queries.
//!
//! Books are read together with the ids of their live categories, aggregated
//! into one array column.

use sqlx::PgConnection;

use bookstore_core::{BookId, CategoryId, Price};

use super::{RepositoryError, count_to_u64, unique_violation};
use crate::models::{Book, BookDraft, BookSearch, Page, PageRequest};

const BOOK_SELECT: &str = r"
    SELECT
        b.id, b.title, b.author, b.isbn, b.price, b.description, b.cover_image,
        COALESCE(
            array_agg(c.id ORDER BY c.id) FILTER (WHERE c.id IS NOT NULL),
            '{}'
        ) AS category_ids
    FROM bookstore.book b
    LEFT JOIN bookstore.book_category bc ON bc.book_id = b.id
    LEFT JOIN bookstore.category c ON c.id = bc.category_id AND NOT c.is_deleted
";

#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: BookId,
    title: String,
    author: String,
    isbn: String,
    price: Price,
    description: Option<String>,
    cover_image: Option<String>,
    category_ids: Vec<i64>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            price: row.price,
            description: row.description,
            cover_image: row.cover_image,
            category_ids: row.category_ids.into_iter().map(CategoryId::new).collect(),
        }
    }
}

fn category_params(categories: &[CategoryId]) -> Vec<i64> {
    categories.iter().map(CategoryId::as_i64).collect()
}

/// List live books, one page at a time.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn list_books(
    conn: &mut PgConnection,
    page: &PageRequest,
) -> Result<Page<Book>, RepositoryError> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM bookstore.book WHERE NOT is_deleted")
            .fetch_one(&mut *conn)
            .await?;

    let sql = format!(
        "{BOOK_SELECT} WHERE NOT b.is_deleted GROUP BY b.id ORDER BY {} LIMIT $1 OFFSET $2",
        page.order_by("b")
    );
    let rows = sqlx::query_as::<_, BookRow>(&sql)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok(Page::new(
        rows.into_iter().map(Into::into).collect(),
        page,
        count_to_u64(total),
    ))
}

/// Get a live book by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_book(conn: &mut PgConnection, id: BookId) -> Result<Option<Book>, RepositoryError> {
    let sql = format!("{BOOK_SELECT} WHERE b.id = $1 AND NOT b.is_deleted GROUP BY b.id");
    let row = sqlx::query_as::<_, BookRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Into::into))
}

/// Whether a live book with this ID exists.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn book_exists(conn: &mut PgConnection, id: BookId) -> Result<bool, RepositoryError> {
    let exists = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM bookstore.book WHERE id = $1 AND NOT is_deleted)",
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(exists)
}

/// Search live books by exact title or author.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn search_books(
    conn: &mut PgConnection,
    search: &BookSearch,
) -> Result<Vec<Book>, RepositoryError> {
    let sql = format!(
        "{BOOK_SELECT}
        WHERE NOT b.is_deleted
          AND (
            (cardinality($1::text[]) = 0 AND cardinality($2::text[]) = 0)
            OR b.title = ANY($1)
            OR b.author = ANY($2)
          )
        GROUP BY b.id
        ORDER BY b.id"
    );
    let rows = sqlx::query_as::<_, BookRow>(&sql)
        .bind(&search.titles)
        .bind(&search.authors)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// Live books linked to a live category.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn books_by_category(
    conn: &mut PgConnection,
    category_id: CategoryId,
) -> Result<Vec<Book>, RepositoryError> {
    let sql = format!(
        "{BOOK_SELECT}
        WHERE NOT b.is_deleted
          AND EXISTS (
            SELECT 1
            FROM bookstore.book_category link
            JOIN bookstore.category cat ON cat.id = link.category_id
            WHERE link.book_id = b.id AND link.category_id = $1 AND NOT cat.is_deleted
          )
        GROUP BY b.id
        ORDER BY b.id"
    );
    let rows = sqlx::query_as::<_, BookRow>(&sql)
        .bind(category_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

async fn link_categories(
    conn: &mut PgConnection,
    id: BookId,
    categories: &[CategoryId],
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bookstore.book_category (book_id, category_id)
        SELECT $1, UNNEST($2::bigint[])
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(id)
    .bind(category_params(categories))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Insert a book and its category links. Run inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if a live book already has the ISBN.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert_book(
    conn: &mut PgConnection,
    draft: &BookDraft,
    categories: &[CategoryId],
) -> Result<Book, RepositoryError> {
    let id: BookId = sqlx::query_scalar(
        r"
        INSERT INTO bookstore.book (title, author, isbn, price, description, cover_image)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        ",
    )
    .bind(&draft.title)
    .bind(&draft.author)
    .bind(&draft.isbn)
    .bind(draft.price)
    .bind(&draft.description)
    .bind(&draft.cover_image)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| unique_violation(e, || format!("isbn {} already exists", draft.isbn)))?;

    link_categories(conn, id, categories).await?;

    get_book(conn, id)
        .await?
        .ok_or_else(|| RepositoryError::DataCorruption(format!("book {id} vanished after insert")))
}

/// Replace a live book's fields and category links. Run inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if another live book has the ISBN.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn update_book(
    conn: &mut PgConnection,
    id: BookId,
    draft: &BookDraft,
    categories: &[CategoryId],
) -> Result<Option<Book>, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE bookstore.book
        SET title = $2, author = $3, isbn = $4, price = $5, description = $6, cover_image = $7
        WHERE id = $1 AND NOT is_deleted
        ",
    )
    .bind(id)
    .bind(&draft.title)
    .bind(&draft.author)
    .bind(&draft.isbn)
    .bind(draft.price)
    .bind(&draft.description)
    .bind(&draft.cover_image)
    .execute(&mut *conn)
    .await
    .map_err(|e| unique_violation(e, || format!("isbn {} already exists", draft.isbn)))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    sqlx::query("DELETE FROM bookstore.book_category WHERE book_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    link_categories(conn, id, categories).await?;

    get_book(conn, id).await
}

/// Soft delete a live book.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn soft_delete_book(conn: &mut PgConnection, id: BookId) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE bookstore.book SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
