//! Category queries.

use sqlx::PgConnection;

use bookstore_core::CategoryId;

use super::{RepositoryError, count_to_u64};
use crate::models::{Category, CategoryDraft, Page, PageRequest};

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

/// Live categories among `ids`, ordered by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_categories(
    conn: &mut PgConnection,
    ids: &[CategoryId],
) -> Result<Vec<Category>, RepositoryError> {
    let ids: Vec<i64> = ids.iter().map(CategoryId::as_i64).collect();
    let rows = sqlx::query_as::<_, CategoryRow>(
        r"
        SELECT id, name, description
        FROM bookstore.category
        WHERE id = ANY($1) AND NOT is_deleted
        ORDER BY id
        ",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// List live categories, one page at a time.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn list_categories(
    conn: &mut PgConnection,
    page: &PageRequest,
) -> Result<Page<Category>, RepositoryError> {
    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM bookstore.category WHERE NOT is_deleted")
            .fetch_one(&mut *conn)
            .await?;

    let sql = format!(
        r"
        SELECT c.id, c.name, c.description
        FROM bookstore.category c
        WHERE NOT c.is_deleted
        ORDER BY {}
        LIMIT $1 OFFSET $2
        ",
        page.order_by("c")
    );
    let rows = sqlx::query_as::<_, CategoryRow>(&sql)
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

/// Get a live category by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_category(
    conn: &mut PgConnection,
    id: CategoryId,
) -> Result<Option<Category>, RepositoryError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description FROM bookstore.category WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Into::into))
}

/// Insert a category.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_category(
    conn: &mut PgConnection,
    draft: &CategoryDraft,
) -> Result<Category, RepositoryError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        r"
        INSERT INTO bookstore.category (name, description)
        VALUES ($1, $2)
        RETURNING id, name, description
        ",
    )
    .bind(&draft.name)
    .bind(&draft.description)
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Replace a live category's name and description.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn update_category(
    conn: &mut PgConnection,
    id: CategoryId,
    draft: &CategoryDraft,
) -> Result<Option<Category>, RepositoryError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        r"
        UPDATE bookstore.category
        SET name = $2, description = $3
        WHERE id = $1 AND NOT is_deleted
        RETURNING id, name, description
        ",
    )
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.description)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Into::into))
}

/// Soft delete a live category.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn soft_delete_category(
    conn: &mut PgConnection,
    id: CategoryId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        "UPDATE bookstore.category SET is_deleted = TRUE WHERE id = $1 AND NOT is_deleted",
    )
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
