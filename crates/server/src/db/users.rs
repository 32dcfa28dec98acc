//! User queries.

use sqlx::PgConnection;

use bookstore_core::{Email, Role, UserId};

use super::{RepositoryError, carts, unique_violation};
use crate::models::{NewUser, User};

const USER_SELECT: &str = r#"
    SELECT
        u.id, u.email, u.first_name, u.last_name, u.shipping_address, u.password_hash,
        COALESCE(
            array_agg(r.role::text ORDER BY r.role) FILTER (WHERE r.role IS NOT NULL),
            '{}'
        ) AS roles
    FROM bookstore."user" u
    LEFT JOIN bookstore.user_role r ON r.user_id = u.id
"#;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    first_name: String,
    last_name: String,
    shipping_address: Option<String>,
    password_hash: String,
    roles: Vec<String>,
}

impl UserRow {
    fn into_user(self) -> Result<(User, String), RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let roles = self
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::DataCorruption)?;

        let user = User {
            id: self.id,
            email,
            first_name: self.first_name,
            last_name: self.last_name,
            shipping_address: self.shipping_address,
            roles,
        };
        Ok((user, self.password_hash))
    }
}

fn user_query(filter: &str) -> String {
    format!("{USER_SELECT} WHERE {filter} GROUP BY u.id")
}

/// Get a user and their password hash by email.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn user_credentials(
    conn: &mut PgConnection,
    email: &Email,
) -> Result<Option<(User, String)>, RepositoryError> {
    let sql = user_query("u.email = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email.as_str())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(UserRow::into_user).transpose()
}

/// Get a user by ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get_user(conn: &mut PgConnection, id: UserId) -> Result<Option<User>, RepositoryError> {
    let sql = user_query("u.id = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(UserRow::into_user).transpose()?.map(|(user, _)| user))
}

/// Create a user with the `USER` role and an empty cart. Run inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email already exists.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn create_user(conn: &mut PgConnection, new_user: &NewUser) -> Result<User, RepositoryError> {
    let id: UserId = sqlx::query_scalar(
        r#"
        INSERT INTO bookstore."user" (email, password_hash, first_name, last_name, shipping_address)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.shipping_address)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| unique_violation(e, || "email already exists".to_owned()))?;

    grant_role(conn, id, Role::User).await?;
    carts::create_cart(conn, id).await?;

    get_user(conn, id)
        .await?
        .ok_or_else(|| RepositoryError::DataCorruption(format!("user {id} vanished after insert")))
}

/// Grant a role; granting twice is a no-op.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn grant_role(conn: &mut PgConnection, user_id: UserId, role: Role) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO bookstore.user_role (user_id, role)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(role)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Revoke a role.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn revoke_role(
    conn: &mut PgConnection,
    user_id: UserId,
    role: Role,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM bookstore.user_role WHERE user_id = $1 AND role = $2")
        .bind(user_id)
        .bind(role)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
