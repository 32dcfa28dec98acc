//! Authentication service.
//!
//! Password registration and login. New accounts always receive the `USER`
//! role and an empty shopping cart.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use bookstore_core::Email;

use crate::db::RepositoryError;
use crate::models::{NewUser, User};
use crate::store::UserStore;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 64;

/// Registration form data.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub repeat_password: String,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a, S> {
    users: &'a S,
}

impl<'a, S: UserStore + Sync> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a S) -> Self {
        Self { users }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::PasswordMismatch` if the repeated password differs.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let email = Email::parse(&registration.email)?;

        validate_password(&registration.password)?;
        if registration.password != registration.repeat_password {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(&registration.password)?;

        let new_user = NewUser {
            email,
            password_hash,
            first_name: registration.first_name,
            last_name: registration.last_name,
            shipping_address: registration.shipping_address,
        };

        let user = self
            .users
            .create_user(&new_user)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .user_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::Role;

    use super::*;
    use crate::store::CartStore;
    use crate::store::memory::MemoryStore;

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            email: email.to_owned(),
            password: password.to_owned(),
            repeat_password: password.to_owned(),
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            shipping_address: Some("12 Analytical Way".to_owned()),
        }
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("exactly8").is_ok());
        assert!(validate_password(&"x".repeat(64)).is_ok());
        assert!(validate_password(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_creates_user_with_cart() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let user = auth
            .register(registration("Ada@Example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "ada@example.com");
        assert_eq!(user.roles, vec![Role::User]);

        let cart = store.cart_for_user(user.id).await.unwrap().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_mismatch_and_duplicates() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let mut mismatch = registration("ada@example.com", "password123");
        mismatch.repeat_password = "password124".to_owned();
        assert!(matches!(
            auth.register(mismatch).await,
            Err(AuthError::PasswordMismatch)
        ));

        auth.register(registration("ada@example.com", "password123"))
            .await
            .unwrap();
        assert!(matches!(
            auth.register(registration("ada@example.com", "password123"))
                .await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register(registration("ada@example.com", "password123"))
            .await
            .unwrap();

        let user = auth.login("ada@example.com", "password123").await.unwrap();
        assert_eq!(user.email.as_str(), "ada@example.com");

        assert!(matches!(
            auth.login("ada@example.com", "password999").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "password123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
