//! User domain types.

use serde::Serialize;

use bookstore_core::{Email, Role, UserId};

/// A registered customer account (domain type).
///
/// The password hash never leaves the store layer inside this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<String>,
    pub roles: Vec<Role>,
}

impl User {
    /// Whether the user has been granted `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// A user about to be registered. Always receives the `USER` role and a cart.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<String>,
}
