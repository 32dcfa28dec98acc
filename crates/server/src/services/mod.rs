//! Business logic services.
//!
//! Services are short-lived structs borrowing a store; construct one per
//! request with `XService::new(state.store())`.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `catalog` - Books and categories
//! - `cart` - Shopping cart line items
//! - `order` - Checkout, order history and status changes

pub mod auth;
pub mod cart;
pub mod catalog;
mod error;
pub mod order;

pub use auth::{AuthError, AuthService, Registration};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use error::ServiceError;
pub use order::OrderService;
