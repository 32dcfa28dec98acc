//! Domain models for the bookstore.
//!
//! These are validated domain objects, separate from database row types. The
//! response-facing ones serialize directly to the camelCase JSON the API
//! returns.

pub mod book;
pub mod cart;
pub mod category;
pub mod order;
pub mod page;
pub mod session;
pub mod user;

pub use book::{Book, BookDraft, BookSearch, BookSummary};
pub use cart::{CartItem, CartItemRecord, ShoppingCart};
pub use category::{Category, CategoryDraft};
pub use order::{NewOrder, NewOrderItem, Order, OrderItem};
pub use page::{Page, PageRequest, Sort, SortDirection};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, User};
