//! Bookstore Core - Shared types library.
//!
//! This crate provides the domain vocabulary used across the bookstore
//! components:
//! - `server` - REST API for books, categories, carts, and orders
//! - `cli` - Command-line tools for migrations, seeding, and user roles
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! The optional `postgres` feature adds `sqlx` encoding for the types that are
//! stored in columns.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
