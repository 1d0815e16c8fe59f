//! Cartline Core - Shared domain types.
//!
//! This crate provides the types used across all Cartline components:
//! - `storefront` - REST backend (accounts, sessions, carts)
//! - `cli` - Command-line tools for migrations and account provisioning
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The cart merge rules live here so they can be
//! exercised without a store.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and emails
//! - [`cart`] - Cart documents and their add/update/remove transitions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartError, CartItem, NewCartItem};
pub use types::*;
