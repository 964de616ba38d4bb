//! Mercadito Core - Shared types library.
//!
//! This crate provides common types used across all Mercadito components:
//! - `client` - Headless storefront client (catalog cache, cart store, services)
//! - `cli` - Command-line storefront and order-management tool
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - The backend response envelope, newtype IDs, and the
//!   catalog/order/user domain models

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
