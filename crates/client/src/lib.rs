//! Mercadito headless storefront client.
//!
//! A presentation-free client for the Mercadito REST backend: catalog
//! browsing with a time-expiring lookup cache, a durably persisted shopping
//! cart with observable state, authentication/session handling, and order
//! management (checkout plus the admin approval flow).
//!
//! # Architecture
//!
//! - [`api`] - Thin REST layer over `reqwest` that unwraps the backend's
//!   uniform response envelope
//! - [`cache`] - Single-flight lookup cache with lazy TTL expiry and FIFO
//!   bounded capacity
//! - [`catalog`] - Categories, subcategories, and products, cached per
//!   resource family
//! - [`cart`] - Locally persisted cart store broadcasting full state on
//!   every mutation
//! - [`auth`] - Token/session handling backed by durable key-value storage
//! - [`orders`] / [`cities`] - Uncached order and city services
//! - [`storage`] - The durable key-value capability (file-backed or
//!   in-memory)
//!
//! # Example
//!
//! ```rust,ignore
//! use mercadito_client::{ClientConfig, Storefront};
//!
//! let config = ClientConfig::from_env()?;
//! let storefront = Storefront::new(&config)?;
//!
//! let products = storefront.catalog().available_products(1, 12, &Default::default()).await?;
//! if let Some(product) = products.products.first() {
//!     storefront.cart().add_item(product, 1);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cache;
pub mod cart;
pub mod catalog;
pub mod cities;
pub mod config;
pub mod error;
pub mod orders;
pub mod storage;
mod storefront;

pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use storefront::{InitError, Storefront};
