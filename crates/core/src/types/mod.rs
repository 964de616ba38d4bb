//! Core types for Mercadito.
//!
//! This module provides the backend wire types and type-safe wrappers for
//! common domain concepts.

pub mod catalog;
pub mod city;
pub mod envelope;
pub mod id;
pub mod order;
pub mod user;

pub use catalog::{
    Category, Linked, Product, ProductCreate, ProductSnapshot, ProductUpdate, Subcategory,
};
pub use city::City;
pub use envelope::{Envelope, EnvelopeError, Pagination};
pub use id::*;
pub use order::{
    Customer, Order, OrderDetail, OrderDraft, OrderDraftLine, OrderLine, OrderStatus,
};
pub use user::{AuthResponse, LoginRequest, RegisterRequest, Role, User};
