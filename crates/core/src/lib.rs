//! Wholesale Core - Shared domain types.
//!
//! This crate provides the types exchanged with the wholesale storefront API:
//! - `client` - Data-fetching layer, cart store and admin cache
//! - `cli` - Terminal front end over the client
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. Everything here is what the server sends or accepts.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, products, cart items, orders, addresses, users,
//!   admin records and form validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
