//! Wholesale storefront client.
//!
//! The data layer of the storefront: one configured HTTP client, a module
//! per backend resource, per-screen hooks, the shared cart store and the
//! admin product cache. Rendering is left to the host, which plugs in
//! through the traits in [`ui`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod hooks;
pub mod http;
pub mod session;
pub mod state;
pub mod store;
pub mod ui;

pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use state::{Host, Storefront};
