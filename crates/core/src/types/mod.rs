//! Core types for the wholesale storefront.
//!
//! This module provides type-safe wrappers for the storefront's domain.

pub mod address;
pub mod admin;
pub mod cart;
pub mod id;
pub mod order;
pub mod product;
pub mod status;
pub mod user;
pub mod validation;

pub use address::{Address, AddressKind, NewAddress};
pub use admin::{FeatureSlot, FeatureUpdate, ProductPage, StoreSettings, UploadedFile, UserUpdate};
pub use cart::{CartItem, CartTemplate, CartTemplateDetails, ProductSnapshot};
pub use id::*;
pub use order::{OrderLine, Order, PaymentRecord};
pub use product::{Product, ProductDraft, ProductUpdate};
pub use status::*;
pub use user::{AdminUser, Credentials, NewAccount, SubaccountPermissions, User};
pub use validation::{ValidationError, require};
