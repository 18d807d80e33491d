//! Application-wide client state.
//!
//! Only the cart lives here; everything else is per-screen hook state.

pub mod cart;

pub use cart::{CartState, CartStore, RequestStatus};
