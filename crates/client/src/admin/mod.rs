//! Admin product listing: a page cache keyed by query, debounced search and
//! next-page prefetch.

pub mod cache;
pub mod listing;

pub use cache::{ProductPageCache, ProductQuery};
pub use listing::{AdminProductListing, ListingState, ProductBackend};
