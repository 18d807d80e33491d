//! One module per backend resource.
//!
//! Each function performs exactly one network call through the shared
//! [`HttpClient`](crate::http::HttpClient) and returns the unwrapped payload.
//! There is no batching and no deduplication of identical concurrent calls.

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

pub use addresses::AddressesApi;
pub use admin::{AdminApi, ProductListParams};
pub use auth::AuthApi;
pub use cart::CartApi;
pub use orders::{CheckoutRequest, OrdersApi};
pub use products::ProductsApi;

/// Percent-encode a user-provided path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value.trim()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_encodes_spaces_and_slashes() {
        assert_eq!(segment(" Geek Bar "), "Geek%20Bar");
        assert_eq!(segment("Pods/Cartridges"), "Pods%2FCartridges");
    }
}
