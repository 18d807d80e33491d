//! Account history hooks.

use wholesale_core::{Order, PaymentRecord};

use super::Query;
use crate::api::OrdersApi;

/// The signed-in account's orders.
#[must_use]
pub fn my_orders(api: &OrdersApi) -> Query<(), Vec<Order>> {
    let api = api.clone();
    Query::new(move |()| {
        let api = api.clone();
        async move { api.my_orders().await }
    })
}

/// The signed-in account's payments.
#[must_use]
pub fn payment_history(api: &OrdersApi) -> Query<(), Vec<PaymentRecord>> {
    let api = api.clone();
    Query::new(move |()| {
        let api = api.clone();
        async move { api.payment_history().await }
    })
}
